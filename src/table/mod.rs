//! In-memory model of an `xctrace export` table document.
//!
//! `xcrun xctrace export --xpath …/table[@schema="…"]` emits one XML document
//! per table. To keep the output small the exporter deduplicates repeated
//! values: the first occurrence of a value carries an `id` attribute and the
//! literal value, later occurrences carry only a `ref` attribute pointing back
//! at that id. [`Resolver`] undoes that compression.
//!
//! A [`TableDocument`] is immutable once loaded. Each [`Row`] holds every
//! element found under its `<row>` node, flattened in document order, so
//! fields can be addressed as "the k-th occurrence of tag X under this row".

mod resolve;

pub use resolve::{FieldPath, ResolvedField, Resolver};

use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// One element under a `<row>` node.
///
/// A field either carries its own value (`id`-bearing or plain) or is a
/// reference (`ref` only) to an id-bearing field seen earlier in the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    /// Element tag, e.g. `start-time`, `process`, `size-in-bytes`.
    pub tag: String,
    /// Identifier under which this field's value can be referenced later.
    pub id: Option<String>,
    /// Identifier of the earlier field this one is a reference to.
    pub ref_id: Option<String>,
    /// Human-readable formatted value (`fmt` attribute).
    pub fmt: Option<String>,
    /// Raw text content.
    pub text: Option<String>,
}

impl Field {
    /// True if this field carries no value of its own, only a `ref` pointer.
    pub fn is_reference(&self) -> bool {
        self.ref_id.is_some() && self.id.is_none()
    }
}

/// One `<row>` of a table, fields flattened in document order.
#[derive(Debug, Clone, Default)]
pub struct Row {
    pub fields: Vec<Field>,
}

impl Row {
    /// All fields with the given tag, in document order.
    pub fn fields_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Field> {
        self.fields.iter().filter(move |f| f.tag == tag)
    }
}

/// A fully loaded table export: one schema, rows in document order.
///
/// xctrace emits rows in reverse chronological order; the document preserves
/// that order, reordering is the normalizer's job.
#[derive(Debug, Clone, Default)]
pub struct TableDocument {
    /// Schema name from the `<schema name="…">` element.
    pub schema: String,
    pub rows: Vec<Row>,
}

impl TableDocument {
    /// Load a table document from an XML file produced by `xctrace export`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let xml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read table export {}", path.display()))?;
        Self::parse_str(&xml)
            .with_context(|| format!("failed to parse table export {}", path.display()))
    }

    /// Parse a table document from an XML string.
    pub fn parse_str(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);

        let mut doc = TableDocument::default();
        let mut current_row: Option<Row> = None;
        // Indices (into the current row's fields) of elements whose end tag we
        // have not seen yet. Text content attaches to the innermost one.
        let mut open_fields: Vec<usize> = Vec::new();

        loop {
            match reader.read_event().context("malformed XML")? {
                Event::Start(e) => {
                    let tag = tag_name(&e);
                    if let Some(row) = current_row.as_mut() {
                        row.fields.push(field_from(&tag, &e)?);
                        open_fields.push(row.fields.len() - 1);
                    } else if tag == "row" {
                        current_row = Some(Row::default());
                    } else if tag == "schema" {
                        if let Some(name) = attr_value(&e, "name")? {
                            doc.schema = name;
                        }
                    }
                    // Other container elements (trace-query-result, node, the
                    // schema's column definitions) carry no row data.
                }
                Event::Empty(e) => {
                    let tag = tag_name(&e);
                    if let Some(row) = current_row.as_mut() {
                        row.fields.push(field_from(&tag, &e)?);
                    } else if tag == "schema" {
                        if let Some(name) = attr_value(&e, "name")? {
                            doc.schema = name;
                        }
                    }
                }
                Event::Text(e) => {
                    if let (Some(row), Some(&idx)) = (current_row.as_mut(), open_fields.last()) {
                        let text = e.unescape().context("malformed text content")?;
                        let trimmed = text.trim();
                        if !trimmed.is_empty() {
                            let slot = &mut row.fields[idx].text;
                            match slot {
                                Some(existing) => existing.push_str(trimmed),
                                None => *slot = Some(trimmed.to_string()),
                            }
                        }
                    }
                }
                Event::End(e) => {
                    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                    if current_row.is_some() && tag == "row" {
                        open_fields.clear();
                        if let Some(row) = current_row.take() {
                            doc.rows.push(row);
                        }
                    } else if current_row.is_some() {
                        open_fields.pop();
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(doc)
    }
}

fn tag_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

fn attr_value(e: &BytesStart, name: &str) -> Result<Option<String>> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn field_from(tag: &str, e: &BytesStart) -> Result<Field> {
    Ok(Field {
        tag: tag.to_string(),
        id: attr_value(e, "id")?,
        ref_id: attr_value(e, "ref")?,
        fmt: attr_value(e, "fmt")?,
        text: None,
    })
}
