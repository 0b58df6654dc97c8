//! Reference resolution for id/ref-compressed table documents.

use std::collections::HashMap;

use crate::error::TableError;

use super::{Field, TableDocument};

/// Locator for a field under a row: a tag name plus an optional 1-based
/// occurrence index among the row's fields with that tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldPath {
    pub tag: &'static str,
    pub occurrence: Option<usize>,
}

impl FieldPath {
    /// Any occurrence of `tag`; resolution returns the first one.
    pub const fn new(tag: &'static str) -> Self {
        FieldPath {
            tag,
            occurrence: None,
        }
    }

    /// The `n`-th occurrence (1-based) of `tag` under the row.
    pub const fn nth(tag: &'static str, n: usize) -> Self {
        FieldPath {
            tag,
            occurrence: Some(n),
        }
    }
}

/// A field value with the id/ref indirection already applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedField {
    pub fmt: Option<String>,
    pub text: Option<String>,
}

impl ResolvedField {
    fn from_field(field: &Field) -> Self {
        ResolvedField {
            fmt: field.fmt.clone(),
            text: field.text.clone(),
        }
    }
}

/// Resolves field lookups against one document, maintaining the id cache.
///
/// The cache is shared across all rows and all field lookups for the
/// document: a `ref` may point at an id registered while resolving a
/// different field of an earlier row. References only ever point backwards,
/// so a single forward pass never needs to look ahead. Use one resolver per
/// document and discard it afterwards.
pub struct Resolver<'doc> {
    doc: &'doc TableDocument,
    cache: HashMap<String, ResolvedField>,
}

impl<'doc> Resolver<'doc> {
    pub fn new(doc: &'doc TableDocument) -> Self {
        Resolver {
            doc,
            cache: HashMap::new(),
        }
    }

    /// Resolve `path` under the row at `row_index`.
    ///
    /// Every matched element gets its `id` registered in the cache; `ref`
    /// elements are looked up in it. If several elements match, the first one
    /// wins and later duplicates are ignored (an upstream export quirk,
    /// preserved deliberately). No match is `Ok(None)`, not an error: some
    /// fields are legitimately absent per row. A `ref` to an unseen id aborts
    /// the document with [`TableError::DanglingReference`].
    pub fn resolve(
        &mut self,
        row_index: usize,
        path: FieldPath,
    ) -> Result<Option<ResolvedField>, TableError> {
        let row = &self.doc.rows[row_index];
        let mut first: Option<ResolvedField> = None;

        for (occurrence, field) in row.fields_named(path.tag).enumerate() {
            if let Some(n) = path.occurrence {
                if occurrence + 1 != n {
                    continue;
                }
            }

            let value = if let Some(id) = &field.id {
                let value = ResolvedField::from_field(field);
                self.cache.insert(id.clone(), value.clone());
                value
            } else if let Some(ref_id) = &field.ref_id {
                self.cache.get(ref_id).cloned().ok_or_else(|| {
                    TableError::DanglingReference {
                        schema: self.doc.schema.clone(),
                        row: row_index,
                        id: ref_id.clone(),
                    }
                })?
            } else {
                ResolvedField::from_field(field)
            };

            if first.is_none() {
                first = Some(value);
            }
            if path.occurrence.is_some() {
                break;
            }
        }

        Ok(first)
    }
}
