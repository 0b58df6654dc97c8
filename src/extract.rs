//! Generic, spec-driven row extraction and the target-process filter.

use std::collections::HashMap;

use crate::error::TableError;
use crate::schema::{self, FieldPolicy, FieldSpec, ValueSource};
use crate::table::{Resolver, TableDocument};

/// One row flattened to its semantic field values.
#[derive(Debug, Clone, Default)]
pub struct FlatRow {
    values: HashMap<&'static str, String>,
}

impl FlatRow {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn insert(&mut self, name: &'static str, value: String) {
        self.values.insert(name, value);
    }
}

/// Counters for the row-level, non-fatal conditions seen during extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    pub rows_seen: usize,
    /// Rows dropped because a required field was absent.
    pub rows_missing_required: usize,
    /// Rows dropped because a carry-forward field had no prior value yet.
    pub carry_forward_misses: usize,
}

impl ExtractStats {
    pub fn rows_dropped(&self) -> usize {
        self.rows_missing_required + self.carry_forward_misses
    }
}

/// Pull the fixed field layout out of every row of `doc`.
///
/// Rows come back in document order, which xctrace emits newest-first; the
/// caller reverses before normalizing. Rows missing a required field are
/// dropped and counted, never fabricated. A dangling reference aborts the
/// whole document.
pub fn extract_rows(
    doc: &TableDocument,
    specs: &[FieldSpec],
) -> Result<(Vec<FlatRow>, ExtractStats), TableError> {
    let mut resolver = Resolver::new(doc);
    let mut carried: HashMap<&'static str, String> = HashMap::new();
    let mut rows = Vec::with_capacity(doc.rows.len());
    let mut stats = ExtractStats::default();

    for row_index in 0..doc.rows.len() {
        stats.rows_seen += 1;
        let mut flat = FlatRow::default();
        let mut dropped = false;

        for spec in specs {
            let resolved = resolver.resolve(row_index, spec.path)?;
            if spec.policy == FieldPolicy::Prefetch {
                continue;
            }

            let value = resolved.and_then(|field| match spec.source {
                ValueSource::FmtAttr => field.fmt,
                ValueSource::Text => field.text,
            });

            match value {
                Some(value) => {
                    if spec.policy == FieldPolicy::CarryForward {
                        carried.insert(spec.name, value.clone());
                    }
                    flat.insert(spec.name, value);
                }
                None => match spec.policy {
                    FieldPolicy::CarryForward => {
                        if let Some(prior) = carried.get(spec.name) {
                            flat.insert(spec.name, prior.clone());
                        } else {
                            log::warn!(
                                "{} row {}: no prior {} value to carry forward, dropping row",
                                doc.schema,
                                row_index,
                                spec.name
                            );
                            stats.carry_forward_misses += 1;
                            dropped = true;
                            break;
                        }
                    }
                    _ => {
                        log::debug!(
                            "{} row {}: required field {} missing, dropping row",
                            doc.schema,
                            row_index,
                            spec.name
                        );
                        stats.rows_missing_required += 1;
                        dropped = true;
                        break;
                    }
                },
            }
        }

        if !dropped {
            rows.push(flat);
        }
    }

    Ok((rows, stats))
}

/// Keep only rows whose process descriptor belongs to `target`.
///
/// Descriptors have the form `"<name> (<pid>)"`. The leading
/// whitespace-delimited token is compared with exact, case-sensitive
/// equality, so `"Steam (501)"` matches target `"Steam"` but
/// `"SteamHelper (502)"` does not. Non-matching rows are an expected
/// outcome, not an error; most rows belong to other processes.
pub fn filter_process(rows: Vec<FlatRow>, target: &str) -> Vec<FlatRow> {
    rows.into_iter()
        .filter(|row| {
            row.get(schema::PROCESS)
                .and_then(|descriptor| descriptor.split_whitespace().next())
                .map(|name| name == target)
                .unwrap_or(false)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{Field, Row};

    fn field(tag: &str, text: &str) -> Field {
        Field {
            tag: tag.to_string(),
            text: Some(text.to_string()),
            ..Field::default()
        }
    }

    fn fmt_field(tag: &str, fmt: &str) -> Field {
        Field {
            tag: tag.to_string(),
            fmt: Some(fmt.to_string()),
            ..Field::default()
        }
    }

    fn sysmon_row(time: &str, process: &str, cpu: Option<&str>) -> Row {
        let mut fields = vec![fmt_field("start-time", time), fmt_field("process", process)];
        if let Some(cpu) = cpu {
            fields.push(field("system-cpu-percent", cpu));
        }
        // Nine size-in-bytes occurrences as sysmon-process emits them.
        for n in 1..=9 {
            fields.push(field("size-in-bytes", &format!("{}", n * 1024)));
        }
        Row { fields }
    }

    fn sysmon_doc(rows: Vec<Row>) -> TableDocument {
        TableDocument {
            schema: crate::schema::SYSMON_SCHEMA.to_string(),
            rows,
        }
    }

    #[test]
    fn test_cpu_carry_forward_across_document() {
        let doc = sysmon_doc(vec![
            sysmon_row("00:01", "Steam (501)", Some("10")),
            sysmon_row("00:02", "Steam (501)", None),
            sysmon_row("00:03", "Steam (501)", Some("20")),
        ]);

        let (rows, stats) = extract_rows(&doc, &crate::schema::sysmon_fields()).unwrap();
        let cpus: Vec<&str> = rows
            .iter()
            .map(|r| r.get(crate::schema::CPU_PERCENT).unwrap())
            .collect();
        assert_eq!(cpus, ["10", "10", "20"]);
        assert_eq!(stats.rows_dropped(), 0);
    }

    #[test]
    fn test_carry_forward_without_prior_value_drops_row() {
        let doc = sysmon_doc(vec![
            sysmon_row("00:01", "Steam (501)", None),
            sysmon_row("00:02", "Steam (501)", Some("15")),
        ]);

        let (rows, stats) = extract_rows(&doc, &crate::schema::sysmon_fields()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(crate::schema::CPU_PERCENT), Some("15"));
        assert_eq!(stats.carry_forward_misses, 1);
    }

    #[test]
    fn test_missing_start_time_drops_row() {
        let mut no_time = sysmon_row("00:01", "Steam (501)", Some("10"));
        no_time.fields.retain(|f| f.tag != "start-time");
        let doc = sysmon_doc(vec![no_time, sysmon_row("00:02", "Steam (501)", Some("20"))]);

        let (rows, stats) = extract_rows(&doc, &crate::schema::sysmon_fields()).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(crate::schema::START_TIME), Some("00:02"));
        assert_eq!(stats.rows_missing_required, 1);
    }

    #[test]
    fn test_missing_memory_occurrence_drops_row() {
        // Only two size-in-bytes fields; neither occurrence 3 nor 9 exists.
        let row = Row {
            fields: vec![
                fmt_field("start-time", "00:01"),
                fmt_field("process", "Steam (501)"),
                field("system-cpu-percent", "10"),
                field("size-in-bytes", "1024"),
                field("size-in-bytes", "2048"),
            ],
        };
        let doc = sysmon_doc(vec![row]);

        let (rows, stats) = extract_rows(&doc, &crate::schema::sysmon_fields()).unwrap();
        assert!(rows.is_empty());
        assert_eq!(stats.rows_missing_required, 1);
    }

    #[test]
    fn test_extraction_preserves_document_order() {
        let doc = sysmon_doc(vec![
            sysmon_row("00:03", "Steam (501)", Some("3")),
            sysmon_row("00:02", "Steam (501)", Some("2")),
            sysmon_row("00:01", "Steam (501)", Some("1")),
        ]);

        let (rows, _) = extract_rows(&doc, &crate::schema::sysmon_fields()).unwrap();
        let times: Vec<&str> = rows
            .iter()
            .map(|r| r.get(crate::schema::START_TIME).unwrap())
            .collect();
        assert_eq!(times, ["00:03", "00:02", "00:01"]);
    }

    #[test]
    fn test_filter_matches_exact_leading_token() {
        let doc = sysmon_doc(vec![
            sysmon_row("00:01", "Steam (501)", Some("10")),
            sysmon_row("00:02", "SteamHelper (502)", Some("20")),
            sysmon_row("00:03", "steam (503)", Some("30")),
        ]);

        let (rows, _) = extract_rows(&doc, &crate::schema::sysmon_fields()).unwrap();
        let rows = filter_process(rows, "Steam");
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0].get(crate::schema::PROCESS),
            Some("Steam (501)")
        );
    }
}
