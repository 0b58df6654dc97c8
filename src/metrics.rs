//! Projection of extracted rows into typed metric samples.

use crate::error::TableError;
use crate::extract::{self, ExtractStats, FlatRow};
use crate::schema;
use crate::series::RawSample;
use crate::table::TableDocument;

/// Bytes per mebibyte, the divisor for the memory series.
pub const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Round to two decimal digits for output.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn parse_value(doc: &TableDocument, row: &FlatRow, name: &'static str) -> Result<f64, TableError> {
    // Extraction guarantees the field is present on surviving rows.
    let text = row.get(name).unwrap_or_default();
    text.trim()
        .parse()
        .map_err(|_| TableError::MalformedNumber {
            schema: doc.schema.clone(),
            field: name.to_string(),
            value: text.to_string(),
        })
}

fn check_schema(doc: &TableDocument, expected: &str) -> Result<(), TableError> {
    if doc.schema != expected {
        return Err(TableError::SchemaMismatch {
            expected: expected.to_string(),
            found: doc.schema.clone(),
        });
    }
    Ok(())
}

/// Frame-rate samples from a `core-animation-fps-estimate` document, in
/// document order (newest first). Values are used as-is, no conversion.
pub fn fps_samples(doc: &TableDocument) -> Result<(Vec<RawSample>, ExtractStats), TableError> {
    check_schema(doc, schema::FPS_SCHEMA)?;
    let (rows, stats) = extract::extract_rows(doc, &schema::fps_fields())?;

    let mut samples = Vec::with_capacity(rows.len());
    for row in &rows {
        samples.push(RawSample {
            time: row.get(schema::START_TIME).unwrap_or_default().to_string(),
            value: parse_value(doc, row, schema::FPS)?,
        });
    }
    Ok((samples, stats))
}

/// CPU and memory samples for one process, from a `sysmon-process` document.
#[derive(Debug, Default)]
pub struct ResourceSamples {
    /// CPU utilization in percent, rounded to 2 decimals.
    pub cpu: Vec<RawSample>,
    /// Memory footprint in MiB, rounded to 2 decimals.
    pub memory: Vec<RawSample>,
    /// Resident size in MiB. Computed alongside the footprint for parity but
    /// not currently exported as its own stream.
    pub resident: Vec<RawSample>,
    pub stats: ExtractStats,
}

/// Extract, filter and project the resource table for `target`.
///
/// Output stays in document order (newest first); the normalizer reverses.
pub fn resource_samples(
    doc: &TableDocument,
    target: &str,
) -> Result<ResourceSamples, TableError> {
    check_schema(doc, schema::SYSMON_SCHEMA)?;
    let (rows, stats) = extract::extract_rows(doc, &schema::sysmon_fields())?;
    let rows = extract::filter_process(rows, target);

    let mut out = ResourceSamples {
        stats,
        ..ResourceSamples::default()
    };
    for row in &rows {
        let time = row.get(schema::START_TIME).unwrap_or_default();
        out.cpu.push(RawSample {
            time: time.to_string(),
            value: round2(parse_value(doc, row, schema::CPU_PERCENT)?),
        });
        out.memory.push(RawSample {
            time: time.to_string(),
            value: round2(parse_value(doc, row, schema::MEMORY_BYTES)? / BYTES_PER_MIB),
        });
        out.resident.push(RawSample {
            time: time.to_string(),
            value: round2(parse_value(doc, row, schema::RESIDENT_BYTES)? / BYTES_PER_MIB),
        });
    }
    Ok(out)
}
