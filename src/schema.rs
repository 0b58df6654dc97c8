//! Declarative field layouts for the two table schemas we decode.
//!
//! Rather than branching on the schema name throughout the extractor, each
//! schema is described by an ordered list of [`FieldSpec`]s and extraction is
//! driven generically from that list (see [`crate::extract::extract_rows`]).

use crate::table::FieldPath;

/// Schema name of the frame-rate estimate table.
pub const FPS_SCHEMA: &str = "core-animation-fps-estimate";
/// Schema name of the per-process resource table.
pub const SYSMON_SCHEMA: &str = "sysmon-process";

// Semantic field names used in [`crate::extract::FlatRow`].
pub const START_TIME: &str = "start-time";
pub const PROCESS: &str = "process";
pub const FPS: &str = "fps";
pub const CPU_PERCENT: &str = "cpu-percent";
pub const MEMORY_BYTES: &str = "memory-bytes";
pub const RESIDENT_BYTES: &str = "resident-bytes";

/// Where a field's literal value lives on the resolved element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    /// The human-readable `fmt` attribute (timestamps, process descriptors).
    FmtAttr,
    /// The element's text content (numeric values).
    Text,
}

/// How extraction treats a field that resolves to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldPolicy {
    /// Missing value drops the row.
    Required,
    /// Missing value is patched with the last value resolved anywhere earlier
    /// in the document; if none exists yet, the row is dropped with a warning.
    CarryForward,
    /// Resolved only to register the occurrences' ids in the reference cache;
    /// the value itself is discarded. Later rows may reference those ids even
    /// when this row is filtered out downstream.
    Prefetch,
}

/// One field of a schema's fixed layout.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Semantic name the value is stored under in the flat row.
    pub name: &'static str,
    pub path: FieldPath,
    pub source: ValueSource,
    pub policy: FieldPolicy,
}

/// Layout of the `core-animation-fps-estimate` table.
pub fn fps_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec {
            name: START_TIME,
            path: FieldPath::new("start-time"),
            source: ValueSource::FmtAttr,
            policy: FieldPolicy::Required,
        },
        FieldSpec {
            name: FPS,
            path: FieldPath::new("fps"),
            source: ValueSource::Text,
            policy: FieldPolicy::Required,
        },
    ]
}

/// Layout of the `sysmon-process` table.
///
/// The two memory values are addressed by fixed positional occurrence among
/// the row's `size-in-bytes` fields: the 3rd is the memory footprint, the 9th
/// the resident size. The prefetch entries come first so that every
/// occurrence's id lands in the cache before any indexed lookup.
pub fn sysmon_fields() -> Vec<FieldSpec> {
    vec![
        FieldSpec {
            name: "size-in-bytes",
            path: FieldPath::new("size-in-bytes"),
            source: ValueSource::Text,
            policy: FieldPolicy::Prefetch,
        },
        FieldSpec {
            name: "system-cpu-percent",
            path: FieldPath::new("system-cpu-percent"),
            source: ValueSource::Text,
            policy: FieldPolicy::Prefetch,
        },
        FieldSpec {
            name: START_TIME,
            path: FieldPath::new("start-time"),
            source: ValueSource::FmtAttr,
            policy: FieldPolicy::Required,
        },
        FieldSpec {
            name: PROCESS,
            path: FieldPath::new("process"),
            source: ValueSource::FmtAttr,
            policy: FieldPolicy::Required,
        },
        FieldSpec {
            name: CPU_PERCENT,
            path: FieldPath::new("system-cpu-percent"),
            source: ValueSource::Text,
            policy: FieldPolicy::CarryForward,
        },
        FieldSpec {
            name: MEMORY_BYTES,
            path: FieldPath::nth("size-in-bytes", 3),
            source: ValueSource::Text,
            policy: FieldPolicy::Required,
        },
        FieldSpec {
            name: RESIDENT_BYTES,
            path: FieldPath::nth("size-in-bytes", 9),
            source: ValueSource::Text,
            policy: FieldPolicy::Required,
        },
    ]
}
