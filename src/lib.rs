//! xcperf library - turning xctrace captures into per-metric time series.
//!
//! The pipeline runs strictly downward: a table document exported from a
//! capture is decoded ([`table`]), rows are flattened and filtered to the
//! target process ([`extract`]), raw fields are projected into typed metric
//! values ([`metrics`]), samples are reordered and bucketed into a clean
//! ascending time axis ([`series`]) and the resulting streams are saved as
//! JSON ([`export`]). The [`xctrace`] module drives the external `xcrun
//! xctrace` record and export commands; [`pipeline`] ties it all together.

pub mod error;
pub mod export;
pub mod extract;
pub mod metrics;
pub mod pipeline;
pub mod schema;
pub mod series;
pub mod table;
pub mod xctrace;

// Re-export for convenience
pub use error::TableError;
pub use pipeline::{parse_and_save, parse_trace, WorkDirs};
pub use series::{Stream, TimePoint};
