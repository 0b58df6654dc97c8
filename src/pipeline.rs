//! End-to-end parse pipeline: export the tables from a capture, decode them
//! and normalize the three metric streams.
//!
//! Everything here is synchronous and processes one document at a time. The
//! fps and sysmon documents share no mutable state (each gets its own
//! resolver), so a caller could process them concurrently, but the row
//! counts are small enough that it is not worth it.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::export;
use crate::metrics;
use crate::schema;
use crate::series::{self, Stream};
use crate::table::TableDocument;
use crate::xctrace::XctraceExporter;

/// Working directories for one run.
#[derive(Debug, Clone)]
pub struct WorkDirs {
    /// Captures and record logs.
    pub root: PathBuf,
    /// Exported XML table documents.
    pub scratch: PathBuf,
    /// Saved JSON series.
    pub save: PathBuf,
}

impl WorkDirs {
    /// Create the working directory layout under `root`.
    pub fn create(root: &Path) -> Result<Self> {
        let dirs = WorkDirs {
            root: root.to_path_buf(),
            scratch: root.join("parse"),
            save: root.join("save"),
        };
        for dir in [&dirs.root, &dirs.scratch, &dirs.save] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(dirs)
    }
}

/// Parse a capture into the three normalized streams: fps, cpu and mem.
pub fn parse_trace(
    trace: &Path,
    target_process: &str,
    session: &str,
    dirs: &WorkDirs,
) -> Result<Vec<Stream>> {
    let exporter = XctraceExporter {
        trace: trace.to_path_buf(),
        scratch_dir: dirs.scratch.clone(),
        session: session.to_string(),
    };

    let toc = exporter.export_toc()?;
    log::debug!("capture table of contents at {}", toc.display());

    let fps_xml = exporter.export_table(schema::FPS_SCHEMA)?;
    let fps_doc = TableDocument::from_file(&fps_xml)?;
    let (fps_raw, fps_stats) = metrics::fps_samples(&fps_doc)?;
    log::info!(
        "{}: {} rows, {} dropped",
        schema::FPS_SCHEMA,
        fps_stats.rows_seen,
        fps_stats.rows_dropped()
    );
    let fps = Stream::new("fps", series::normalize(fps_raw)?);

    let sysmon_xml = exporter.export_table(schema::SYSMON_SCHEMA)?;
    let sysmon_doc = TableDocument::from_file(&sysmon_xml)?;
    let resources = metrics::resource_samples(&sysmon_doc, target_process)?;
    log::info!(
        "{}: {} rows, {} dropped, {} samples for {}",
        schema::SYSMON_SCHEMA,
        resources.stats.rows_seen,
        resources.stats.rows_dropped(),
        resources.cpu.len(),
        target_process
    );
    let cpu = Stream::new("cpu", series::normalize(resources.cpu)?);
    let mem = Stream::new("mem", series::normalize(resources.memory)?);

    Ok(vec![fps, cpu, mem])
}

/// Parse a capture and save the streams as JSON, returning the paths written.
pub fn parse_and_save(
    trace: &Path,
    target_process: &str,
    session: &str,
    dirs: &WorkDirs,
) -> Result<Vec<PathBuf>> {
    let streams = parse_trace(trace, target_process, session, dirs)?;
    export::save_streams(&dirs.save, session, &streams)
}
