//! JSON serialization of normalized metric streams.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::series::Stream;

/// Write each stream to `<dir>/<session>_<metric>.json` as an ordered array
/// of `{time, value}` records. Returns the paths written.
///
/// Streams are serialized independently; no cross-stream alignment of time
/// axes is performed.
pub fn save_streams(dir: &Path, session: &str, streams: &[Stream]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create save directory {}", dir.display()))?;

    let mut paths = Vec::with_capacity(streams.len());
    for stream in streams {
        let path = dir.join(format!("{}_{}.json", session, stream.metric));
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &stream.points)
            .with_context(|| format!("failed to write {}", path.display()))?;
        log::info!(
            "saved {} points of {} to {}",
            stream.points.len(),
            stream.metric,
            path.display()
        );
        paths.push(path);
    }
    Ok(paths)
}
