//! Time-series normalization: reorder, bucket and dedupe raw samples.
//!
//! xctrace start-times are `"MM:SS[.fraction]"` strings with no hour or day
//! component, emitted newest-first. Normalization reverses the input,
//! truncates sub-second precision, sorts ascending on whole seconds and
//! collapses each one-second bucket down to its last sample.

use serde::Serialize;

use crate::error::TableError;

/// A raw sample as projected from a table row, time still unparsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSample {
    pub time: String,
    pub value: f64,
}

/// One normalized point: a `"M:SS"` bucket label and its value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimePoint {
    pub time: String,
    pub value: f64,
}

/// A named, normalized metric series. Immutable once produced; each stream
/// keeps its own independent time axis, no cross-stream alignment happens.
#[derive(Debug, Clone, Serialize)]
pub struct Stream {
    pub metric: String,
    pub points: Vec<TimePoint>,
}

impl Stream {
    pub fn new(metric: &str, points: Vec<TimePoint>) -> Self {
        Stream {
            metric: metric.to_string(),
            points,
        }
    }

    /// Parallel x-axis labels and y-axis values, the shape chart renderers
    /// consume.
    pub fn axes(&self) -> (Vec<&str>, Vec<f64>) {
        let labels = self.points.iter().map(|p| p.time.as_str()).collect();
        let values = self.points.iter().map(|p| p.value).collect();
        (labels, values)
    }
}

/// Parse a `"MM:SS[.fraction]"` timestamp into whole seconds.
///
/// Fractional seconds are truncated, not rounded. The format carries no
/// hour component, so captures longer than 60 minutes wrap and cannot be
/// ordered correctly by this key; captures are assumed shorter than that.
pub fn time_key(raw: &str) -> Result<u32, TableError> {
    let malformed = || TableError::MalformedTimestamp {
        value: raw.to_string(),
    };

    let (minutes, rest) = raw.split_once(':').ok_or_else(malformed)?;
    let seconds = rest.split('.').next().unwrap_or(rest);

    let minutes: u32 = minutes.trim().parse().map_err(|_| malformed())?;
    let seconds: u32 = seconds.trim().parse().map_err(|_| malformed())?;
    if seconds >= 60 {
        return Err(malformed());
    }
    Ok(minutes * 60 + seconds)
}

/// Format a whole-second key back into the `"M:SS"` bucket label.
pub fn format_label(key: u32) -> String {
    format!("{}:{:02}", key / 60, key % 60)
}

/// Normalize raw samples into a strictly ascending, one-point-per-bucket
/// series.
///
/// Steps, in order: reverse the (newest-first) input, parse every timestamp
/// into its whole-second key, stable-sort ascending on that key, then walk
/// the sorted sequence keeping only the last sample of each bucket
/// (last-write-wins on ties).
pub fn normalize(mut samples: Vec<RawSample>) -> Result<Vec<TimePoint>, TableError> {
    samples.reverse();

    let mut keyed = Vec::with_capacity(samples.len());
    for sample in &samples {
        keyed.push((time_key(&sample.time)?, sample.value));
    }
    keyed.sort_by_key(|&(key, _)| key);

    let mut points: Vec<TimePoint> = Vec::with_capacity(keyed.len());
    let mut prev_key: Option<u32> = None;
    for (key, value) in keyed {
        if prev_key == Some(key) {
            if let Some(last) = points.last_mut() {
                last.value = value;
            }
        } else {
            points.push(TimePoint {
                time: format_label(key),
                value,
            });
            prev_key = Some(key);
        }
    }

    Ok(points)
}
