//! Run-level timing aggregation.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;

/// Summary of one materialization run.
///
/// Serializes to the flat map the drop tooling reports:
/// `files`, `uniqueblobs`, `AverageDownloadSecs`, `MaxDownloadSecs`,
/// `AverageCopySecs`, `MaxCopySecs`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunMetrics {
    #[serde(rename = "files")]
    pub files:                 usize,
    #[serde(rename = "uniqueblobs")]
    pub unique_blobs:          usize,
    #[serde(rename = "AverageDownloadSecs")]
    pub average_download_secs: f64,
    #[serde(rename = "MaxDownloadSecs")]
    pub max_download_secs:     f64,
    #[serde(rename = "AverageCopySecs")]
    pub average_copy_secs:     f64,
    #[serde(rename = "MaxCopySecs")]
    pub max_copy_secs:         f64,
}

impl RunMetrics {
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        BTreeMap::from([
            ("files".to_string(), self.files as f64),
            ("uniqueblobs".to_string(), self.unique_blobs as f64),
            ("AverageDownloadSecs".to_string(), self.average_download_secs),
            ("MaxDownloadSecs".to_string(), self.max_download_secs),
            ("AverageCopySecs".to_string(), self.average_copy_secs),
            ("MaxCopySecs".to_string(), self.max_copy_secs),
        ])
    }
}

#[derive(Debug, Default)]
struct Samples {
    download: Vec<f64>,
    copy:     Vec<f64>,
}

/// Collects one download and one copy sample per completed group.
///
/// `record` may be called from any number of workers at once.
#[derive(Debug)]
pub struct MetricsCollector {
    files:        usize,
    unique_blobs: usize,
    samples:      Mutex<Samples>,
}

impl MetricsCollector {
    pub fn new(files: usize, unique_blobs: usize) -> Self {
        Self {
            files,
            unique_blobs,
            samples: Mutex::new(Samples::default()),
        }
    }

    pub fn record(&self, download: Duration, copy: Duration) {
        let mut samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        samples.download.push(download.as_secs_f64());
        samples.copy.push(copy.as_secs_f64());
    }

    /// Number of groups recorded so far.
    pub fn completed(&self) -> usize {
        self.samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .download
            .len()
    }

    pub fn finish(&self) -> RunMetrics {
        let samples = self.samples.lock().unwrap_or_else(PoisonError::into_inner);
        let (average_download_secs, max_download_secs) = summarize(&samples.download);
        let (average_copy_secs, max_copy_secs) = summarize(&samples.copy);

        RunMetrics {
            files: self.files,
            unique_blobs: self.unique_blobs,
            average_download_secs,
            max_download_secs,
            average_copy_secs,
            max_copy_secs,
        }
    }
}

/// Average and maximum; both `0.0` for no samples.
fn summarize(samples: &[f64]) -> (f64, f64) {
    if samples.is_empty() {
        return (0.0, 0.0);
    }
    let sum: f64 = samples.iter().sum();
    let max = samples.iter().copied().fold(0.0, f64::max);
    (sum / samples.len() as f64, max)
}
