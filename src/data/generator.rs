// ============================================================
// Layer 4 — Sample Generator
// ============================================================
// SampleStream turns a driving log into an endless sequence of
// (image, angle) samples:
//
//   LogCursor::next_row()  →  load_sample()  →  DrivingSample
//
// Decoding happens on the calling thread, one sample at a time.
// StreamingSource (prefetch.rs) runs the same pipeline on a
// worker pool in the background.

use anyhow::Result;
use std::path::Path;

use crate::data::loader::{load_sample, LogCursor};
use crate::domain::sample::DrivingSample;
use crate::domain::traits::SampleSource;

pub struct SampleStream {
    cursor: LogCursor,
    label:  String,
}

impl SampleStream {
    /// Open a driving log for sample generation
    pub fn open(log_path: impl AsRef<Path>) -> Result<Self> {
        let cursor = LogCursor::open(log_path)?;
        let label  = format!("stream:{}", cursor.path().display());
        Ok(Self { cursor, label })
    }

    /// Decode the next non-zero-angle row
    pub fn next_sample(&mut self) -> Result<DrivingSample> {
        let row = self.cursor.next_row()?;
        load_sample(&row)
    }

    /// Pull exactly `count` samples, wrapping around the log as needed
    pub fn take_samples(&mut self, count: usize) -> Result<Vec<DrivingSample>> {
        (0..count).map(|_| self.next_sample()).collect()
    }
}

/// Never yields None — the log is cycled forever. Errors are yielded
/// as items so callers can stop at the first one with `?`.
impl Iterator for SampleStream {
    type Item = Result<DrivingSample>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_sample())
    }
}

impl SampleSource for SampleStream {
    fn next_batch(&mut self, batch_size: usize) -> Result<Vec<DrivingSample>> {
        self.take_samples(batch_size)
    }

    fn name(&self) -> &str {
        &self.label
    }
}
