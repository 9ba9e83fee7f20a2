// ============================================================
// Layer 3 — Core Traits (Abstractions)
// ============================================================
// Training and evaluation never care whether samples were
// loaded into memory up front or are being decoded on the fly.
// Both data paths implement SampleSource, and the drivers in
// Layer 5 only ever call next_batch().
//
// Implementations:
//   - SampleStream    → sequential, decodes on the calling thread
//   - InMemorySource  → materialised set replayed pass after pass
//   - StreamingSource → background producer + decode workers

use anyhow::Result;
use crate::domain::sample::DrivingSample;

// ─── SampleSource ─────────────────────────────────────────────────────────────
/// Anything that can hand out batches of driving samples.
pub trait SampleSource {
    /// Return the next batch of at most `batch_size` samples.
    ///
    /// Sources never run dry: an empty log is reported as an error
    /// rather than an empty batch. In-memory sources may return fewer
    /// than `batch_size` samples at the end of a pass.
    fn next_batch(&mut self, batch_size: usize) -> Result<Vec<DrivingSample>>;

    /// Short label used in log messages
    fn name(&self) -> &str;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_batch(&mut self, batch_size: usize) -> Result<Vec<DrivingSample>> {
        (**self).next_batch(batch_size)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
