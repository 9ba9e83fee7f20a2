// ============================================================
// Layer 2 — Source Selection
// ============================================================
// Picks the SampleSource for one driving log:
//
//   in_memory = true  → decode `count` samples now, replay them
//   in_memory = false → stream fresh samples on a worker pool
//
// Drivers only ever see the returned Box<dyn SampleSource>.

use anyhow::{Context, Result};
use std::path::Path;

use crate::data::{
    dataset::InMemorySource,
    generator::SampleStream,
    prefetch::{PrefetchConfig, StreamingSource},
};
use crate::domain::traits::SampleSource;

pub fn open_source(
    log_path:  &Path,
    count:     usize,
    in_memory: bool,
    shuffle:   bool,
    seed:      u64,
    prefetch:  &PrefetchConfig,
) -> Result<Box<dyn SampleSource>> {
    if in_memory {
        let mut stream = SampleStream::open(log_path)?;
        let source = InMemorySource::from_stream(&mut stream, count, shuffle, seed)
            .with_context(|| format!("Cannot load samples from '{}'", log_path.display()))?;
        Ok(Box::new(source))
    } else {
        Ok(Box::new(StreamingSource::spawn(log_path, prefetch)?))
    }
}
