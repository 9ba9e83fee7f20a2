// ============================================================
// Layer 4 — Streaming Sample Source
// ============================================================
// Decodes samples in the background while the training loop
// consumes batches on the main thread.
//
//   producer thread                          main thread
//   ───────────────                          ───────────
//   LogCursor → chunk of rows                next_batch()
//             → rayon pool decodes rows          ▲
//             → sync_channel(depth) ─────────────┘
//
// - Sample order matches the log order exactly (par_iter keeps
//   the order of its input when collecting).
// - The channel is bounded, so the producer stays at most
//   `depth` chunks ahead of the consumer.
// - The first error (bad row, unreadable image) is sent once and
//   the producer stops; the consumer sees it on the next pull.
// - Dropping the source disconnects the channel, which makes the
//   producer's next send fail and the thread exit.

use anyhow::{anyhow, Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    path::Path,
    sync::mpsc::{self, Receiver},
    thread::{self, JoinHandle},
};

use crate::data::loader::{load_sample, LogCursor};
use crate::domain::sample::DrivingSample;
use crate::domain::traits::SampleSource;

/// Knobs for the background producer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefetchConfig {
    /// Decode worker threads
    pub workers:    usize,
    /// Rows decoded per hand-off
    pub chunk_size: usize,
    /// Chunks allowed in flight
    pub depth:      usize,
}

impl Default for PrefetchConfig {
    fn default() -> Self {
        Self { workers: 4, chunk_size: 32, depth: 4 }
    }
}

type Chunk = Result<Vec<DrivingSample>>;

pub struct StreamingSource {
    rx:     Option<Receiver<Chunk>>,
    handle: Option<JoinHandle<()>>,
    buffer: VecDeque<DrivingSample>,
    label:  String,
}

impl StreamingSource {
    /// Open the log and start the producer thread.
    /// A missing log file is reported here, not on the first pull.
    pub fn spawn(log_path: impl AsRef<Path>, cfg: &PrefetchConfig) -> Result<Self> {
        let mut cursor = LogCursor::open(log_path)?;
        let label = format!("streaming:{}", cursor.path().display());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cfg.workers.max(1))
            .thread_name(|i| format!("decode-{i}"))
            .build()
            .context("Cannot build image decode pool")?;

        let chunk_size = cfg.chunk_size.max(1);
        let (tx, rx) = mpsc::sync_channel::<Chunk>(cfg.depth.max(1));

        let handle = thread::Builder::new()
            .name("prefetch".to_string())
            .spawn(move || loop {
                let chunk  = decode_chunk(&mut cursor, &pool, chunk_size);
                let failed = chunk.is_err();
                if tx.send(chunk).is_err() || failed {
                    return;
                }
            })
            .context("Cannot spawn prefetch thread")?;

        tracing::debug!(
            "Started {} with {} workers, chunk={}, depth={}",
            label, cfg.workers.max(1), chunk_size, cfg.depth.max(1)
        );

        Ok(Self {
            rx: Some(rx),
            handle: Some(handle),
            buffer: VecDeque::new(),
            label,
        })
    }

    fn refill(&mut self) -> Result<()> {
        let rx = self
            .rx
            .as_ref()
            .ok_or_else(|| anyhow!("{} is closed", self.label))?;
        let chunk = rx
            .recv()
            .map_err(|_| anyhow!("Prefetch worker for {} stopped", self.label))??;
        self.buffer.extend(chunk);
        Ok(())
    }
}

fn decode_chunk(cursor: &mut LogCursor, pool: &rayon::ThreadPool, size: usize) -> Chunk {
    let rows = (0..size)
        .map(|_| cursor.next_row())
        .collect::<Result<Vec<_>>>()?;
    pool.install(|| rows.par_iter().map(load_sample).collect())
}

impl SampleSource for StreamingSource {
    fn next_batch(&mut self, batch_size: usize) -> Result<Vec<DrivingSample>> {
        while self.buffer.len() < batch_size {
            self.refill()?;
        }
        Ok(self.buffer.drain(..batch_size).collect())
    }

    fn name(&self) -> &str {
        &self.label
    }
}

impl Drop for StreamingSource {
    fn drop(&mut self) {
        // Disconnect first so a producer blocked on a full channel wakes up
        drop(self.rx.take());
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
