// ============================================================
// Layer 4 — Data Pipeline
// ============================================================
// Everything from a CSV driving log to tensor batches:
//
//   driving_log.csv
//       │
//       ▼
//   LogCursor         → cyclic row cursor, skips zero angles
//       │
//       ▼
//   load_sample       → decode + resize the center frame to 25x25x3
//       │
//       ├──────────────────────────┬──────────────────────────┐
//       ▼                          ▼                          ▼
//   SampleStream              InMemorySource             StreamingSource
//   (sequential)              (materialised once,        (background decode
//                              replayed every pass)       on a worker pool)
//       │                          │                          │
//       └──────────────┬───────────┴──────────────────────────┘
//                      ▼
//               SampleSource::next_batch
//                      │
//                      ▼
//               SteeringBatcher   → [N, 3, 25, 25] images, [N, 1] targets

/// Cyclic CSV cursor and image decoding
pub mod loader;

/// Endless sequential sample generator
pub mod generator;

/// In-memory sample set (Burn Dataset) and its replaying source
pub mod dataset;

/// Background prefetching source
pub mod prefetch;

/// Implements Burn's Batcher trait to create tensor batches
pub mod batcher;

#[cfg(test)]
pub mod fixtures;
