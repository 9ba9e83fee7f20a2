// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by several layers:
//
//   checkpoint.rs — ModelStore: model.json architecture
//                   description plus full-precision weights
//
//   metrics.rs    — Per-epoch metrics, CSV logging and the
//                   mean squared error used for evaluation
//
// Reference: Burn Book §5 (Checkpointing)

/// Model saving and loading
pub mod checkpoint;

/// Training metrics and MSE
pub mod metrics;
