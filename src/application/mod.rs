// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal each: train, evaluate or predict.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination

/// In-memory vs streaming source selection
pub mod sources;

/// The training workflow
pub mod train_use_case;

/// Evaluation and prediction from a saved model
pub mod evaluate_use_case;
