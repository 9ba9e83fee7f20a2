// ============================================================
// Layer 5 — ML / Model Layer (Burn)
// ============================================================
// Model, training loop, evaluation and inference.
//
//   model.rs      — BatchNorm → conv blocks → dense → 1 output
//   trainer.rs    — forward / MSE / backward / Adam per batch
//   evaluator.rs  — MSE of a trained model over a SampleSource
//   inferencer.rs — loads a saved model, predicts image angles
//   backend.rs    — Wgpu and NdArray backend aliases
//
// Reference: Burn Book §3 (Building Blocks)
//            Burn Book §5 (Training)

pub mod backend;

/// Steering regression CNN
pub mod model;

/// Training loop
pub mod trainer;

pub mod evaluator;

/// Saved-model predictor
pub mod inferencer;
