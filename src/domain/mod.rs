// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust types describing what the system works with:
// rows of a driving log, decoded samples, and the data-source
// abstraction the training loop consumes.
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and traits

// One row of a simulator CSV log
pub mod driving_log;

// A resized camera frame paired with its steering angle
pub mod sample;

// Core abstractions (traits) that other layers implement
pub mod traits;
