//! Core deterministic primitives.
//!
//! All types in this module are designed for perfect cross-platform determinism.
//! They are the substrate every piece of game logic is built on.

pub mod fixed;
pub mod vec2;

// Re-export core types
pub use fixed::{Fixed, FIXED_ONE, FIXED_HALF, FIXED_SCALE};
pub use vec2::FixedVec2;
