//! Unified error types for the decode engine.
//!
//! Cursor, structural and codec failures share a single error enum so that a
//! failed embedded image can be stored next to the opcodes that parsed fine.

// Submodule declarations
pub mod conversions;
pub mod types;

// Re-exports
pub use types::{Error, Result};
