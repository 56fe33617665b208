//! Common types and utilities shared by the opcode parser and the codecs.

// Submodule declarations
pub mod binary;
pub mod error;
pub mod fixed;

// Re-exports for convenience
pub use binary::{ByteReader, FourCc};
pub use error::{Error, Result};
pub use fixed::FixedPoint;
