//! Unified error types for the QuickDraw decode engine.
//!
//! Every failure carries enough payload (offending value, expected range,
//! byte offset) to diagnose a bad file without re-running the decode.
use thiserror::Error;

/// Main error type for picture and codec decoding.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A read would go past the end of the buffer
    #[error("Out of bounds: {requested} bytes at offset {offset}, {available} available")]
    OutOfBounds {
        offset: usize,
        requested: usize,
        available: usize,
    },

    /// A length field decoded to a negative or otherwise unusable value
    #[error("Invalid length {length} for {what}")]
    InvalidLength { what: &'static str, length: i64 },

    /// Parse error occurred
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Invalid file format
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Region bounding box or span data is inconsistent
    #[error("Corrupt region: {0}")]
    CorruptRegion(String),

    /// Declared dimensions disagree with the payload
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },

    /// Wrong number of colour components for the pixel format
    #[error("Component count mismatch: expected {expected}, got {actual}")]
    ComponentCount { expected: u16, actual: u16 },

    /// A vector referenced a codebook slot that was never populated
    #[error("Invalid {codebook} codebook index {index}")]
    InvalidCodebookIndex { codebook: &'static str, index: usize },

    /// A declared count exceeds a hard cap
    #[error("{what} count {value} exceeds limit {limit}")]
    LimitExceeded {
        what: &'static str,
        value: usize,
        limit: usize,
    },

    /// Pixel depth not handled by the decoder
    #[error("Unsupported pixel depth: {0}")]
    UnsupportedDepth(u16),

    /// A codec met an opcode byte it does not know
    #[error("{codec}: unknown opcode 0x{opcode:02X} at offset {offset}")]
    UnknownSubOpcode {
        codec: &'static str,
        opcode: u8,
        offset: usize,
    },

    /// Compressed data ran out before the expected output was produced
    #[error("Truncated {what}: expected {expected} bytes, {available} available")]
    Truncated {
        what: &'static str,
        expected: usize,
        available: usize,
    },

    /// Unsupported feature
    #[error("Unsupported feature: {0}")]
    Unsupported(String),
}

/// Result type for decode operations.
pub type Result<T> = std::result::Result<T, Error>;
