//! Run-length (PackBits) decompression
//!
//! Used by the bitmap opcodes, pixel patterns and the planar and Targa
//! codecs. A signed control byte `n >= 0` copies the next `n + 1` literal
//! units; `n < 0` repeats the next unit `1 - n` times; `-128` is a no-op.
//! A unit is one byte for ordinary data, two bytes for 16-bit pixels,
//! three bytes for packed RGB triples and four for 32-bit Targa pixels.

use crate::common::error::{Error, Result};

/// Width of one PackBits unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackUnit {
    Byte = 1,
    Word = 2,
    Triple = 3,
    Quad = 4,
}

impl PackUnit {
    #[inline]
    pub const fn size(self) -> usize {
        self as usize
    }
}

/// UnpackBits decompression with byte units
///
/// # Arguments
/// * `compressed` - The compressed input data
/// * `expected_size` - The size of the decompressed output in bytes
pub fn unpack_bits(compressed: &[u8], expected_size: usize) -> Result<Vec<u8>> {
    unpack_bits_with_unit(compressed, expected_size, PackUnit::Byte)
}

/// UnpackBits decompression with a configurable unit
///
/// Decoding stops as soon as `expected_size` bytes are produced; a final run
/// that overshoots is clipped. Running out of input first is an error.
pub fn unpack_bits_with_unit(
    compressed: &[u8],
    expected_size: usize,
    unit: PackUnit,
) -> Result<Vec<u8>> {
    let unit_size = unit.size();
    let mut output = Vec::with_capacity(expected_size);
    let mut input_pos = 0;

    while output.len() < expected_size {
        let Some(&control) = compressed.get(input_pos) else {
            return Err(Error::Truncated {
                what: "PackBits data",
                expected: expected_size,
                available: output.len(),
            });
        };
        let code = control as i8;
        input_pos += 1;

        if code == -128 {
            continue;
        }

        let wanted = expected_size - output.len();
        if code < 0 {
            // Run: repeat the next unit (1 - code) times
            let run_length = (1 - code as i32) as usize;
            let Some(value) = compressed.get(input_pos..input_pos + unit_size) else {
                return Err(Error::Truncated {
                    what: "PackBits run",
                    expected: unit_size,
                    available: compressed.len() - input_pos,
                });
            };
            input_pos += unit_size;
            let mut remaining = (run_length * unit_size).min(wanted);
            while remaining > 0 {
                let n = remaining.min(unit_size);
                output.extend_from_slice(&value[..n]);
                remaining -= n;
            }
        } else {
            // Literal: copy (code + 1) units
            let literal_len = (code as usize + 1) * unit_size;
            let Some(literal) = compressed.get(input_pos..input_pos + literal_len) else {
                return Err(Error::Truncated {
                    what: "PackBits literal",
                    expected: literal_len,
                    available: compressed.len() - input_pos,
                });
            };
            input_pos += literal_len;
            output.extend_from_slice(&literal[..literal_len.min(wanted)]);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_bits_literal() {
        // Test literal bytes (code = 2 means 3 literal bytes)
        let compressed = vec![2, 0xAA, 0xBB, 0xCC];
        let result = unpack_bits(&compressed, 3).unwrap();
        assert_eq!(result, vec![0xAA, 0xBB, 0xCC]);
    }

    #[test]
    fn test_unpack_bits_run() {
        // Test run-length encoding (code = -2 means 3 repetitions of next byte)
        let compressed = vec![0xFE, 0xDD];
        let result = unpack_bits(&compressed, 3).unwrap();
        assert_eq!(result, vec![0xDD, 0xDD, 0xDD]);
    }

    #[test]
    fn test_unpack_bits_literal_then_run() {
        let compressed = vec![0x02, 0x01, 0x02, 0x03, 0xFE, 0x09];
        let result = unpack_bits(&compressed, 6).unwrap();
        assert_eq!(result, vec![0x01, 0x02, 0x03, 0x09, 0x09, 0x09]);
    }

    #[test]
    fn test_unpack_bits_noop() {
        // Test no-op code (-128)
        let compressed = vec![0x80, 1, 0xEE, 0xFF];
        let result = unpack_bits(&compressed, 2).unwrap();
        assert_eq!(result, vec![0xEE, 0xFF]);
    }

    #[test]
    fn test_unpack_bits_error() {
        // Code says 3 bytes but only 1 provided
        let compressed = vec![2, 0xAA];
        assert!(unpack_bits(&compressed, 3).is_err());
        // Requested more than the stream can supply
        let compressed = vec![0x02, 0x01, 0x02, 0x03, 0xFE, 0x09];
        assert!(matches!(
            unpack_bits(&compressed, 7),
            Err(Error::Truncated { .. })
        ));
    }

    #[test]
    fn test_unpack_bits_clips_overshoot() {
        let compressed = vec![0xFC, 0x11];
        assert_eq!(unpack_bits(&compressed, 2).unwrap(), vec![0x11, 0x11]);
    }

    #[test]
    fn test_unpack_words() {
        let compressed = vec![0x00, 0x12, 0x34, 0xFF, 0xAB, 0xCD];
        let result = unpack_bits_with_unit(&compressed, 6, PackUnit::Word).unwrap();
        assert_eq!(result, vec![0x12, 0x34, 0xAB, 0xCD, 0xAB, 0xCD]);
    }

    #[test]
    fn test_unpack_triples() {
        let compressed = vec![0xFE, 0x01, 0x02, 0x03];
        let result = unpack_bits_with_unit(&compressed, 9, PackUnit::Triple).unwrap();
        assert_eq!(result, [1, 2, 3].repeat(3));
    }

    #[test]
    fn test_unpack_quads() {
        let compressed = vec![0xFF, 1, 2, 3, 4, 0x00, 5, 6, 7, 8];
        let result = unpack_bits_with_unit(&compressed, 12, PackUnit::Quad).unwrap();
        assert_eq!(result, vec![1, 2, 3, 4, 1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
