//! 8x8 one-bit QuickDraw patterns

use super::color::Color;
use crate::common::binary::ByteReader;
use crate::common::error::Result;

/// An 8x8 monochrome pattern, one byte per row, most significant bit left
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Pattern(pub [u8; 8]);

impl Pattern {
    pub const WHITE: Self = Self([0x00; 8]);
    pub const BLACK: Self = Self([0xFF; 8]);
    pub const GRAY: Self = Self([0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55, 0xAA, 0x55]);

    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        reader.read_array::<8>().map(Self)
    }

    /// True if the pixel at (`x`, `y`) uses the foreground colour
    #[inline]
    pub fn is_set(&self, x: usize, y: usize) -> bool {
        self.0[y % 8] & (0x80 >> (x % 8)) != 0
    }

    /// Fraction of foreground pixels
    pub fn coverage(&self) -> f64 {
        let bits: u32 = self.0.iter().map(|row| row.count_ones()).sum();
        bits as f64 / 64.0
    }

    /// True for an all-foreground or all-background pattern
    pub fn is_solid(&self) -> bool {
        *self == Self::WHITE || *self == Self::BLACK
    }

    /// Approximate the pattern as a single colour
    pub fn blend(&self, foreground: &Color, background: &Color) -> Color {
        match self.coverage() {
            c if c >= 1.0 => foreground.clone(),
            c if c <= 0.0 => background.clone(),
            c => Color::blend(foreground.clone(), background.clone(), c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_bits() {
        let p = Pattern::GRAY;
        assert!(p.is_set(0, 0));
        assert!(!p.is_set(1, 0));
        assert!(p.is_set(1, 1));
        assert_eq!(p.coverage(), 0.5);
        assert!(!p.is_solid());
        assert!(Pattern::BLACK.is_solid());
    }

    #[test]
    fn test_pattern_blend() {
        assert_eq!(Pattern::BLACK.blend(&Color::BLACK, &Color::WHITE), Color::BLACK);
        assert_eq!(Pattern::WHITE.blend(&Color::BLACK, &Color::WHITE), Color::WHITE);
        assert!(matches!(
            Pattern::GRAY.blend(&Color::BLACK, &Color::WHITE),
            Color::Blend { weight, .. } if weight == 0.5
        ));
    }
}
