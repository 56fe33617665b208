//! Decoded pixel buffers and their PixMap description
//!
//! Every raster decoder, whether a bitmap opcode or an embedded QuickTime
//! codec, produces a [`RasterImage`]: a byte buffer plus the metadata a
//! renderer needs to interpret it.

use super::pict::color::ColorTable;
use crate::common::error::{Error, Result};

/// Layout of a decoded pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixMapMetadata {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row, including padding
    pub row_bytes: usize,
    /// Bits per pixel
    pub pixel_size: u16,
    /// Components per pixel
    pub cmp_count: u16,
    /// Bits per component
    pub cmp_size: u16,
    /// Palette for indexed data
    pub color_table: Option<ColorTable>,
}

impl PixMapMetadata {
    /// Indexed pixels of 1, 2, 4 or 8 bits
    pub fn indexed(width: u32, height: u32, depth: u16, color_table: ColorTable) -> Self {
        Self {
            width,
            height,
            row_bytes: (width as usize * depth as usize).div_ceil(8),
            pixel_size: depth,
            cmp_count: 1,
            cmp_size: depth,
            color_table: Some(color_table),
        }
    }

    /// Big-endian `xRRRRRGGGGGBBBBB` pixels
    pub fn rgb555(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            row_bytes: width as usize * 2,
            pixel_size: 16,
            cmp_count: 3,
            cmp_size: 5,
            color_table: None,
        }
    }

    /// Three 8-bit components, `R G B`
    pub fn rgb(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            row_bytes: width as usize * 3,
            pixel_size: 24,
            cmp_count: 3,
            cmp_size: 8,
            color_table: None,
        }
    }

    /// Four 8-bit components, `A R G B`
    pub fn argb(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            row_bytes: width as usize * 4,
            pixel_size: 32,
            cmp_count: 4,
            cmp_size: 8,
            color_table: None,
        }
    }

    /// Override the row stride (block codecs pad rows to whole blocks)
    pub fn with_row_bytes(mut self, row_bytes: usize) -> Self {
        self.row_bytes = row_bytes;
        self
    }

    /// True for palette-indexed data
    pub fn is_indexed(&self) -> bool {
        self.cmp_count == 1 && self.color_table.is_some()
    }

    /// Bytes needed to hold every row
    pub fn required_len(&self) -> usize {
        self.row_bytes * self.height as usize
    }

    /// Check that stride, depth and component layout agree
    pub fn validate(&self, data_len: usize) -> Result<()> {
        let components = self.cmp_count as usize * self.cmp_size as usize;
        let consistent = match self.pixel_size {
            1 | 2 | 4 | 8 => self.cmp_count == 1 && self.cmp_size == self.pixel_size,
            16 => self.cmp_count == 3 && self.cmp_size == 5,
            24 | 32 => components <= self.pixel_size as usize && self.cmp_size == 8,
            other => return Err(Error::UnsupportedDepth(other)),
        };
        if !consistent {
            return Err(Error::ComponentCount {
                expected: match self.pixel_size {
                    16 | 24 => 3,
                    32 => 4,
                    _ => 1,
                },
                actual: self.cmp_count,
            });
        }
        if self.row_bytes * 8 < self.width as usize * self.pixel_size as usize {
            return Err(Error::InvalidFormat(format!(
                "row bytes {} too small for {} pixels of {} bits",
                self.row_bytes, self.width, self.pixel_size
            )));
        }
        if data_len < self.required_len() {
            return Err(Error::Truncated {
                what: "pixel data",
                expected: self.required_len(),
                available: data_len,
            });
        }
        Ok(())
    }
}

/// A decoded pixel buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub metadata: PixMapMetadata,
    pub data: Vec<u8>,
}

impl RasterImage {
    /// Pair a buffer with its metadata, checking that they agree
    pub fn new(metadata: PixMapMetadata, data: Vec<u8>) -> Result<Self> {
        metadata.validate(data.len())?;
        Ok(Self { metadata, data })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.metadata.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.metadata.height
    }

    /// Bytes of row `y`
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        if y >= self.metadata.height {
            return None;
        }
        let start = y as usize * self.metadata.row_bytes;
        self.data.get(start..start + self.metadata.row_bytes)
    }

    /// Colour of one pixel as 8-bit RGBA
    pub fn pixel_rgba(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.metadata.width {
            return None;
        }
        let row = self.row(y)?;
        let x = x as usize;
        match self.metadata.pixel_size {
            depth @ (1 | 2 | 4 | 8) => {
                let depth = depth as usize;
                let bit = x * depth;
                let shift = 8 - depth - bit % 8;
                let index = (row[bit / 8] >> shift) as usize & ((1 << depth) - 1);
                let table = self.metadata.color_table.as_ref();
                let [r, g, b] = match table {
                    Some(table) => table.get(index)?.to_rgb8(),
                    // Without a palette, treat the value as grey intensity
                    None => {
                        let level = (index * 255 / ((1 << depth) - 1)) as u8;
                        [level, level, level]
                    },
                };
                Some([r, g, b, 0xFF])
            },
            16 => {
                let value = u16::from_be_bytes([row[x * 2], row[x * 2 + 1]]);
                let [r, g, b] = super::pict::color::RgbColor::from_rgb555(value).to_rgb8();
                Some([r, g, b, 0xFF])
            },
            24 => Some([row[x * 3], row[x * 3 + 1], row[x * 3 + 2], 0xFF]),
            32 => {
                let p = &row[x * 4..x * 4 + 4];
                let alpha = if self.metadata.cmp_count == 4 { p[0] } else { 0xFF };
                Some([p[1], p[2], p[3], alpha])
            },
            _ => None,
        }
    }
}
