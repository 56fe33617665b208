//! Block-addressed pixel buffer
//!
//! Cinepak, Road Pizza and QuickTime Graphics address the image in square
//! blocks (4x4) in raster order instead of by row. This buffer maps a
//! `(block, line within block)` pair to a byte offset. Dimensions are rounded
//! up to whole blocks and one extra block row is allocated so that the
//! padding implied by ceiling division never indexes out of the buffer.

use crate::common::error::{Error, Result};
use crate::images::raster::{PixMapMetadata, RasterImage};

#[derive(Debug, Clone)]
pub struct BlockPixMap {
    block_size: usize,
    pixel_bytes: usize,
    width: u32,
    height: u32,
    blocks_per_line: usize,
    block_count: usize,
    row_bytes: usize,
    data: Vec<u8>,
}

impl BlockPixMap {
    /// Allocate a zeroed buffer for a `width` x `height` image
    pub fn new(width: u32, height: u32, block_size: usize, pixel_bytes: usize) -> Result<Self> {
        if width == 0 || height == 0 || block_size == 0 || pixel_bytes == 0 {
            return Err(Error::InvalidFormat(format!(
                "invalid block image {}x{} (block {}, {} bytes per pixel)",
                width, height, block_size, pixel_bytes
            )));
        }
        let blocks_per_line = (width as usize).div_ceil(block_size);
        let block_lines = (height as usize).div_ceil(block_size);
        let block_count = blocks_per_line * block_lines;
        let row_bytes = blocks_per_line * block_size * pixel_bytes;
        let rows = (block_lines + 1) * block_size;
        Ok(Self {
            block_size,
            pixel_bytes,
            width,
            height,
            blocks_per_line,
            block_count,
            row_bytes,
            data: vec![0; rows * row_bytes],
        })
    }

    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[inline]
    pub fn blocks_per_line(&self) -> usize {
        self.blocks_per_line
    }

    /// Number of blocks, a whole number of block rows
    #[inline]
    pub fn block_count(&self) -> usize {
        self.block_count
    }

    /// Bytes per pixel row (whole blocks)
    #[inline]
    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    /// Bytes in one line of one block
    #[inline]
    pub fn block_line_bytes(&self) -> usize {
        self.block_size * self.pixel_bytes
    }

    /// Byte offset of `line` within `block`
    pub fn offset(&self, block: usize, line: usize) -> Result<usize> {
        if block >= self.block_count {
            return Err(Error::LimitExceeded {
                what: "block index",
                value: block,
                limit: self.block_count,
            });
        }
        if line >= self.block_size {
            return Err(Error::LimitExceeded {
                what: "block line",
                value: line,
                limit: self.block_size,
            });
        }
        let block_row = block / self.blocks_per_line;
        let block_col = block % self.blocks_per_line;
        let y = block_row * self.block_size + line;
        let offset = y * self.row_bytes + block_col * self.block_line_bytes();
        if offset + self.block_line_bytes() > self.data.len() {
            return Err(Error::OutOfBounds {
                offset,
                requested: self.block_line_bytes(),
                available: self.data.len(),
            });
        }
        Ok(offset)
    }

    /// Mutable bytes of one block line
    pub fn line_mut(&mut self, block: usize, line: usize) -> Result<&mut [u8]> {
        let offset = self.offset(block, line)?;
        let len = self.block_line_bytes();
        Ok(&mut self.data[offset..offset + len])
    }

    /// Bytes of one block line
    pub fn line(&self, block: usize, line: usize) -> Result<&[u8]> {
        let offset = self.offset(block, line)?;
        Ok(&self.data[offset..offset + self.block_line_bytes()])
    }

    /// Copy every line of block `from` into block `to`
    pub fn copy_block(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.block_line_bytes();
        for line in 0..self.block_size {
            let src = self.offset(from, line)?;
            let dst = self.offset(to, line)?;
            self.data.copy_within(src..src + len, dst);
        }
        Ok(())
    }

    /// Fill each pixel of a block with the same pixel value
    pub fn fill_block(&mut self, block: usize, pixel: &[u8]) -> Result<()> {
        for line in 0..self.block_size {
            for chunk in self.line_mut(block, line)?.chunks_exact_mut(pixel.len()) {
                chunk.copy_from_slice(pixel);
            }
        }
        Ok(())
    }

    /// Finish decoding; rows keep their whole-block stride
    pub fn into_raster(self, metadata: PixMapMetadata) -> Result<RasterImage> {
        let metadata = metadata.with_row_bytes(self.row_bytes);
        let mut data = self.data;
        data.truncate(metadata.required_len());
        RasterImage::new(metadata, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
