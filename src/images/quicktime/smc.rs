//! QuickTime Graphics (`smc `) decoder
//!
//! 8-bit palettised images coded in 4x4 blocks. Opcodes skip or repeat
//! earlier blocks, fill with one colour, or paint with 2, 4 or 8 colours
//! drawn from most-recently-used caches, or carry 16 raw colours.

use super::blocks::BlockPixMap;
use super::description::ImageDescription;
use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use crate::images::raster::{PixMapMetadata, RasterImage};

const CACHE_ENTRIES: usize = 256;

/// Ring cache of colour groups; each new group overwrites the oldest slot
#[derive(Debug, Clone)]
struct ColorCache<const N: usize> {
    groups: Vec<[u8; N]>,
    next: usize,
}

impl<const N: usize> ColorCache<N> {
    fn new() -> Self {
        Self {
            groups: vec![[0; N]; CACHE_ENTRIES],
            next: 0,
        }
    }

    /// Read a new group from the stream and store it
    fn load(&mut self, reader: &mut ByteReader<'_>) -> Result<[u8; N]> {
        let group = reader.read_array::<N>()?;
        self.groups[self.next] = group;
        self.next = (self.next + 1) % CACHE_ENTRIES;
        Ok(group)
    }

    /// Read a cache index from the stream and look the group up
    fn lookup(&self, reader: &mut ByteReader<'_>) -> Result<[u8; N]> {
        Ok(self.groups[reader.read_u8()? as usize])
    }
}

/// Run length for the skip, repeat and fill opcodes
fn block_count(op: u8, reader: &mut ByteReader<'_>) -> Result<usize> {
    if op & 0x10 != 0 {
        Ok(reader.read_u8()? as usize + 1)
    } else {
        Ok((op & 0x0F) as usize + 1)
    }
}

/// Paint a block where each pixel picks from `colors` with `bits`-wide
/// indices taken from `flags`, most significant first
fn paint_indexed(
    pixmap: &mut BlockPixMap,
    block: usize,
    colors: &[u8],
    flags: u64,
    bits: u32,
) -> Result<()> {
    let mask = (1u64 << bits) - 1;
    let mut shift = bits * 16;
    for line in 0..4 {
        for pixel in pixmap.line_mut(block, line)?.iter_mut() {
            shift -= bits;
            *pixel = colors[((flags >> shift) & mask) as usize];
        }
    }
    Ok(())
}

/// Unscramble the 6 flag bytes of an 8-colour block into 48 bits of
/// 3-bit indices in pixel order
///
/// The bytes `01 23 45 67 89 AB` hold nibbles in the order
/// `0 1 2 | 4 5 6` for the top two rows and `8 9 A | 3 7 B` for the bottom.
fn octet_flags(reader: &mut ByteReader<'_>) -> Result<u64> {
    let v1 = reader.read_u16()? as u64;
    let v2 = reader.read_u16()? as u64;
    let v3 = reader.read_u16()? as u64;
    let top = ((v1 & 0xFFF0) << 8) | (v2 >> 4);
    let bottom = ((v3 & 0xFFF0) << 8) | ((v1 & 0x0F) << 8) | ((v2 & 0x0F) << 4) | (v3 & 0x0F);
    Ok((top << 24) | bottom)
}

/// Decode one QuickTime Graphics frame into 8-bit indices
pub fn decode(data: &[u8], desc: &ImageDescription) -> Result<RasterImage> {
    let mut reader = ByteReader::new(data);
    let _flags = reader.read_u8()?;
    let chunk_size = reader.read_u24()? as usize;
    if chunk_size != data.len() {
        log::debug!("smc chunk size {} differs from payload size {}", chunk_size, data.len());
    }

    let width = desc.width as u32;
    let height = desc.height as u32;
    let mut pixmap = BlockPixMap::new(width, height, 4, 1)?;
    let total = pixmap.block_count();
    let mut pairs = ColorCache::<2>::new();
    let mut quads = ColorCache::<4>::new();
    let mut octets = ColorCache::<8>::new();
    let mut block = 0usize;

    while block < total && !reader.at_end() {
        let offset = reader.position();
        let op = reader.read_u8()?;
        match op & 0xF0 {
            0x00 | 0x10 => {
                block += block_count(op, &mut reader)?;
            },
            0x20 | 0x30 => {
                let count = block_count(op, &mut reader)?;
                if block == 0 {
                    return Err(Error::InvalidFormat(
                        "smc repeat opcode before any block was rendered".into(),
                    ));
                }
                let source = block - 1;
                for _ in 0..count.min(total - block) {
                    pixmap.copy_block(source, block)?;
                    block += 1;
                }
            },
            0x40 | 0x50 => {
                let count = block_count(op, &mut reader)? * 2;
                if block < 2 {
                    return Err(Error::InvalidFormat(
                        "smc repeat-pair opcode before two blocks were rendered".into(),
                    ));
                }
                let sources = [block - 2, block - 1];
                for i in 0..count.min(total - block) {
                    pixmap.copy_block(sources[i % 2], block)?;
                    block += 1;
                }
            },
            0x60 | 0x70 => {
                let count = block_count(op, &mut reader)?;
                let color = reader.read_u8()?;
                for _ in 0..count.min(total - block) {
                    pixmap.fill_block(block, &[color])?;
                    block += 1;
                }
            },
            0x80 | 0x90 => {
                let count = (op & 0x0F) as usize + 1;
                let colors = if op & 0xF0 == 0x80 {
                    pairs.load(&mut reader)?
                } else {
                    pairs.lookup(&mut reader)?
                };
                for _ in 0..count.min(total - block) {
                    let flags = reader.read_u16()? as u64;
                    paint_indexed(&mut pixmap, block, &colors, flags, 1)?;
                    block += 1;
                }
            },
            0xA0 | 0xB0 => {
                let count = (op & 0x0F) as usize + 1;
                let colors = if op & 0xF0 == 0xA0 {
                    quads.load(&mut reader)?
                } else {
                    quads.lookup(&mut reader)?
                };
                for _ in 0..count.min(total - block) {
                    let flags = reader.read_u32()? as u64;
                    paint_indexed(&mut pixmap, block, &colors, flags, 2)?;
                    block += 1;
                }
            },
            0xC0 | 0xD0 => {
                let count = (op & 0x0F) as usize + 1;
                let colors = if op & 0xF0 == 0xC0 {
                    octets.load(&mut reader)?
                } else {
                    octets.lookup(&mut reader)?
                };
                for _ in 0..count.min(total - block) {
                    let flags = octet_flags(&mut reader)?;
                    paint_indexed(&mut pixmap, block, &colors, flags, 3)?;
                    block += 1;
                }
            },
            0xE0 => {
                let count = (op & 0x0F) as usize + 1;
                for _ in 0..count.min(total - block) {
                    for line in 0..4 {
                        let pixels = reader.read_bytes(4)?;
                        pixmap.line_mut(block, line)?.copy_from_slice(pixels);
                    }
                    block += 1;
                }
            },
            _ => {
                return Err(Error::UnknownSubOpcode {
                    codec: "smc",
                    opcode: op,
                    offset,
                });
            },
        }
    }

    pixmap.into_raster(PixMapMetadata::indexed(width, height, 8, desc.palette()?))
}
