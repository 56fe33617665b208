//! Cinepak (`cvid`) decoder
//!
//! A frame is split into horizontal strips. Each strip carries codebook
//! chunks (up to 256 entries of four luma samples plus shared chroma) and
//! vector chunks that paint 4x4 macroblocks from those codebooks, either one
//! entry scaled up (V1) or four entries, one per 2x2 quadrant (V4).
//! Codebooks persist across strips for the duration of one frame.

use super::blocks::BlockPixMap;
use super::description::ImageDescription;
use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use crate::images::pict::color::{ColorTable, RgbColor};
use crate::images::raster::{PixMapMetadata, RasterImage};
use bitflags::bitflags;

const MAX_STRIPS: usize = 32;
const CODEBOOK_SIZE: usize = 256;
const FRAME_HEADER_SIZE: usize = 10;
const STRIP_HEADER_SIZE: usize = 12;
const CHUNK_HEADER_SIZE: usize = 4;

bitflags! {
    /// Bits of a chunk id
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChunkFlags: u16 {
        /// Codebook: only entries whose mask bit is set are replaced.
        /// Vectors: inter-coded, a macroblock may be skipped.
        const PARTIAL = 0x0100;
        /// Codebook: the V1 book. Vectors: every macroblock is V1.
        const SINGLE = 0x0200;
        /// Codebook entries carry no chroma (4 bytes instead of 6)
        const MONO = 0x0400;
        const VECTORS = 0x1000;
        const CODEBOOK = 0x2000;
    }
}

/// One codebook entry: a 2x2 luma patch with shared chroma
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodebookEntry {
    pub y: [u8; 4],
    pub u: i8,
    pub v: i8,
}

impl CodebookEntry {
    /// Write sample `n` (0..4, raster order in the 2x2 patch) as a pixel
    #[inline]
    fn write_pixel(&self, n: usize, indexed: bool, out: &mut [u8]) {
        if indexed {
            out[0] = self.y[n];
            return;
        }
        let y = self.y[n] as i32;
        let u = self.u as i32;
        let v = self.v as i32;
        out[0] = (y + 2 * v).clamp(0, 255) as u8;
        out[1] = (y - u / 2 - v).clamp(0, 255) as u8;
        out[2] = (y + 2 * u).clamp(0, 255) as u8;
    }
}

/// The V1 and V4 codebooks
#[derive(Debug, Clone)]
pub struct Codebooks {
    v1: [Option<CodebookEntry>; CODEBOOK_SIZE],
    v4: [Option<CodebookEntry>; CODEBOOK_SIZE],
}

impl Default for Codebooks {
    fn default() -> Self {
        Self {
            v1: [None; CODEBOOK_SIZE],
            v4: [None; CODEBOOK_SIZE],
        }
    }
}

impl Codebooks {
    pub fn v1(&self, index: u8) -> Result<&CodebookEntry> {
        self.v1[index as usize]
            .as_ref()
            .ok_or(Error::InvalidCodebookIndex {
                codebook: "V1",
                index: index as usize,
            })
    }

    pub fn v4(&self, index: u8) -> Result<&CodebookEntry> {
        self.v4[index as usize]
            .as_ref()
            .ok_or(Error::InvalidCodebookIndex {
                codebook: "V4",
                index: index as usize,
            })
    }

    /// Load a codebook chunk body
    pub fn load(&mut self, flags: ChunkFlags, reader: &mut ByteReader<'_>) -> Result<()> {
        let entry_size = if flags.contains(ChunkFlags::MONO) { 4 } else { 6 };
        let partial = flags.contains(ChunkFlags::PARTIAL);
        if !partial && reader.remaining() / entry_size > CODEBOOK_SIZE {
            return Err(Error::LimitExceeded {
                what: "codebook entry",
                value: reader.remaining() / entry_size,
                limit: CODEBOOK_SIZE,
            });
        }
        let book = if flags.contains(ChunkFlags::SINGLE) {
            &mut self.v1
        } else {
            &mut self.v4
        };

        let mut mask = 0u32;
        let mut mask_bits = 0;
        for slot in book.iter_mut() {
            if partial {
                if mask_bits == 0 {
                    if reader.remaining() < 4 {
                        break;
                    }
                    mask = reader.read_u32()?;
                    mask_bits = 32;
                }
                let selected = mask & 0x8000_0000 != 0;
                mask <<= 1;
                mask_bits -= 1;
                if !selected {
                    continue;
                }
            }
            if reader.remaining() < entry_size {
                break;
            }
            let y = reader.read_array::<4>()?;
            let (u, v) = if entry_size == 6 {
                (reader.read_i8()?, reader.read_i8()?)
            } else {
                (0, 0)
            };
            *slot = Some(CodebookEntry { y, u, v });
        }
        Ok(())
    }
}

/// Macroblock coding flags, read one bit at a time from 32-bit words
struct FlagBits {
    word: u32,
    remaining: u32,
}

impl FlagBits {
    fn new() -> Self {
        Self {
            word: 0,
            remaining: 0,
        }
    }

    fn next(&mut self, reader: &mut ByteReader<'_>) -> Result<bool> {
        if self.remaining == 0 {
            self.word = reader.read_u32()?;
            self.remaining = 32;
        }
        let bit = self.word & 0x8000_0000 != 0;
        self.word <<= 1;
        self.remaining -= 1;
        Ok(bit)
    }
}

/// Frame-wide decode state
struct Frame {
    pixmap: BlockPixMap,
    books: Codebooks,
    indexed: bool,
}

impl Frame {
    fn pixel_bytes(&self) -> usize {
        if self.indexed { 1 } else { 3 }
    }

    /// Paint a macroblock from one V1 entry, each sample covering 2x2 pixels
    fn paint_v1(&mut self, block: usize, index: u8) -> Result<()> {
        let entry = *self.books.v1(index)?;
        let bpp = self.pixel_bytes();
        for line in 0..4 {
            let row = self.pixmap.line_mut(block, line)?;
            for col in 0..4 {
                let sample = (line / 2) * 2 + col / 2;
                entry.write_pixel(sample, self.indexed, &mut row[col * bpp..(col + 1) * bpp]);
            }
        }
        Ok(())
    }

    /// Paint a macroblock from four V4 entries, one per quadrant
    fn paint_v4(&mut self, block: usize, indices: [u8; 4]) -> Result<()> {
        let entries = [
            *self.books.v4(indices[0])?,
            *self.books.v4(indices[1])?,
            *self.books.v4(indices[2])?,
            *self.books.v4(indices[3])?,
        ];
        let bpp = self.pixel_bytes();
        for line in 0..4 {
            let row = self.pixmap.line_mut(block, line)?;
            for col in 0..4 {
                let entry = &entries[(line / 2) * 2 + col / 2];
                let sample = (line % 2) * 2 + col % 2;
                entry.write_pixel(sample, self.indexed, &mut row[col * bpp..(col + 1) * bpp]);
            }
        }
        Ok(())
    }

    /// Decode a vector chunk covering `blocks`
    fn decode_vectors(
        &mut self,
        flags: ChunkFlags,
        reader: &mut ByteReader<'_>,
        blocks: std::ops::Range<usize>,
    ) -> Result<()> {
        let mut bits = FlagBits::new();
        for block in blocks {
            if reader.at_end() {
                break;
            }
            if flags.contains(ChunkFlags::SINGLE) {
                let index = reader.read_u8()?;
                self.paint_v1(block, index)?;
                continue;
            }
            if flags.contains(ChunkFlags::PARTIAL) && !bits.next(reader)? {
                continue;
            }
            if bits.next(reader)? {
                let indices = reader.read_array::<4>()?;
                self.paint_v4(block, indices)?;
            } else {
                let index = reader.read_u8()?;
                self.paint_v1(block, index)?;
            }
        }
        Ok(())
    }
}

/// Decode one Cinepak frame
pub fn decode(data: &[u8], desc: &ImageDescription) -> Result<RasterImage> {
    let mut reader = ByteReader::new(data);
    let _frame_flags = reader.read_u8()?;
    let declared = reader.read_u24()? as usize;
    if declared != data.len() {
        log::debug!(
            "cinepak frame length {} differs from payload size {}",
            declared,
            data.len()
        );
    }
    let width = reader.read_u16()? as u32;
    let height = reader.read_u16()? as u32;
    desc.check_dimensions(width, height)?;
    let strip_count = reader.read_u16()? as usize;
    if strip_count > MAX_STRIPS {
        return Err(Error::LimitExceeded {
            what: "strip",
            value: strip_count,
            limit: MAX_STRIPS,
        });
    }
    debug_assert_eq!(reader.position(), FRAME_HEADER_SIZE);

    let indexed = desc.bits_per_pixel() <= 8;
    let mut frame = Frame {
        pixmap: BlockPixMap::new(width, height, 4, if indexed { 1 } else { 3 })?,
        books: Codebooks::default(),
        indexed,
    };

    let blocks_per_line = frame.pixmap.blocks_per_line();
    let mut strip_top = 0usize;
    for strip in 0..strip_count {
        if reader.remaining() < STRIP_HEADER_SIZE {
            log::warn!("cinepak frame ends after {} of {} strips", strip, strip_count);
            break;
        }
        let _strip_id = reader.read_u16()?;
        let size = reader.read_u16()? as usize;
        if size < STRIP_HEADER_SIZE {
            return Err(Error::InvalidLength {
                what: "cinepak strip",
                length: size as i64,
            });
        }
        let top = reader.read_u16()? as usize;
        let _left = reader.read_u16()?;
        let bottom = reader.read_u16()? as usize;
        let _right = reader.read_u16()?;
        // Strips give either an absolute top/bottom pair or a height
        let strip_height = if top == strip_top && bottom > top {
            bottom - top
        } else {
            bottom
        };

        let body_len = (size - STRIP_HEADER_SIZE).min(reader.remaining());
        let mut body = reader.sub_reader(body_len)?;
        let first_block = (strip_top / 4) * blocks_per_line;
        let last_block =
            (((strip_top + strip_height).div_ceil(4)) * blocks_per_line).min(frame.pixmap.block_count());

        while body.remaining() >= CHUNK_HEADER_SIZE {
            let id = body.read_u16()?;
            let chunk_size = body.read_u16()? as usize;
            if chunk_size < CHUNK_HEADER_SIZE {
                return Err(Error::InvalidLength {
                    what: "cinepak chunk",
                    length: chunk_size as i64,
                });
            }
            let len = (chunk_size - CHUNK_HEADER_SIZE).min(body.remaining());
            let mut chunk = body.sub_reader(len)?;
            let flags = ChunkFlags::from_bits_truncate(id);
            if flags.contains(ChunkFlags::VECTORS) {
                frame.decode_vectors(flags, &mut chunk, first_block..last_block)?;
            } else if flags.contains(ChunkFlags::CODEBOOK) {
                frame.books.load(flags, &mut chunk)?;
            } else {
                log::debug!("skipping cinepak chunk 0x{:04X}", id);
            }
        }
        strip_top += strip_height;
    }

    let metadata = if desc.is_grayscale() {
        // Luma samples are intensities, not Mac grey indices
        let ramp = (0..=255u8).map(|l| RgbColor::from_rgb8(l, l, l)).collect();
        PixMapMetadata::indexed(width, height, 8, ColorTable::new(ramp))
    } else if indexed {
        PixMapMetadata::indexed(width, height, 8, desc.palette()?)
    } else {
        PixMapMetadata::rgb(width, height)
    };
    frame.pixmap.into_raster(metadata)
}
