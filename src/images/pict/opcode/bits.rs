// Bitmap, pixmap and pixel pattern opcodes
//
// BitsRect/BitsRgn (0x90, 0x91) store rows unpacked; PackBitsRect/PackBitsRgn
// (0x98, 0x99) pack each row of 8 or more bytes with PackBits behind a byte
// count. DirectBitsRect/DirectBitsRgn (0x9A, 0x9B) carry 16- or 32-bit
// pixels and pick their packing from the pixmap's `packType`.

use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use crate::common::fixed::FixedPoint;
use crate::images::pict::color::{ColorTable, RgbColor};
use crate::images::pict::data::{PackUnit, unpack_bits_with_unit};
use crate::images::pict::pattern::Pattern;
use crate::images::pict::region::Region;
use crate::images::pict::types::Rect;
use crate::images::raster::{PixMapMetadata, RasterImage};
use zerocopy::{BE, FromBytes, I16, I32, U16, U32};
use zerocopy_derive::{FromBytes as DeriveFromBytes, Immutable, KnownLayout, Unaligned};

/// Row bytes flag marking a PixMap rather than a BitMap
const PIXMAP_FLAG: u16 = 0x8000;
const ROW_BYTES_MASK: u16 = 0x3FFF;
/// Rows shorter than this are never packed
const MIN_PACKED_ROW_BYTES: usize = 8;
/// Longer rows store their packed length in a word instead of a byte
const BYTE_COUNT_LIMIT: usize = 250;
/// Placeholder base address before a direct pixmap
const BASE_ADDR_SIZE: usize = 4;

/// PixMap record as stored in a picture (no base address)
#[derive(Debug, Clone, Copy, DeriveFromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawPixMap {
    row_bytes: U16<BE>,
    bounds: [I16<BE>; 4],
    version: I16<BE>,
    pack_type: I16<BE>,
    pack_size: I32<BE>,
    h_res: I32<BE>,
    v_res: I32<BE>,
    pixel_type: I16<BE>,
    pixel_size: I16<BE>,
    cmp_count: I16<BE>,
    cmp_size: I16<BE>,
    plane_bytes: I32<BE>,
    table: U32<BE>,
    reserved: U32<BE>,
}

const RAW_PIXMAP_SIZE: usize = std::mem::size_of::<RawPixMap>();

/// Which family a bits opcode belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BitsKind {
    Bits,
    PackBits,
    DirectBits,
}

/// BitMap or PixMap header fields
#[derive(Debug, Clone, PartialEq)]
pub struct PixMapHeader {
    pub row_bytes: usize,
    /// False for a one-bit BitMap
    pub is_pixmap: bool,
    pub bounds: Rect,
    pub pack_type: i16,
    pub h_res: FixedPoint,
    pub v_res: FixedPoint,
    pub pixel_type: i16,
    pub pixel_size: u16,
    pub cmp_count: u16,
    pub cmp_size: u16,
    pub color_table: Option<ColorTable>,
}

impl PixMapHeader {
    /// Read a BitMap, or a PixMap when the row bytes flag is set.
    /// Indexed pixmaps are followed by their colour table.
    pub fn read(reader: &mut ByteReader<'_>, with_color_table: bool) -> Result<Self> {
        let flagged = reader.peek_u16()?;
        if flagged & PIXMAP_FLAG == 0 {
            let row_bytes = (reader.read_u16()? & ROW_BYTES_MASK) as usize;
            let bounds = Rect::read(reader)?;
            return Ok(Self {
                row_bytes,
                is_pixmap: false,
                bounds,
                pack_type: 0,
                h_res: FixedPoint::from(72i16),
                v_res: FixedPoint::from(72i16),
                pixel_type: 0,
                pixel_size: 1,
                cmp_count: 1,
                cmp_size: 1,
                color_table: Some(ColorTable::standard(1)?.clone()),
            });
        }

        let bytes = reader.read_bytes(RAW_PIXMAP_SIZE)?;
        let raw = RawPixMap::read_from_bytes(bytes)
            .map_err(|_| Error::ParseError("Failed to parse PixMap".into()))?;
        let [top, left, bottom, right] = raw.bounds.map(|v| v.get());
        let color_table = if with_color_table {
            Some(ColorTable::read(reader)?)
        } else {
            None
        };
        Ok(Self {
            row_bytes: (raw.row_bytes.get() & ROW_BYTES_MASK) as usize,
            is_pixmap: true,
            bounds: Rect::new(top, left, bottom, right),
            pack_type: raw.pack_type.get(),
            h_res: FixedPoint::from_raw(raw.h_res.get()),
            v_res: FixedPoint::from_raw(raw.v_res.get()),
            pixel_type: raw.pixel_type.get(),
            pixel_size: u16::try_from(raw.pixel_size.get())?,
            cmp_count: u16::try_from(raw.cmp_count.get())?,
            cmp_size: u16::try_from(raw.cmp_size.get())?,
            color_table,
        })
    }

    /// Width and height from the bounds
    pub fn dimensions(&self) -> Result<(u32, u32)> {
        let width = self.bounds.width();
        let height = self.bounds.height();
        if width <= 0 || height <= 0 {
            return Err(Error::InvalidFormat(format!(
                "pixmap bounds {}x{} have no area",
                width, height
            )));
        }
        Ok((width as u32, height as u32))
    }

    fn metadata(&self, width: u32, height: u32) -> PixMapMetadata {
        PixMapMetadata {
            width,
            height,
            row_bytes: self.row_bytes,
            pixel_size: self.pixel_size,
            cmp_count: self.cmp_count,
            cmp_size: self.cmp_size,
            color_table: if self.pixel_size <= 8 {
                self.color_table.clone()
            } else {
                None
            },
        }
    }
}

/// Read `height` rows of `unpacked` bytes, each packed behind a byte count
/// when `packed` is set. The width of the count follows the pixmap's
/// `row_bytes`, which differs from `unpacked` for planar direct rows.
fn read_rows(
    reader: &mut ByteReader<'_>,
    row_bytes: usize,
    unpacked: usize,
    height: usize,
    packed: bool,
    unit: PackUnit,
) -> Result<Vec<u8>> {
    if !packed || row_bytes < MIN_PACKED_ROW_BYTES {
        return reader.read_vec(unpacked * height);
    }
    let mut rows = Vec::with_capacity(unpacked * height);
    for _ in 0..height {
        let count = if row_bytes > BYTE_COUNT_LIMIT {
            reader.read_u16()? as usize
        } else {
            reader.read_u8()? as usize
        };
        let row = unpack_bits_with_unit(reader.read_bytes(count)?, unpacked, unit)?;
        rows.extend_from_slice(&row);
    }
    Ok(rows)
}

/// Read the pixel data of a BitMap or indexed PixMap
pub fn read_indexed_pixels(
    reader: &mut ByteReader<'_>,
    header: &PixMapHeader,
    packed: bool,
) -> Result<RasterImage> {
    let (width, height) = header.dimensions()?;
    let unit = if header.pixel_size == 16 {
        PackUnit::Word
    } else {
        PackUnit::Byte
    };
    let data = read_rows(reader, header.row_bytes, header.row_bytes, height as usize, packed, unit)?;
    RasterImage::new(header.metadata(width, height), data)
}

/// Read the pixel data of a direct (16- or 32-bit) PixMap
pub fn read_direct_pixels(reader: &mut ByteReader<'_>, header: &PixMapHeader) -> Result<RasterImage> {
    let (width, height) = header.dimensions()?;
    let (w, h) = (width as usize, height as usize);
    let row_bytes = header.row_bytes;
    let pack_type = match header.pack_type {
        _ if row_bytes < MIN_PACKED_ROW_BYTES => 1,
        0 if header.pixel_size == 16 => 3,
        0 => 4,
        other => other,
    };

    match (pack_type, header.pixel_size) {
        (1, 16 | 32) => {
            let data = reader.read_vec(row_bytes * h)?;
            RasterImage::new(header.metadata(width, height), data)
        },
        (2, 32) => {
            // Pad byte dropped: three bytes per pixel, no row counts
            let data = reader.read_vec(w * 3 * h)?;
            RasterImage::new(PixMapMetadata::rgb(width, height), data)
        },
        (3, 16) => {
            let data = read_rows(reader, row_bytes, row_bytes, h, true, PackUnit::Word)?;
            RasterImage::new(header.metadata(width, height), data)
        },
        (4, 32) => {
            let components = header.cmp_count as usize;
            if !(3..=4).contains(&components) {
                return Err(Error::ComponentCount {
                    expected: 4,
                    actual: header.cmp_count,
                });
            }
            let planar = read_rows(reader, row_bytes, w * components, h, true, PackUnit::Byte)?;
            let mut data = vec![0u8; w * 4 * h];
            for (src, dst) in planar.chunks_exact(w * components).zip(data.chunks_exact_mut(w * 4)) {
                // Component planes, alpha first when present, then R, G, B
                let skip = 4 - components;
                for c in 0..components {
                    let plane = &src[c * w..(c + 1) * w];
                    for (x, &value) in plane.iter().enumerate() {
                        dst[x * 4 + skip + c] = value;
                    }
                }
            }
            let mut metadata = PixMapMetadata::argb(width, height);
            metadata.cmp_count = header.cmp_count;
            RasterImage::new(metadata, data)
        },
        (pack, depth) => Err(Error::Unsupported(format!(
            "direct pixels with pack type {} at depth {}",
            pack, depth
        ))),
    }
}

/// Bitmap or pixmap copy opcode
#[derive(Debug, Clone, PartialEq)]
pub struct BitsOpcode {
    pub kind: BitsKind,
    pub header: PixMapHeader,
    pub src_rect: Rect,
    pub dst_rect: Rect,
    /// Transfer mode
    pub mode: i16,
    /// Clip mask for the region variants
    pub mask: Option<Region>,
    pub image: RasterImage,
}

impl BitsOpcode {
    pub fn read(kind: BitsKind, with_region: bool, reader: &mut ByteReader<'_>) -> Result<Self> {
        let direct = kind == BitsKind::DirectBits;
        if direct {
            reader.skip(BASE_ADDR_SIZE)?;
            if reader.peek_u16()? & PIXMAP_FLAG == 0 {
                return Err(Error::InvalidFormat("direct bits without a PixMap".into()));
            }
        }
        let header = PixMapHeader::read(reader, !direct)?;
        let src_rect = Rect::read(reader)?;
        let dst_rect = Rect::read(reader)?;
        let mode = reader.read_i16()?;
        let mask = if with_region {
            Some(Region::read(reader)?)
        } else {
            None
        };
        let image = match kind {
            BitsKind::DirectBits => read_direct_pixels(reader, &header)?,
            BitsKind::Bits => read_indexed_pixels(reader, &header, false)?,
            BitsKind::PackBits => read_indexed_pixels(reader, &header, true)?,
        };
        Ok(Self {
            kind,
            header,
            src_rect,
            dst_rect,
            mode,
            mask,
            image,
        })
    }
}

/// What a pixel pattern paints with
#[derive(Debug, Clone, PartialEq)]
pub enum PixPatternFill {
    /// Only the one-bit pattern
    Monochrome,
    /// Full colour pixmap
    Pixels(RasterImage),
    /// Dithered approximation of an RGB colour
    Dither(RgbColor),
}

/// Pixel pattern (BkPixPat, PnPixPat, FillPixPat)
#[derive(Debug, Clone, PartialEq)]
pub struct PixPattern {
    pub pat_type: u16,
    /// Fallback for one-bit devices
    pub pattern: Pattern,
    pub fill: PixPatternFill,
}

impl PixPattern {
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let pat_type = reader.read_u16()?;
        let pattern = Pattern::read(reader)?;
        let fill = match pat_type {
            0 => PixPatternFill::Monochrome,
            1 => {
                let header = PixMapHeader::read(reader, true)?;
                PixPatternFill::Pixels(read_indexed_pixels(reader, &header, true)?)
            },
            2 => PixPatternFill::Dither(RgbColor::read(reader)?),
            other => {
                return Err(Error::InvalidFormat(format!("pixel pattern type {}", other)));
            },
        };
        Ok(Self {
            pat_type,
            pattern,
            fill,
        })
    }
}
