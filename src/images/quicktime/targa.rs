//! Targa (`tga `) decoder
//!
//! QuickTime stores a complete Targa file as the image data. Only the
//! layouts QuickTime writes are accepted: top-left origin, no alpha bits,
//! colour-mapped, true-colour or grey-scale, raw or PackBits-compressed
//! with one unit per pixel.

use super::description::ImageDescription;
use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use crate::images::pict::color::{ColorTable, RgbColor};
use crate::images::pict::data::{PackUnit, unpack_bits_with_unit};
use crate::images::raster::{PixMapMetadata, RasterImage};
use zerocopy::{FromBytes, LE, U16};
use zerocopy_derive::{FromBytes as DeriveFromBytes, Immutable, KnownLayout, Unaligned};

/// Fixed 18-byte little-endian header
#[derive(Debug, Clone, Copy, DeriveFromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
pub struct TargaHeader {
    pub id_length: u8,
    pub color_map_type: u8,
    pub image_type: u8,
    pub color_map_first: U16<LE>,
    pub color_map_length: U16<LE>,
    pub color_map_entry_size: u8,
    pub x_origin: U16<LE>,
    pub y_origin: U16<LE>,
    pub width: U16<LE>,
    pub height: U16<LE>,
    pub pixel_depth: u8,
    pub descriptor: u8,
}

const HEADER_SIZE: usize = std::mem::size_of::<TargaHeader>();
const DESCRIPTOR_ALPHA_BITS: u8 = 0x0F;
const DESCRIPTOR_TOP_ORIGIN: u8 = 0x20;
const DESCRIPTOR_RIGHT_ORIGIN: u8 = 0x10;

/// Image type without the run-length bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargaKind {
    ColorMapped,
    TrueColor,
    Grayscale,
}

impl TargaHeader {
    /// Kind and whether pixel data is PackBits-compressed
    pub fn kind(&self) -> Result<(TargaKind, bool)> {
        let kind = match self.image_type & 0x07 {
            1 => TargaKind::ColorMapped,
            2 => TargaKind::TrueColor,
            3 => TargaKind::Grayscale,
            other => {
                return Err(Error::Unsupported(format!("Targa image type {}", other)));
            },
        };
        Ok((kind, self.image_type & 0x08 != 0))
    }
}

/// Read one colour map entry of `bits` bits
fn read_map_entry(reader: &mut ByteReader<'_>, bits: u8) -> Result<RgbColor> {
    match bits {
        15 | 16 => Ok(RgbColor::from_rgb555(reader.read_u16_le()? & 0x7FFF)),
        24 => {
            let [b, g, r] = reader.read_array::<3>()?;
            Ok(RgbColor::from_rgb8(r, g, b))
        },
        32 => {
            let [b, g, r, _] = reader.read_array::<4>()?;
            Ok(RgbColor::from_rgb8(r, g, b))
        },
        other => Err(Error::UnsupportedDepth(other as u16)),
    }
}

/// Decode a Targa file
pub fn decode(data: &[u8], desc: &ImageDescription) -> Result<RasterImage> {
    let (header, _) = TargaHeader::read_from_prefix(data).map_err(|_| Error::Truncated {
        what: "Targa header",
        expected: HEADER_SIZE,
        available: data.len(),
    })?;
    let (kind, compressed) = header.kind()?;
    let width = header.width.get() as u32;
    let height = header.height.get() as u32;
    desc.check_dimensions(width, height)?;

    if header.descriptor & DESCRIPTOR_ALPHA_BITS != 0 {
        return Err(Error::Unsupported(format!(
            "Targa with {} alpha bits",
            header.descriptor & DESCRIPTOR_ALPHA_BITS
        )));
    }
    if header.descriptor & DESCRIPTOR_TOP_ORIGIN == 0 || header.descriptor & DESCRIPTOR_RIGHT_ORIGIN != 0 {
        return Err(Error::Unsupported("Targa origin other than top-left".into()));
    }

    let mut reader = ByteReader::new(data);
    reader.skip(HEADER_SIZE + header.id_length as usize)?;

    let mut color_table = None;
    if header.color_map_type == 1 {
        let first = header.color_map_first.get() as usize;
        let length = header.color_map_length.get() as usize;
        if first + length > 256 {
            return Err(Error::LimitExceeded {
                what: "Targa colour map entry",
                value: first + length,
                limit: 256,
            });
        }
        let mut colors = vec![RgbColor::BLACK; first + length];
        for slot in colors.iter_mut().skip(first) {
            *slot = read_map_entry(&mut reader, header.color_map_entry_size)?;
        }
        color_table = Some(ColorTable::new(colors));
    }

    let depth = header.pixel_depth;
    let unit = match (kind, depth) {
        (TargaKind::ColorMapped | TargaKind::Grayscale, 8) => PackUnit::Byte,
        (TargaKind::TrueColor, 15 | 16) => PackUnit::Word,
        (TargaKind::TrueColor, 24) => PackUnit::Triple,
        (TargaKind::TrueColor, 32) => PackUnit::Quad,
        _ => return Err(Error::UnsupportedDepth(depth as u16)),
    };
    let pixel_bytes = unit.size();
    let expected = width as usize * height as usize * pixel_bytes;
    let mut pixels = if compressed {
        unpack_bits_with_unit(reader.rest(), expected, unit)?
    } else {
        reader.read_vec(expected)?
    };

    let metadata = match pixel_bytes {
        1 => {
            let table = match (kind, color_table) {
                (TargaKind::ColorMapped, Some(table)) => table,
                (TargaKind::ColorMapped, None) => {
                    return Err(Error::InvalidFormat("colour-mapped Targa without a map".into()));
                },
                _ => ColorTable::new((0..=255u8).map(|l| RgbColor::from_rgb8(l, l, l)).collect()),
            };
            PixMapMetadata::indexed(width, height, 8, table)
        },
        2 => {
            // Little-endian ARRRRRGG GGGBBBBB to big-endian 555
            for pixel in pixels.chunks_exact_mut(2) {
                let value = u16::from_le_bytes([pixel[0], pixel[1]]) & 0x7FFF;
                pixel.copy_from_slice(&value.to_be_bytes());
            }
            PixMapMetadata::rgb555(width, height)
        },
        3 => {
            for pixel in pixels.chunks_exact_mut(3) {
                pixel.swap(0, 2);
            }
            PixMapMetadata::rgb(width, height)
        },
        _ => {
            // BGRA to ARGB; the alpha byte carries no alpha bits
            for pixel in pixels.chunks_exact_mut(4) {
                let [b, g, r, _] = [pixel[0], pixel[1], pixel[2], pixel[3]];
                pixel.copy_from_slice(&[0xFF, r, g, b]);
            }
            let mut metadata = PixMapMetadata::argb(width, height);
            metadata.cmp_count = 3;
            metadata
        },
    };
    RasterImage::new(metadata, pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::binary::FourCc;

    fn header(image_type: u8, map: Option<(u16, u8)>, width: u16, height: u16, depth: u8) -> Vec<u8> {
        let mut data = vec![0, map.is_some() as u8, image_type];
        let (length, entry) = map.unwrap_or((0, 0));
        data.extend_from_slice(&0u16.to_le_bytes());
        data.extend_from_slice(&length.to_le_bytes());
        data.push(entry);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(&width.to_le_bytes());
        data.extend_from_slice(&height.to_le_bytes());
        data.push(depth);
        data.push(DESCRIPTOR_TOP_ORIGIN);
        data
    }

    fn desc(width: u16, height: u16) -> ImageDescription {
        ImageDescription::new(FourCc::new(b"tga "), width, height, 24)
    }

    #[test]
    fn test_header_size() {
        assert_eq!(HEADER_SIZE, 18);
    }

    #[test]
    fn test_truecolor_raw() {
        let mut data = header(2, None, 2, 1, 24);
        data.extend_from_slice(&[1, 2, 3, 4, 5, 6]);
        let image = decode(&data, &desc(2, 1)).unwrap();
        assert_eq!(image.data, vec![3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_truecolor_packed() {
        let mut data = header(10, None, 3, 1, 24);
        // Pixel repeated twice, then one literal pixel
        data.extend_from_slice(&[0xFF, 1, 2, 3, 0x00, 4, 5, 6]);
        let image = decode(&data, &desc(3, 1)).unwrap();
        assert_eq!(image.data, vec![3, 2, 1, 3, 2, 1, 6, 5, 4]);
    }

    #[test]
    fn test_packed_32_bit_pixels() {
        let mut data = header(10, None, 3, 1, 32);
        data.extend_from_slice(&[0x01, 1, 2, 3, 0, 4, 5, 6, 0, 0xFF, 7, 8, 9, 0]);
        let image = decode(&data, &desc(3, 1)).unwrap();
        assert_eq!(image.pixel_rgba(1, 0), Some([6, 5, 4, 0xFF]));
        assert_eq!(image.pixel_rgba(2, 0), Some([9, 8, 7, 0xFF]));
    }

    #[test]
    fn test_packed_color_mapped() {
        let mut data = header(9, Some((2, 24)), 4, 1, 8);
        data.extend_from_slice(&[0, 0, 255, 255, 0, 0]);
        data.extend_from_slice(&[0xFD, 1]);
        let image = decode(&data, &desc(4, 1)).unwrap();
        assert_eq!(image.data, vec![1; 4]);
        assert_eq!(image.pixel_rgba(3, 0), Some([0, 0, 255, 0xFF]));
    }

    #[test]
    fn test_sixteen_bit_swap() {
        let mut data = header(2, None, 1, 1, 16);
        data.extend_from_slice(&0x7C00u16.to_le_bytes());
        let image = decode(&data, &desc(1, 1)).unwrap();
        assert_eq!(image.data, vec![0x7C, 0x00]);
        assert_eq!(image.pixel_rgba(0, 0), Some([0xFF, 0, 0, 0xFF]));
    }

    #[test]
    fn test_color_mapped() {
        let mut data = header(1, Some((2, 24)), 2, 1, 8);
        data.extend_from_slice(&[0, 0, 255, 255, 0, 0]);
        data.extend_from_slice(&[1, 0]);
        let image = decode(&data, &desc(2, 1)).unwrap();
        assert_eq!(image.pixel_rgba(0, 0), Some([0, 0, 255, 0xFF]));
        assert_eq!(image.pixel_rgba(1, 0), Some([255, 0, 0, 0xFF]));
    }

    #[test]
    fn test_bottom_origin_rejected() {
        let mut data = header(2, None, 1, 1, 24);
        data[17] = 0;
        data.extend_from_slice(&[0, 0, 0]);
        assert!(matches!(decode(&data, &desc(1, 1)), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_alpha_bits_rejected() {
        let mut data = header(2, None, 1, 1, 32);
        data[17] |= 0x08;
        data.extend_from_slice(&[0, 0, 0, 0]);
        assert!(matches!(decode(&data, &desc(1, 1)), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_truncated_pixels() {
        let mut data = header(2, None, 2, 2, 24);
        data.extend_from_slice(&[0; 5]);
        assert!(decode(&data, &desc(2, 2)).is_err());
    }
}
