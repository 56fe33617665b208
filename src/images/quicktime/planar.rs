//! Planar RGB (`8BPS`) decoder
//!
//! Each channel is stored as its own plane of PackBits-compressed rows. A
//! table of big-endian row lengths for every plane precedes the data.
//! Planes are red, green, blue and, for 32-bit images, alpha.

use super::description::ImageDescription;
use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use crate::images::pict::data::unpack_bits;
use crate::images::raster::{PixMapMetadata, RasterImage};

/// Decode an 8BPS frame
pub fn decode(data: &[u8], desc: &ImageDescription) -> Result<RasterImage> {
    let width = desc.width as usize;
    let height = desc.height as usize;
    let bits = desc.bits_per_pixel();
    let planes = match bits {
        8 => 1,
        24 => 3,
        32 => 4,
        other => return Err(Error::UnsupportedDepth(other)),
    };

    let mut reader = ByteReader::new(data);
    let mut lengths = Vec::with_capacity(planes * height);
    for _ in 0..planes * height {
        lengths.push(reader.read_u16()? as usize);
    }

    // Output channel for each stored plane: ARGB puts alpha first
    let channel_of = |plane: usize| -> usize {
        match planes {
            4 => (plane + 1) % 4,
            _ => plane,
        }
    };

    let mut pixels = vec![0u8; width * height * planes];
    for plane in 0..planes {
        let channel = channel_of(plane);
        for row in 0..height {
            let packed = reader.read_bytes(lengths[plane * height + row])?;
            let unpacked = unpack_bits(packed, width)?;
            let start = row * width * planes;
            for (x, &value) in unpacked.iter().enumerate() {
                pixels[start + x * planes + channel] = value;
            }
        }
    }

    let w = width as u32;
    let h = height as u32;
    let metadata = match planes {
        1 => PixMapMetadata::indexed(w, h, 8, desc.palette()?),
        3 => PixMapMetadata::rgb(w, h),
        _ => PixMapMetadata::argb(w, h),
    };
    RasterImage::new(metadata, pixels)
}
