//! Uncompressed QuickTime (`raw `) images

use super::description::ImageDescription;
use crate::common::error::{Error, Result};
use crate::images::raster::{PixMapMetadata, RasterImage};

/// Wrap raw rows in metadata for the declared depth
///
/// Rows may be padded; the stride is taken from the payload size when it
/// divides evenly and is at least the packed row length.
pub fn decode(data: &[u8], desc: &ImageDescription) -> Result<RasterImage> {
    let width = desc.width as u32;
    let height = desc.height as u32;
    if height == 0 {
        return Err(Error::DimensionMismatch {
            expected: (width, height),
            actual: (width, 0),
        });
    }
    let bits = desc.bits_per_pixel();
    let mut metadata = match bits {
        1 | 2 | 4 | 8 => PixMapMetadata::indexed(width, height, bits, desc.palette()?),
        16 => PixMapMetadata::rgb555(width, height),
        24 => PixMapMetadata::rgb(width, height),
        32 => PixMapMetadata::argb(width, height),
        other => return Err(Error::UnsupportedDepth(other)),
    };

    let packed = metadata.row_bytes;
    let stride = data.len() / height as usize;
    if data.len() % height as usize == 0 && stride > packed {
        metadata = metadata.with_row_bytes(stride);
    }
    let len = metadata.required_len();
    if data.len() < len {
        return Err(Error::Truncated {
            what: "raw pixel rows",
            expected: len,
            available: data.len(),
        });
    }
    RasterImage::new(metadata, data[..len].to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::binary::FourCc;

    #[test]
    fn test_rgb_rows() {
        let desc = ImageDescription::new(FourCc::new(b"raw "), 2, 2, 24);
        let image = decode(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12], &desc).unwrap();
        assert_eq!(image.metadata.row_bytes, 6);
        assert_eq!(image.pixel_rgba(1, 1), Some([10, 11, 12, 0xFF]));
    }

    #[test]
    fn test_padded_rows() {
        let desc = ImageDescription::new(FourCc::new(b"raw "), 3, 2, 8);
        let image = decode(&[0, 1, 2, 0, 3, 4, 5, 0], &desc).unwrap();
        assert_eq!(image.metadata.row_bytes, 4);
        assert_eq!(image.row(1).unwrap()[0], 3);
    }

    #[test]
    fn test_short_payload() {
        let desc = ImageDescription::new(FourCc::new(b"raw "), 4, 4, 32);
        assert!(matches!(decode(&[0; 10], &desc), Err(Error::Truncated { .. })));
    }
}
