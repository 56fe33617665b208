//! YUV codecs: Intel Raw (`YVU9`) and the packed 4:2:2 `yuv2` / `2vuy`
//!
//! All three convert with the same integer BT.601 coefficients and differ
//! in sample layout, chroma subsampling, and whether chroma bytes are
//! signed or biased by 128.

use super::description::ImageDescription;
use crate::common::error::{Error, Result};
use crate::images::raster::{PixMapMetadata, RasterImage};

/// Convert one sample with centred chroma (`u`, `v` in -128..=127)
#[inline]
pub fn yuv_to_rgb(y: i32, u: i32, v: i32) -> [u8; 3] {
    // 16.16 fixed-point: 1.402, 0.344136, 0.714136, 1.772
    let r = y + ((91_881 * v) >> 16);
    let g = y - ((22_554 * u + 46_802 * v) >> 16);
    let b = y + ((116_130 * u) >> 16);
    [r.clamp(0, 255) as u8, g.clamp(0, 255) as u8, b.clamp(0, 255) as u8]
}

fn require(data: &[u8], needed: usize, what: &'static str) -> Result<()> {
    if data.len() < needed {
        return Err(Error::Truncated {
            what,
            expected: needed,
            available: data.len(),
        });
    }
    Ok(())
}

/// Intel Raw YUV9: a full luma plane, then V and U planes subsampled 4x4
pub fn decode_yvu9(data: &[u8], desc: &ImageDescription) -> Result<RasterImage> {
    let width = desc.width as usize;
    let height = desc.height as usize;
    let chroma_width = width.div_ceil(4);
    let chroma_height = height.div_ceil(4);
    let luma_len = width * height;
    let chroma_len = chroma_width * chroma_height;
    require(data, luma_len + 2 * chroma_len, "YVU9 planes")?;

    let (luma, chroma) = data.split_at(luma_len);
    let (v_plane, rest) = chroma.split_at(chroma_len);
    let u_plane = &rest[..chroma_len];

    let mut pixels = Vec::with_capacity(luma_len * 3);
    for y in 0..height {
        let chroma_row = (y / 4) * chroma_width;
        for x in 0..width {
            let c = chroma_row + x / 4;
            pixels.extend_from_slice(&yuv_to_rgb(
                luma[y * width + x] as i32,
                u_plane[c] as i32 - 128,
                v_plane[c] as i32 - 128,
            ));
        }
    }
    RasterImage::new(PixMapMetadata::rgb(width as u32, height as u32), pixels)
}

/// Packed 4:2:2 layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackedYuv {
    /// `Y0 U Y1 V` with signed chroma (`yuv2`)
    Yuv2,
    /// `U Y0 V Y1` with chroma biased by 128 (`2vuy`)
    Vuy2,
}

/// Decode a packed 4:2:2 frame; each 4-byte group covers two pixels
pub fn decode_packed(data: &[u8], desc: &ImageDescription, layout: PackedYuv) -> Result<RasterImage> {
    let width = desc.width as usize;
    let height = desc.height as usize;
    let row_len = width.div_ceil(2) * 4;
    require(data, row_len * height, "packed YUV rows")?;

    let mut pixels = Vec::with_capacity(width * height * 3);
    for row in data.chunks_exact(row_len).take(height) {
        for (pair, group) in row.chunks_exact(4).enumerate() {
            let (y0, y1, u, v) = match layout {
                PackedYuv::Yuv2 => (group[0], group[2], group[1] as i8 as i32, group[3] as i8 as i32),
                PackedYuv::Vuy2 => (group[1], group[3], group[0] as i32 - 128, group[2] as i32 - 128),
            };
            pixels.extend_from_slice(&yuv_to_rgb(y0 as i32, u, v));
            if pair * 2 + 1 < width {
                pixels.extend_from_slice(&yuv_to_rgb(y1 as i32, u, v));
            }
        }
    }
    RasterImage::new(PixMapMetadata::rgb(width as u32, height as u32), pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::binary::FourCc;

    #[test]
    fn test_neutral_chroma_is_gray() {
        assert_eq!(yuv_to_rgb(0, 0, 0), [0, 0, 0]);
        assert_eq!(yuv_to_rgb(128, 0, 0), [128, 128, 128]);
        assert_eq!(yuv_to_rgb(255, 0, 0), [255, 255, 255]);
    }

    #[test]
    fn test_strong_chroma_clamps() {
        let [r, _, b] = yuv_to_rgb(200, 127, 127);
        assert_eq!(r, 255);
        assert_eq!(b, 255);
        let [_, g, _] = yuv_to_rgb(20, 127, 127);
        assert_eq!(g, 0);
    }

    #[test]
    fn test_yvu9_planes() {
        let desc = ImageDescription::new(FourCc::new(b"YVU9"), 4, 4, 24);
        let mut data = vec![100u8; 16];
        data.push(128); // V
        data.push(128); // U
        let image = decode_yvu9(&data, &desc).unwrap();
        assert_eq!(image.data.len(), 48);
        assert!(image.data.iter().all(|&b| b == 100));
        assert!(decode_yvu9(&data[..17], &desc).is_err());
    }

    #[test]
    fn test_yuv2_signed_chroma() {
        let desc = ImageDescription::new(FourCc::new(b"yuv2"), 2, 1, 24);
        let image = decode_packed(&[50, 0, 60, 0], &desc, PackedYuv::Yuv2).unwrap();
        assert_eq!(image.data, vec![50, 50, 50, 60, 60, 60]);
    }

    #[test]
    fn test_2vuy_biased_chroma() {
        let desc = ImageDescription::new(FourCc::new(b"2vuy"), 3, 1, 24);
        let data = [128, 10, 128, 20, 128, 30, 128, 40];
        let image = decode_packed(&data, &desc, PackedYuv::Vuy2).unwrap();
        // Odd width: the last group contributes one pixel
        assert_eq!(image.data, vec![10, 10, 10, 20, 20, 20, 30, 30, 30]);
    }
}
