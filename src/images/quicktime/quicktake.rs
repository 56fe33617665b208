//! Apple QuickTake 100 (`qktk`) decoder
//!
//! The camera stores a 640x480 (or 320x240) Bayer mosaic, green/red over
//! blue/green, as 4-bit green and 2-bit red/blue prediction residuals. Green
//! is predicted from its upper and left neighbours; red and blue from their
//! same-colour neighbours, with a step table chosen by local gradient. A
//! sharpening pass and a response curve to 10 bits follow. The mosaic is
//! then collapsed to one chroma pair per 2x2 cell, dark luma is lifted and
//! the result converted to RGB.

use super::description::ImageDescription;
use super::yuv::yuv_to_rgb;
use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use crate::images::raster::{PixMapMetadata, RasterImage};

const FILE_MAGIC: &[u8; 4] = b"qktk";
const DIMENSIONS_OFFSET: usize = 544;

const GREEN_STEPS: [i32; 16] = [
    -89, -60, -44, -32, -22, -15, -8, -2, 2, 8, 15, 22, 32, 44, 60, 89,
];

const RED_BLUE_STEPS: [[i32; 4]; 6] = [
    [-3, -1, 1, 3],
    [-5, -1, 1, 5],
    [-8, -2, 2, 8],
    [-13, -3, 3, 13],
    [-19, -4, 4, 19],
    [-28, -6, 6, 28],
];

/// Sensor response, 8-bit code to 10-bit linear value
#[rustfmt::skip]
const RESPONSE_CURVE: [u16; 256] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27,
    28, 29, 30, 32, 33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48, 49, 50, 51, 53,
    54, 55, 56, 57, 58, 59, 60, 61, 62, 63, 64, 65, 66, 67, 68, 69, 70, 71, 72, 74, 75, 76, 77, 78,
    79, 80, 81, 82, 83, 84, 86, 88, 90, 92, 94, 97, 99, 101, 103, 105, 107, 110, 112, 114, 116,
    118, 120, 123, 125, 127, 129, 131, 134, 136, 138, 140, 142, 144, 147, 149, 151, 153, 155,
    158, 160, 162, 164, 166, 168, 171, 173, 175, 177, 179, 181, 184, 186, 188, 190, 192, 195,
    197, 199, 201, 203, 205, 208, 210, 212, 214, 216, 218, 221, 223, 226, 230, 235, 239, 244,
    248, 252, 257, 261, 265, 270, 274, 278, 283, 287, 291, 296, 300, 305, 309, 313, 318, 322,
    326, 331, 335, 339, 344, 348, 352, 357, 361, 365, 370, 374, 379, 383, 387, 392, 396, 400,
    405, 409, 413, 418, 422, 426, 431, 435, 440, 444, 448, 453, 457, 461, 466, 470, 474, 479,
    483, 487, 492, 496, 500, 508, 519, 531, 542, 553, 564, 575, 587, 598, 609, 620, 631, 643,
    654, 665, 676, 687, 698, 710, 721, 732, 743, 754, 766, 777, 788, 799, 810, 822, 833, 844,
    855, 866, 878, 889, 900, 911, 922, 933, 945, 956, 967, 978, 989, 1001, 1012, 1023,
];

/// Luma below this is lifted toward it
const SHADOW_LEVEL: i32 = 64;

/// Most-significant-first bit reader
struct BitReader<'a> {
    data: &'a [u8],
    bit: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, bit: 0 }
    }

    fn read(&mut self, count: usize) -> Result<usize> {
        let mut value = 0;
        for _ in 0..count {
            let byte = *self.data.get(self.bit / 8).ok_or(Error::Truncated {
                what: "QuickTake bitstream",
                expected: self.bit / 8 + 1,
                available: self.data.len(),
            })?;
            value = (value << 1) | ((byte >> (7 - self.bit % 8)) & 1) as usize;
            self.bit += 1;
        }
        Ok(value)
    }
}

/// Prediction grid with a two-sample margin on every side
struct Grid {
    stride: usize,
    cells: Vec<u8>,
}

impl Grid {
    fn new(width: usize, height: usize) -> Self {
        let stride = width + 4;
        Self {
            stride,
            cells: vec![0x80; stride * (height + 4)],
        }
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> i32 {
        self.cells[row * self.stride + col] as i32
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, value: i32) {
        self.cells[row * self.stride + col] = value.clamp(0, 255) as u8;
    }
}

/// Where the bitstream starts and the mosaic size
fn locate(data: &[u8], desc: &ImageDescription) -> Result<(usize, usize, usize)> {
    if !data.starts_with(FILE_MAGIC) {
        return Ok((0, desc.width as usize, desc.height as usize));
    }
    let mut reader = ByteReader::at(data, DIMENSIONS_OFFSET)?;
    let height = reader.read_u16()? as usize;
    let width = reader.read_u16()? as usize;
    let _ = reader.read_u32()?;
    let offset = if reader.read_u16()? == 30 { 738 } else { 736 };
    // Portrait files store the dimensions swapped
    let (width, height) = if height > width {
        (height, width)
    } else {
        (width, height)
    };
    Ok((offset, width, height))
}

/// Reconstruct the 10-bit mosaic, row-major, green at even `row + col`
pub fn decode_mosaic(bits: &[u8], width: usize, height: usize) -> Result<Vec<u16>> {
    if width < 4 || height < 4 || width % 2 != 0 || height % 2 != 0 {
        return Err(Error::InvalidFormat(format!(
            "QuickTake mosaic {}x{} must be even and at least 4x4",
            width, height
        )));
    }
    let mut bits = BitReader::new(bits);
    let mut grid = Grid::new(width, height);

    // Green
    for row in 2..height + 2 {
        let mut val = 0;
        let mut col = 2 + (row & 1);
        while col < width + 2 {
            val = ((grid.get(row - 1, col - 1) + 2 * grid.get(row - 1, col + 1) + grid.get(row, col - 2))
                >> 2)
                + GREEN_STEPS[bits.read(4)?];
            val = val.clamp(0, 255);
            grid.set(row, col, val);
            if col < 4 {
                grid.set(row, col - 2, val);
                grid.set(row + 1, !row & 1, val);
            }
            if row == 2 {
                grid.set(row - 1, col + 1, val);
                grid.set(row - 1, col + 3, val);
            }
            col += 2;
        }
        grid.set(row, col, val);
    }

    // Red and blue
    for phase in 0..2 {
        let mut row = 2 + phase;
        while row < height + 2 {
            let mut col = 3 - (row & 1);
            while col < width + 2 {
                let sharpness = if row < 4 || col < 4 {
                    2
                } else {
                    let up = grid.get(row - 2, col);
                    let left = grid.get(row, col - 2);
                    let diag = grid.get(row - 2, col - 2);
                    let gradient = (up - left).abs() + (up - diag).abs() + (left - diag).abs();
                    match gradient {
                        0..4 => 0,
                        4..8 => 1,
                        8..16 => 2,
                        16..32 => 3,
                        32..48 => 4,
                        _ => 5,
                    }
                };
                let val = ((grid.get(row - 2, col) + grid.get(row, col - 2)) >> 1)
                    + RED_BLUE_STEPS[sharpness][bits.read(2)?];
                grid.set(row, col, val);
                let val = grid.get(row, col);
                if row < 4 {
                    grid.set(row - 2, col + 2, val);
                }
                if col < 4 {
                    grid.set(row + 2, col - 2, val);
                }
                col += 2;
            }
            row += 2;
        }
    }

    // Sharpen red and blue against their green neighbours
    for row in 2..height + 2 {
        let mut col = 3 - (row & 1);
        while col < width + 2 {
            let val = ((grid.get(row, col - 1) + (grid.get(row, col) << 2) + grid.get(row, col + 1)) >> 1)
                - 0x100;
            grid.set(row, col, val);
            col += 2;
        }
    }

    let mut mosaic = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            mosaic.push(RESPONSE_CURVE[grid.get(row + 2, col + 2) as usize]);
        }
    }
    Ok(mosaic)
}

/// Lift dark luma values, leaving the rest untouched
#[inline]
fn shadow_boost(y: i32) -> i32 {
    if y < SHADOW_LEVEL {
        y + (SHADOW_LEVEL - y) * y / (2 * SHADOW_LEVEL)
    } else {
        y
    }
}

/// Collapse the mosaic to YUV 4:2:0 per 2x2 cell and convert to RGB
pub fn mosaic_to_rgb(mosaic: &[u16], width: usize, height: usize) -> Vec<u8> {
    let sample = |row: usize, col: usize| (mosaic[row * width + col] >> 2) as i32;
    let mut pixels = vec![0u8; width * height * 3];
    for cell_row in (0..height).step_by(2) {
        for cell_col in (0..width).step_by(2) {
            // G R / B G
            let g0 = sample(cell_row, cell_col);
            let r = sample(cell_row, cell_col + 1);
            let b = sample(cell_row + 1, cell_col);
            let g1 = sample(cell_row + 1, cell_col + 1);

            let luma = |g: i32| (19_595 * r + 38_470 * g + 7_471 * b) >> 16;
            let cell_luma = luma((g0 + g1) / 2);
            let u = ((b - cell_luma) * 36_962) >> 16;
            let v = ((r - cell_luma) * 46_727) >> 16;

            let positions = [
                (cell_row, cell_col, g0),
                (cell_row, cell_col + 1, (g0 + g1) / 2),
                (cell_row + 1, cell_col, (g0 + g1) / 2),
                (cell_row + 1, cell_col + 1, g1),
            ];
            for (row, col, g) in positions {
                let y = shadow_boost(luma(g));
                let offset = (row * width + col) * 3;
                pixels[offset..offset + 3].copy_from_slice(&yuv_to_rgb(y, u, v));
            }
        }
    }
    pixels
}

/// Decode a QuickTake 100 image to 24-bit RGB
pub fn decode(data: &[u8], desc: &ImageDescription) -> Result<RasterImage> {
    let (offset, width, height) = locate(data, desc)?;
    desc.check_dimensions(width as u32, height as u32)?;
    let bits = data.get(offset..).ok_or(Error::OutOfBounds {
        offset,
        requested: 0,
        available: data.len(),
    })?;
    let mosaic = decode_mosaic(bits, width, height)?;
    let pixels = mosaic_to_rgb(&mosaic, width, height);
    RasterImage::new(PixMapMetadata::rgb(width as u32, height as u32), pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::binary::FourCc;

    #[test]
    fn test_curve_is_monotonic() {
        assert!(RESPONSE_CURVE.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(RESPONSE_CURVE[255], 1023);
    }

    #[test]
    fn test_bit_reader() {
        let mut bits = BitReader::new(&[0b1011_0010]);
        assert_eq!(bits.read(4).unwrap(), 0b1011);
        assert_eq!(bits.read(2).unwrap(), 0b00);
        assert_eq!(bits.read(2).unwrap(), 0b10);
        assert!(bits.read(1).is_err());
    }

    #[test]
    fn test_shadow_boost() {
        assert_eq!(shadow_boost(0), 0);
        assert_eq!(shadow_boost(32), 40);
        assert_eq!(shadow_boost(64), 64);
        assert_eq!(shadow_boost(200), 200);
    }

    #[test]
    fn test_gray_mosaic_stays_gray() {
        let mosaic = vec![512u16; 16];
        let pixels = mosaic_to_rgb(&mosaic, 4, 4);
        assert!(pixels.chunks(3).all(|p| p[0] == p[1] && p[1] == p[2]));
        assert!(pixels.iter().all(|&v| v == 128));
    }

    #[test]
    fn test_decode_dimensions() {
        // 4x4 needs 8 green nibbles and 8 red/blue pairs: 6 bytes
        let desc = ImageDescription::new(FourCc::new(b"qktk"), 4, 4, 24);
        let image = decode(&[0x77; 6], &desc).unwrap();
        assert_eq!((image.width(), image.height()), (4, 4));
        assert_eq!(image.data.len(), 48);
        assert!(decode(&[0x77; 5], &desc).is_err());
    }

    #[test]
    fn test_odd_dimensions_rejected() {
        let desc = ImageDescription::new(FourCc::new(b"qktk"), 5, 4, 24);
        assert!(decode(&[0; 64], &desc).is_err());
    }

    #[test]
    fn test_file_header() {
        let mut data = vec![0u8; 736 + 6];
        data[..4].copy_from_slice(FILE_MAGIC);
        data[544..546].copy_from_slice(&4u16.to_be_bytes());
        data[546..548].copy_from_slice(&4u16.to_be_bytes());
        let desc = ImageDescription::new(FourCc::new(b"qktk"), 4, 4, 24);
        assert_eq!(locate(&data, &desc).unwrap(), (736, 4, 4));
        assert!(decode(&data, &desc).is_ok());
    }
}
