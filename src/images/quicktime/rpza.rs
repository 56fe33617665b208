//! Apple Video / Road Pizza (`rpza`) decoder
//!
//! 16-bit RGB555 images coded in 4x4 blocks. Each opcode byte selects one of
//! skip, solid fill, four-colour (two endpoints plus two interpolated) or
//! sixteen raw colours, for a run of up to 32 blocks.

use super::blocks::BlockPixMap;
use super::description::ImageDescription;
use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use crate::images::raster::{PixMapMetadata, RasterImage};

const CHUNK_MARKER: u8 = 0xE1;

/// Opcode classes, by the top three bits
mod opcode {
    pub const SIXTEEN_COLORS: u8 = 0x00;
    pub const FOUR_COLORS_WITH_A: u8 = 0x20;
    pub const SKIP: u8 = 0x80;
    pub const FILL: u8 = 0xA0;
    pub const FOUR_COLORS: u8 = 0xC0;
}

/// Four-colour palette from the two endpoints
///
/// Index 0 is `b`, index 3 is `a`; the middle entries interpolate each 5-bit
/// component at roughly one and two thirds.
pub fn four_colors(a: u16, b: u16) -> [u16; 4] {
    let mix = |wa: u16, wb: u16| {
        let mut out = 0u16;
        for shift in [10, 5, 0] {
            let ca = (a >> shift) & 0x1F;
            let cb = (b >> shift) & 0x1F;
            out |= (((wa * ca + wb * cb) >> 5) & 0x1F) << shift;
        }
        out
    };
    [b, mix(11, 21), mix(21, 11), a]
}

fn paint_four_colors(
    pixmap: &mut BlockPixMap,
    reader: &mut ByteReader<'_>,
    block: usize,
    colors: &[u16; 4],
) -> Result<()> {
    for line in 0..4 {
        let indices = reader.read_u8()?;
        let row = pixmap.line_mut(block, line)?;
        for (col, pixel) in row.chunks_exact_mut(2).enumerate() {
            let index = (indices >> (6 - col * 2)) & 0x03;
            pixel.copy_from_slice(&colors[index as usize].to_be_bytes());
        }
    }
    Ok(())
}

/// Decode one Road Pizza frame into RGB555
pub fn decode(data: &[u8], desc: &ImageDescription) -> Result<RasterImage> {
    let mut reader = ByteReader::new(data);
    let marker = reader.read_u8()?;
    if marker != CHUNK_MARKER {
        return Err(Error::InvalidFormat(format!(
            "rpza chunk marker 0x{:02X}, expected 0x{:02X}",
            marker, CHUNK_MARKER
        )));
    }
    let chunk_size = reader.read_u24()? as usize;
    if chunk_size != data.len() {
        log::debug!("rpza chunk size {} differs from payload size {}", chunk_size, data.len());
    }
    let mut reader = ByteReader::new(&data[..chunk_size.clamp(4, data.len())]);
    reader.skip(4)?;

    let width = desc.width as u32;
    let height = desc.height as u32;
    let mut pixmap = BlockPixMap::new(width, height, 4, 2)?;
    let total = pixmap.block_count();
    let mut block = 0;

    while block < total && !reader.at_end() {
        let offset = reader.position();
        let mut op = reader.read_u8()?;
        let mut run = (op & 0x1F) as usize + 1;
        let mut color_a = 0u16;

        if op & 0x80 == 0 {
            color_a = u16::from_be_bytes([op, reader.read_u8()?]);
            op = opcode::SIXTEEN_COLORS;
            if reader.peek_u8()? & 0x80 != 0 {
                op = opcode::FOUR_COLORS_WITH_A;
                run = 1;
            }
        }
        let run = run.min(total - block);

        match op & 0xE0 {
            opcode::SKIP => block += run,
            opcode::FILL => {
                let color = reader.read_u16()?.to_be_bytes();
                for _ in 0..run {
                    pixmap.fill_block(block, &color)?;
                    block += 1;
                }
            },
            class @ (opcode::FOUR_COLORS | opcode::FOUR_COLORS_WITH_A) => {
                if class == opcode::FOUR_COLORS {
                    color_a = reader.read_u16()?;
                }
                let color_b = reader.read_u16()?;
                let colors = four_colors(color_a, color_b);
                for _ in 0..run {
                    paint_four_colors(&mut pixmap, &mut reader, block, &colors)?;
                    block += 1;
                }
            },
            opcode::SIXTEEN_COLORS => {
                for line in 0..4 {
                    for col in 0..4 {
                        if line != 0 || col != 0 {
                            color_a = reader.read_u16()?;
                        }
                        let row = pixmap.line_mut(block, line)?;
                        row[col * 2..col * 2 + 2].copy_from_slice(&color_a.to_be_bytes());
                    }
                }
                block += 1;
            },
            _ => {
                return Err(Error::UnknownSubOpcode {
                    codec: "rpza",
                    opcode: op,
                    offset,
                });
            },
        }
    }

    pixmap.into_raster(PixMapMetadata::rgb555(width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::binary::FourCc;

    fn chunk(body: &[u8]) -> Vec<u8> {
        let mut data = vec![CHUNK_MARKER];
        data.extend_from_slice(&((body.len() + 4) as u32).to_be_bytes()[1..]);
        data.extend_from_slice(body);
        data
    }

    fn desc(width: u16, height: u16) -> ImageDescription {
        ImageDescription::new(FourCc::new(b"rpza"), width, height, 16)
    }

    fn pixel(image: &RasterImage, x: u32, y: u32) -> u16 {
        let row = image.row(y).unwrap();
        u16::from_be_bytes([row[x as usize * 2], row[x as usize * 2 + 1]])
    }

    #[test]
    fn test_four_color_endpoints() {
        let colors = four_colors(0x7FFF, 0x0000);
        assert_eq!(colors[0], 0x0000);
        assert_eq!(colors[3], 0x7FFF);
        // (11 * 31) >> 5 = 10, (21 * 31) >> 5 = 20 per component
        assert_eq!(colors[1], (10 << 10) | (10 << 5) | 10);
        assert_eq!(colors[2], (20 << 10) | (20 << 5) | 20);
    }

    #[test]
    fn test_fill_and_skip() {
        // Fill one block red, skip one, fill one
        let data = chunk(&[0xA0, 0x7C, 0x00, 0x80, 0xA0, 0x03, 0xE0]);
        let image = decode(&data, &desc(12, 4)).unwrap();
        assert_eq!(pixel(&image, 0, 0), 0x7C00);
        assert_eq!(pixel(&image, 4, 0), 0x0000);
        assert_eq!(pixel(&image, 11, 3), 0x03E0);
    }

    #[test]
    fn test_four_color_block() {
        // A = white, B = black; rows alternate index 0 and index 3
        let data = chunk(&[0xC0, 0x7F, 0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00, 0xFF]);
        let image = decode(&data, &desc(4, 4)).unwrap();
        assert_eq!(pixel(&image, 0, 0), 0x0000);
        assert_eq!(pixel(&image, 3, 1), 0x7FFF);
        assert_eq!(pixel(&image, 2, 2), 0x0000);
    }

    #[test]
    fn test_color_a_from_opcode_byte() {
        // Top bit clear: colour A is 0x7FFF, next byte has its top bit set,
        // so colour B and one four-colour block follow
        let data = chunk(&[0x7F, 0xFF, 0x80, 0x00, 0xFF, 0xFF, 0xFF, 0xFF]);
        let image = decode(&data, &desc(4, 4)).unwrap();
        assert_eq!(pixel(&image, 0, 0), 0x7FFF);
        assert_eq!(pixel(&image, 3, 3), 0x7FFF);
    }

    #[test]
    fn test_sixteen_colors() {
        let mut body = vec![0x00, 0x01];
        for i in 1..16u16 {
            body.extend_from_slice(&(i + 1).to_be_bytes());
        }
        let image = decode(&chunk(&body), &desc(4, 4)).unwrap();
        assert_eq!(pixel(&image, 0, 0), 1);
        assert_eq!(pixel(&image, 1, 0), 2);
        assert_eq!(pixel(&image, 3, 3), 16);
    }

    #[test]
    fn test_unknown_opcode() {
        let data = chunk(&[0xE0, 0x00]);
        assert!(matches!(
            decode(&data, &desc(4, 4)),
            Err(Error::UnknownSubOpcode { codec: "rpza", opcode: 0xE0, .. })
        ));
    }

    #[test]
    fn test_bad_marker() {
        assert!(matches!(
            decode(&[0xE2, 0, 0, 4], &desc(4, 4)),
            Err(Error::InvalidFormat(_))
        ));
    }
}
