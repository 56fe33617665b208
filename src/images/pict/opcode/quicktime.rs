// QuickTime opcodes (0x8200 compressed, 0x8201 uncompressed)
//
// Both start with a 32-bit length covering the rest of the opcode, so a
// damaged body never desynchronises the picture stream.

use crate::common::binary::ByteReader;
use crate::common::error::Result;
use crate::common::fixed::FixedPoint;
use crate::images::pict::region::Region;
use crate::images::pict::types::Rect;
use crate::images::quicktime::{self, ImageDescription, QuickTimeImage};

/// Embedded QuickTime image
#[derive(Debug, Clone, PartialEq)]
pub struct QuickTimeOpcode {
    pub version: u16,
    /// 3x3 transformation matrix, row major
    pub matrix: [FixedPoint; 9],
    pub matte_rect: Rect,
    pub payload: QuickTimePayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum QuickTimePayload {
    Compressed {
        /// Transfer mode
        mode: u16,
        src_rect: Rect,
        accuracy: u32,
        mask: Option<Region>,
        description: ImageDescription,
        image: QuickTimeImage,
    },
    /// Header only; the body is skipped
    Uncompressed { body_len: usize },
}

impl QuickTimeOpcode {
    /// Read 0x8200 (`compressed`) or 0x8201
    pub fn read(compressed: bool, reader: &mut ByteReader<'_>, decode_images: bool) -> Result<Self> {
        let length = reader.read_u32()? as usize;
        let mut body = reader.sub_reader(length)?;

        let version = body.read_u16()?;
        let mut matrix = [FixedPoint::ZERO; 9];
        for value in matrix.iter_mut() {
            *value = body.read_fixed()?;
        }
        let matte_size = body.read_u32()? as usize;
        let matte_rect = Rect::read(&mut body)?;

        if !compressed {
            return Ok(Self {
                version,
                matrix,
                matte_rect,
                payload: QuickTimePayload::Uncompressed {
                    body_len: body.remaining(),
                },
            });
        }

        let mode = body.read_u16()?;
        let src_rect = Rect::read(&mut body)?;
        let accuracy = body.read_u32()?;
        let mask_size = body.read_u32()? as usize;
        // Matte description and data are not used
        body.skip(matte_size)?;
        let mask = if mask_size > 0 {
            Some(Region::read(&mut body.sub_reader(mask_size)?)?)
        } else {
            None
        };

        let description = ImageDescription::read(&mut body)?;
        let declared = description.data_size as usize;
        let data = if declared > 0 && declared <= body.remaining() {
            body.read_bytes(declared)?
        } else {
            body.rest()
        };
        log::debug!(
            "QuickTime '{}' {}x{} depth {}, {} bytes",
            description.codec,
            description.width,
            description.height,
            description.depth,
            data.len()
        );
        let image = quicktime::decode_payload(&description, data, decode_images);

        Ok(Self {
            version,
            matrix,
            matte_rect,
            payload: QuickTimePayload::Compressed {
                mode,
                src_rect,
                accuracy,
                mask,
                description,
                image,
            },
        })
    }

    /// Decoded or passed-through image, if any
    pub fn image(&self) -> Option<&QuickTimeImage> {
        match &self.payload {
            QuickTimePayload::Compressed { image, .. } => Some(image),
            QuickTimePayload::Uncompressed { .. } => None,
        }
    }
}
