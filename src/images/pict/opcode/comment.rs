// Picture comments (0xA0 short, 0xA1 long)
//
// Comments carry printer and application hints. Kinds follow Apple
// Technical Note 91, "Picture Comments".

use crate::common::binary::{ByteReader, FourCc, decode_mac_roman};
use crate::common::error::Result;
use crate::common::fixed::FixedPoint;
use crate::images::pict::types::Delta;
use bitflags::bitflags;

/// Comment kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommentKind {
    ApplicationComment,
    DrawingBegin,
    DrawingEnd,
    GroupBegin,
    GroupEnd,
    BitmapBegin,
    BitmapEnd,
    TextBegin,
    TextEnd,
    StringBegin,
    StringEnd,
    TextCenter,
    LineLayoutOff,
    LineLayoutOn,
    PolyBegin,
    PolyEnd,
    PolyIgnore,
    PolySmooth,
    PolyClose,
    DashedLine,
    DashedStop,
    SetLineWidth,
    PostScriptBegin,
    PostScriptEnd,
    PostScriptHandle,
    PostScriptFile,
    TextIsPostScript,
    ResourcePostScript,
    PostScriptBeginNoSave,
    RotateBegin,
    RotateEnd,
    RotateCenter,
    Unknown(u16),
}

impl CommentKind {
    pub fn from_u16(kind: u16) -> Self {
        match kind {
            100 => Self::ApplicationComment,
            130 => Self::DrawingBegin,
            131 => Self::DrawingEnd,
            140 => Self::GroupBegin,
            141 => Self::GroupEnd,
            142 => Self::BitmapBegin,
            143 => Self::BitmapEnd,
            150 => Self::TextBegin,
            151 => Self::TextEnd,
            152 => Self::StringBegin,
            153 => Self::StringEnd,
            154 => Self::TextCenter,
            155 => Self::LineLayoutOff,
            156 => Self::LineLayoutOn,
            160 => Self::PolyBegin,
            161 => Self::PolyEnd,
            163 => Self::PolyIgnore,
            164 => Self::PolySmooth,
            165 => Self::PolyClose,
            180 => Self::DashedLine,
            181 => Self::DashedStop,
            182 => Self::SetLineWidth,
            190 => Self::PostScriptBegin,
            191 => Self::PostScriptEnd,
            192 => Self::PostScriptHandle,
            193 => Self::PostScriptFile,
            194 => Self::TextIsPostScript,
            195 => Self::ResourcePostScript,
            196 => Self::PostScriptBeginNoSave,
            200 => Self::RotateBegin,
            201 => Self::RotateEnd,
            202 => Self::RotateCenter,
            other => Self::Unknown(other),
        }
    }
}

bitflags! {
    /// Flags of the polygon smoothing comment
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PolySmoothFlags: u8 {
        const CLOSE = 0x01;
        const FILL = 0x02;
        const FRAME = 0x04;
    }
}

/// Decoded comment data
#[derive(Debug, Clone, PartialEq)]
pub enum CommentPayload {
    None,
    /// PostScript source text
    PostScript(String),
    /// Offset from the text origin to the rotation centre
    TextCenter(Delta),
    PolySmooth(PolySmoothFlags),
    /// Pen width as a ratio
    LineWidth(FixedPoint),
    Dashed {
        offset: u8,
        centered: bool,
        dashes: Vec<u8>,
    },
    Rotation {
        flipped: bool,
        angle: i16,
    },
    RotationCenter(Delta),
    Application {
        signature: FourCc,
        data: Vec<u8>,
    },
    Raw(Vec<u8>),
}

/// A short or long comment
#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub kind: CommentKind,
    pub payload: CommentPayload,
}

impl Comment {
    /// Short comment: kind only
    pub fn read_short(reader: &mut ByteReader<'_>) -> Result<Self> {
        Ok(Self {
            kind: CommentKind::from_u16(reader.read_u16()?),
            payload: CommentPayload::None,
        })
    }

    /// Long comment: kind, byte count, data
    pub fn read_long(reader: &mut ByteReader<'_>) -> Result<Self> {
        let kind = CommentKind::from_u16(reader.read_u16()?);
        let size = reader.read_u16()? as usize;
        let data = reader.read_bytes(size)?;
        let payload = match parse_payload(kind, data) {
            Ok(payload) => payload,
            Err(e) => {
                // A malformed hint should not stop the picture
                log::debug!("comment {:?} payload not decoded: {}", kind, e);
                CommentPayload::Raw(data.to_vec())
            },
        };
        Ok(Self { kind, payload })
    }
}

fn parse_payload(kind: CommentKind, data: &[u8]) -> Result<CommentPayload> {
    let mut reader = ByteReader::new(data);
    let payload = match kind {
        _ if data.is_empty() => CommentPayload::None,
        CommentKind::PostScriptHandle | CommentKind::PostScriptFile | CommentKind::ResourcePostScript => {
            CommentPayload::PostScript(decode_mac_roman(data))
        },
        CommentKind::TextCenter => {
            let dv = reader.read_fixed()?;
            let dh = reader.read_fixed()?;
            CommentPayload::TextCenter(Delta { dh, dv })
        },
        CommentKind::PolySmooth => {
            CommentPayload::PolySmooth(PolySmoothFlags::from_bits_truncate(reader.read_u8()?))
        },
        CommentKind::SetLineWidth => {
            let v = reader.read_i16()?;
            let h = reader.read_i16()?;
            CommentPayload::LineWidth(FixedPoint::from_ratio(h, v))
        },
        CommentKind::DashedLine => {
            let offset = reader.read_u8()?;
            let centered = reader.read_u8()? != 0;
            let count = reader.read_u8()? as usize;
            CommentPayload::Dashed {
                offset,
                centered,
                dashes: reader.read_vec(count)?,
            }
        },
        CommentKind::RotateBegin => CommentPayload::Rotation {
            flipped: reader.read_u16()? != 0,
            angle: reader.read_i16()?,
        },
        CommentKind::RotateCenter => {
            let dv = reader.read_fixed()?;
            let dh = reader.read_fixed()?;
            CommentPayload::RotationCenter(Delta { dh, dv })
        },
        CommentKind::ApplicationComment => CommentPayload::Application {
            signature: reader.read_four_cc()?,
            data: reader.rest().to_vec(),
        },
        _ => CommentPayload::Raw(data.to_vec()),
    };
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_comment(kind: u16, data: &[u8]) -> Comment {
        let mut bytes = kind.to_be_bytes().to_vec();
        bytes.extend_from_slice(&(data.len() as u16).to_be_bytes());
        bytes.extend_from_slice(data);
        Comment::read_long(&mut ByteReader::new(&bytes)).unwrap()
    }

    #[test]
    fn test_short_comment() {
        let comment = Comment::read_short(&mut ByteReader::new(&[0, 190])).unwrap();
        assert_eq!(comment.kind, CommentKind::PostScriptBegin);
        assert_eq!(comment.payload, CommentPayload::None);
    }

    #[test]
    fn test_postscript_text() {
        let comment = long_comment(192, b"newpath");
        assert_eq!(comment.payload, CommentPayload::PostScript("newpath".into()));
    }

    #[test]
    fn test_line_width_ratio() {
        let comment = long_comment(182, &[0, 2, 0, 3]);
        assert_eq!(
            comment.payload,
            CommentPayload::LineWidth(FixedPoint::from_ratio(3, 2))
        );
    }

    #[test]
    fn test_application_comment() {
        let comment = long_comment(100, b"drw2\x01\x02");
        assert_eq!(
            comment.payload,
            CommentPayload::Application {
                signature: FourCc::new(b"drw2"),
                data: vec![1, 2]
            }
        );
    }

    #[test]
    fn test_malformed_payload_kept_raw() {
        let comment = long_comment(154, &[0, 1]);
        assert_eq!(comment.kind, CommentKind::TextCenter);
        assert_eq!(comment.payload, CommentPayload::Raw(vec![0, 1]));
    }

    #[test]
    fn test_unknown_kind() {
        let comment = long_comment(999, &[7]);
        assert_eq!(comment.kind, CommentKind::Unknown(999));
        assert_eq!(comment.payload, CommentPayload::Raw(vec![7]));
    }
}
