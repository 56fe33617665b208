// PICT opcodes
//
// `catalog::lookup` turns an opcode number into an `OpcodeKind` carrying
// the opcode's static parameters. `Opcode::read` then reads the payload and
// returns a self-contained value; nothing here refers back to the reader or
// to the picture being built.
//
// Reference: Inside Macintosh: Imaging With QuickDraw, Appendix A

pub mod bits;
pub mod catalog;
pub mod comment;
pub mod quicktime;
pub mod shapes;

pub use bits::{BitsKind, BitsOpcode, PixMapHeader, PixPattern, PixPatternFill};
pub use catalog::{OpcodeKind, ReservedLength, lookup};
pub use comment::{Comment, CommentKind, CommentPayload};
pub use quicktime::{QuickTimeOpcode, QuickTimePayload};
pub use shapes::{Geometry, ShapeKind, Verb};

use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use crate::common::fixed::FixedPoint;
use crate::images::pict::color::{Color, QuickDrawColor, RgbColor};
use crate::images::pict::pattern::Pattern;
use crate::images::pict::region::Region;
use crate::images::pict::types::{Delta, Point, Rect};
use bitflags::bitflags;

/// Size of the HeaderOp payload
const HEADER_OP_SIZE: usize = 24;

bitflags! {
    /// Text style bits of TxFace
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TextFace: u8 {
        const BOLD = 0x01;
        const ITALIC = 0x02;
        const UNDERLINE = 0x04;
        const OUTLINE = 0x08;
        const SHADOW = 0x10;
        const CONDENSE = 0x20;
        const EXTEND = 0x40;
    }
}

/// End point of a line opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    To(Point),
    /// Offset from the start point (short line opcodes)
    By(Delta),
}

/// Where a text opcode draws
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextPosition {
    Absolute(Point),
    /// Offset from the previous text position
    Relative(Delta),
}

/// Version 2 header (0x0C00)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderOp {
    /// Version -2: native resolution and the source rectangle at that resolution
    Extended {
        h_res: FixedPoint,
        v_res: FixedPoint,
        src_rect: Rect,
    },
    /// Version -1: fixed-point bounding box at 72 dpi
    Standard { bounds: Rect },
    Unknown { version: i16 },
}

impl HeaderOp {
    fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let mut body = reader.sub_reader(HEADER_OP_SIZE)?;
        let version = body.read_i16()?;
        let header = match version {
            -2 => {
                body.skip(2)?;
                let h_res = body.read_fixed()?;
                let v_res = body.read_fixed()?;
                let src_rect = Rect::read(&mut body)?;
                HeaderOp::Extended {
                    h_res,
                    v_res,
                    src_rect,
                }
            },
            -1 => {
                body.skip(2)?;
                HeaderOp::Standard {
                    bounds: Rect::read_fixed(&mut body)?,
                }
            },
            version => HeaderOp::Unknown { version },
        };
        Ok(header)
    }

    /// Horizontal and vertical resolution in dpi
    pub fn resolution(&self) -> Option<(FixedPoint, FixedPoint)> {
        match self {
            HeaderOp::Extended { h_res, v_res, .. } => Some((*h_res, *v_res)),
            HeaderOp::Standard { .. } => Some((FixedPoint::from(72i16), FixedPoint::from(72i16))),
            HeaderOp::Unknown { .. } => None,
        }
    }

    /// Picture frame the header declares
    pub fn frame(&self) -> Option<Rect> {
        match self {
            HeaderOp::Extended { src_rect, .. } => Some(*src_rect),
            HeaderOp::Standard { bounds } => Some(*bounds),
            HeaderOp::Unknown { .. } => None,
        }
    }
}

/// Broad classification used by consumers dispatching on opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeCategory {
    /// Affects the picture itself (version, header, end)
    Picture,
    PenState,
    TextState,
    /// Clip, origin, patterns and colours of the port
    PortState,
    /// Lines and shapes
    Shape,
    Text,
    /// Bitmaps, pixmaps and embedded QuickTime images
    Raster,
    Comment,
    /// No-ops and reserved opcodes
    Skip,
}

/// A decoded opcode
#[derive(Debug, Clone, PartialEq)]
pub enum Opcode {
    Nop,
    /// Opcode with no defined meaning; `length` payload bytes were skipped
    Reserved {
        number: u16,
        length: usize,
    },
    Clip(Region),
    BkPat(Pattern),
    TxFont(u16),
    TxFace(TextFace),
    TxMode(i16),
    SpExtra(FixedPoint),
    PnSize(Point),
    PnMode(i16),
    PnPat(Pattern),
    FillPat(Pattern),
    OvSize(Point),
    Origin(Delta),
    TxSize(u16),
    FgColor(Color),
    BkColor(Color),
    TxRatio {
        numerator: Point,
        denominator: Point,
    },
    Version(u8),
    BkPixPat(PixPattern),
    PnPixPat(PixPattern),
    FillPixPat(PixPattern),
    PnLocHFrac(u16),
    ChExtra(i16),
    RgbFgCol(RgbColor),
    RgbBkCol(RgbColor),
    HiliteMode,
    HiliteColor(RgbColor),
    DefHilite,
    OpColor(RgbColor),
    /// `from` is `None` when the line starts at the pen location
    Line {
        from: Option<Point>,
        to: LineEnd,
    },
    Text {
        position: TextPosition,
        text: String,
    },
    FontName {
        id: u16,
        name: String,
    },
    LineJustify {
        inter_char: FixedPoint,
        total_extra: FixedPoint,
    },
    GlyphState {
        outline_preferred: bool,
        preserve_glyph: bool,
        fractional_widths: bool,
        scaling_disabled: bool,
    },
    Shape {
        kind: ShapeKind,
        verb: Verb,
        geometry: Geometry,
    },
    Bits(Box<BitsOpcode>),
    Comment(Comment),
    HeaderOp(HeaderOp),
    QuickTime(Box<QuickTimeOpcode>),
    EndPic,
}

/// Settings that change how payloads are read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadContext {
    /// Run embedded QuickTime codecs
    pub decode_images: bool,
}

impl Default for ReadContext {
    fn default() -> Self {
        Self { decode_images: true }
    }
}

fn read_reserved(number: u16, length: ReservedLength, reader: &mut ByteReader<'_>) -> Result<Opcode> {
    let length = match length {
        ReservedLength::Fixed(n) => n,
        ReservedLength::Word => reader.read_u16()? as usize,
        ReservedLength::Long => reader.read_u32()? as usize,
        ReservedLength::SelfSizedWord => {
            let size = reader.peek_u16()? as usize;
            if size < 2 {
                return Err(Error::InvalidLength {
                    what: "reserved opcode",
                    length: size as i64,
                });
            }
            size
        },
    };
    reader.skip(length)?;
    Ok(Opcode::Reserved { number, length })
}

fn read_text(position: TextPosition, reader: &mut ByteReader<'_>) -> Result<Opcode> {
    Ok(Opcode::Text {
        position,
        text: reader.read_pascal_string()?,
    })
}

impl Opcode {
    /// Read the payload of opcode `number`
    pub fn read(number: u16, reader: &mut ByteReader<'_>, ctx: ReadContext) -> Result<Self> {
        use OpcodeKind as K;

        let opcode = match lookup(number) {
            K::Nop => Opcode::Nop,
            K::Reserved(length) => read_reserved(number, length, reader)?,
            K::Clip => Opcode::Clip(Region::read(reader)?),
            K::BkPat => Opcode::BkPat(Pattern::read(reader)?),
            K::TxFont => Opcode::TxFont(reader.read_u16()?),
            K::TxFace => Opcode::TxFace(TextFace::from_bits_truncate(reader.read_u8()?)),
            K::TxMode => Opcode::TxMode(reader.read_i16()?),
            K::SpExtra => Opcode::SpExtra(reader.read_fixed()?),
            K::PnSize => Opcode::PnSize(Point::read(reader)?),
            K::PnMode => Opcode::PnMode(reader.read_i16()?),
            K::PnPat => Opcode::PnPat(Pattern::read(reader)?),
            K::FillPat => Opcode::FillPat(Pattern::read(reader)?),
            K::OvSize => Opcode::OvSize(Point::read(reader)?),
            K::Origin => Opcode::Origin(Delta::read_hv(reader)?),
            K::TxSize => Opcode::TxSize(reader.read_u16()?),
            K::FgColor => Opcode::FgColor(Color::QuickDraw(QuickDrawColor::from_code(reader.read_u32()?))),
            K::BkColor => Opcode::BkColor(Color::QuickDraw(QuickDrawColor::from_code(reader.read_u32()?))),
            K::TxRatio => Opcode::TxRatio {
                numerator: Point::read(reader)?,
                denominator: Point::read(reader)?,
            },
            K::Version => Opcode::Version(reader.read_u8()?),
            K::BkPixPat => Opcode::BkPixPat(PixPattern::read(reader)?),
            K::PnPixPat => Opcode::PnPixPat(PixPattern::read(reader)?),
            K::FillPixPat => Opcode::FillPixPat(PixPattern::read(reader)?),
            K::PnLocHFrac => Opcode::PnLocHFrac(reader.read_u16()?),
            K::ChExtra => Opcode::ChExtra(reader.read_i16()?),
            K::RgbFgCol => Opcode::RgbFgCol(RgbColor::read(reader)?),
            K::RgbBkCol => Opcode::RgbBkCol(RgbColor::read(reader)?),
            K::HiliteMode => Opcode::HiliteMode,
            K::HiliteColor => Opcode::HiliteColor(RgbColor::read(reader)?),
            K::DefHilite => Opcode::DefHilite,
            K::OpColor => Opcode::OpColor(RgbColor::read(reader)?),
            K::Line => Opcode::Line {
                from: Some(Point::read(reader)?),
                to: LineEnd::To(Point::read(reader)?),
            },
            K::LineFrom => Opcode::Line {
                from: None,
                to: LineEnd::To(Point::read(reader)?),
            },
            K::ShortLine => Opcode::Line {
                from: Some(Point::read(reader)?),
                to: LineEnd::By(Delta::read_short(reader)?),
            },
            K::ShortLineFrom => Opcode::Line {
                from: None,
                to: LineEnd::By(Delta::read_short(reader)?),
            },
            K::LongText => read_text(TextPosition::Absolute(Point::read(reader)?), reader)?,
            K::DhText => {
                let dh = reader.read_u8()? as i16;
                read_text(TextPosition::Relative(Delta::new(dh, 0)), reader)?
            },
            K::DvText => {
                let dv = reader.read_u8()? as i16;
                read_text(TextPosition::Relative(Delta::new(0, dv)), reader)?
            },
            K::DhDvText => {
                let dh = reader.read_u8()? as i16;
                let dv = reader.read_u8()? as i16;
                read_text(TextPosition::Relative(Delta::new(dh, dv)), reader)?
            },
            K::FontName => {
                let length = reader.read_u16()? as usize;
                let mut body = reader.sub_reader(length)?;
                Opcode::FontName {
                    id: body.read_u16()?,
                    name: body.read_pascal_string()?,
                }
            },
            K::LineJustify => {
                let length = reader.read_u16()? as usize;
                let mut body = reader.sub_reader(length)?;
                Opcode::LineJustify {
                    inter_char: body.read_fixed()?,
                    total_extra: body.read_fixed()?,
                }
            },
            K::GlyphState => {
                let length = reader.read_u16()? as usize;
                let mut body = reader.sub_reader(length)?;
                Opcode::GlyphState {
                    outline_preferred: body.read_u8()? != 0,
                    preserve_glyph: body.read_u8()? != 0,
                    fractional_widths: body.read_u8()? != 0,
                    scaling_disabled: body.read_u8()? != 0,
                }
            },
            K::Shape { kind, verb, same } => Opcode::Shape {
                kind,
                verb,
                geometry: Geometry::read(kind, same, reader)?,
            },
            K::BitsRect => Opcode::Bits(Box::new(BitsOpcode::read(BitsKind::Bits, false, reader)?)),
            K::BitsRgn => Opcode::Bits(Box::new(BitsOpcode::read(BitsKind::Bits, true, reader)?)),
            K::PackBitsRect => Opcode::Bits(Box::new(BitsOpcode::read(BitsKind::PackBits, false, reader)?)),
            K::PackBitsRgn => Opcode::Bits(Box::new(BitsOpcode::read(BitsKind::PackBits, true, reader)?)),
            K::DirectBitsRect => Opcode::Bits(Box::new(BitsOpcode::read(BitsKind::DirectBits, false, reader)?)),
            K::DirectBitsRgn => Opcode::Bits(Box::new(BitsOpcode::read(BitsKind::DirectBits, true, reader)?)),
            K::ShortComment => Opcode::Comment(Comment::read_short(reader)?),
            K::LongComment => Opcode::Comment(Comment::read_long(reader)?),
            K::EndPic => Opcode::EndPic,
            K::HeaderOp => Opcode::HeaderOp(HeaderOp::read(reader)?),
            K::CompressedQuickTime => {
                Opcode::QuickTime(Box::new(QuickTimeOpcode::read(true, reader, ctx.decode_images)?))
            },
            K::UncompressedQuickTime => {
                Opcode::QuickTime(Box::new(QuickTimeOpcode::read(false, reader, ctx.decode_images)?))
            },
        };
        Ok(opcode)
    }

    /// Which part of the drawing state the opcode touches
    pub fn category(&self) -> OpcodeCategory {
        use OpcodeCategory as C;

        match self {
            Opcode::Version(_) | Opcode::HeaderOp(_) | Opcode::EndPic => C::Picture,
            Opcode::Nop | Opcode::Reserved { .. } => C::Skip,
            Opcode::PnSize(_)
            | Opcode::PnMode(_)
            | Opcode::PnPat(_)
            | Opcode::PnPixPat(_)
            | Opcode::PnLocHFrac(_) => C::PenState,
            Opcode::TxFont(_)
            | Opcode::TxFace(_)
            | Opcode::TxMode(_)
            | Opcode::SpExtra(_)
            | Opcode::TxSize(_)
            | Opcode::TxRatio { .. }
            | Opcode::ChExtra(_)
            | Opcode::FontName { .. }
            | Opcode::LineJustify { .. }
            | Opcode::GlyphState { .. } => C::TextState,
            Opcode::Clip(_)
            | Opcode::BkPat(_)
            | Opcode::FillPat(_)
            | Opcode::BkPixPat(_)
            | Opcode::FillPixPat(_)
            | Opcode::OvSize(_)
            | Opcode::Origin(_)
            | Opcode::FgColor(_)
            | Opcode::BkColor(_)
            | Opcode::RgbFgCol(_)
            | Opcode::RgbBkCol(_)
            | Opcode::HiliteMode
            | Opcode::HiliteColor(_)
            | Opcode::DefHilite
            | Opcode::OpColor(_) => C::PortState,
            Opcode::Line { .. } | Opcode::Shape { .. } => C::Shape,
            Opcode::Text { .. } => C::Text,
            Opcode::Bits(_) | Opcode::QuickTime(_) => C::Raster,
            Opcode::Comment(_) => C::Comment,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(number: u16, data: &[u8]) -> Opcode {
        let mut reader = ByteReader::new(data);
        let opcode = Opcode::read(number, &mut reader, ReadContext::default()).unwrap();
        assert!(reader.at_end(), "opcode 0x{:04X} left {} bytes", number, reader.remaining());
        opcode
    }

    #[test]
    fn test_state_opcodes() {
        assert_eq!(read(0x0003, &[0, 21]), Opcode::TxFont(21));
        assert_eq!(
            read(0x0004, &[0x05]),
            Opcode::TxFace(TextFace::BOLD | TextFace::UNDERLINE)
        );
        assert_eq!(read(0x0007, &[0, 2, 0, 3]), Opcode::PnSize(Point::new(3, 2)));
        assert_eq!(read(0x000C, &[0, 5, 0xFF, 0xFF]), Opcode::Origin(Delta::new(5, -1)));
        assert_eq!(
            read(0x001A, &[0xFF, 0xFF, 0, 0, 0x80, 0x00]),
            Opcode::RgbFgCol(RgbColor::new(0xFFFF, 0, 0x8000))
        );
        assert_eq!(
            read(0x000E, &[0, 0, 0, 33]),
            Opcode::FgColor(Color::QuickDraw(QuickDrawColor::from_code(33)))
        );
    }

    #[test]
    fn test_line_opcodes() {
        assert_eq!(
            read(0x0022, &[0, 1, 0, 2, 3, 0xFC]),
            Opcode::Line {
                from: Some(Point::new(2, 1)),
                to: LineEnd::By(Delta::new(3, -4))
            }
        );
        assert_eq!(
            read(0x0021, &[0, 9, 0, 8]),
            Opcode::Line {
                from: None,
                to: LineEnd::To(Point::new(8, 9))
            }
        );
    }

    #[test]
    fn test_text_opcodes() {
        assert_eq!(
            read(0x0028, &[0, 10, 0, 20, 2, b'H', b'i']),
            Opcode::Text {
                position: TextPosition::Absolute(Point::new(20, 10)),
                text: "Hi".into()
            }
        );
        assert_eq!(
            read(0x002B, &[4, 6, 1, b'x']),
            Opcode::Text {
                position: TextPosition::Relative(Delta::new(4, 6)),
                text: "x".into()
            }
        );
        assert_eq!(
            read(0x002C, &[0, 9, 0, 2, 6, b'C', b'h', b'i', b'c', b'a', b'g']),
            Opcode::FontName {
                id: 2,
                name: "Chicag".into()
            }
        );
    }

    #[test]
    fn test_shape_opcode() {
        let opcode = read(0x0034, &[0, 0, 0, 0, 0, 10, 0, 20]);
        assert_eq!(
            opcode,
            Opcode::Shape {
                kind: ShapeKind::Rect,
                verb: Verb::Fill,
                geometry: Geometry::Rect(Rect::new(0, 0, 10, 20))
            }
        );
        assert_eq!(opcode.category(), OpcodeCategory::Shape);
    }

    #[test]
    fn test_reserved_lengths() {
        assert_eq!(
            read(0x0024, &[0, 2, 7, 7]),
            Opcode::Reserved {
                number: 0x0024,
                length: 2
            }
        );
        assert_eq!(
            read(0x0075, &[0, 4, 1, 1]),
            Opcode::Reserved {
                number: 0x0075,
                length: 4
            }
        );
        assert_eq!(
            read(0x0300, &[0; 6]),
            Opcode::Reserved {
                number: 0x0300,
                length: 6
            }
        );
        assert_eq!(
            read(0x8100, &[0, 0, 0, 1, 9]),
            Opcode::Reserved {
                number: 0x8100,
                length: 1
            }
        );
    }

    #[test]
    fn test_truncated_reserved() {
        let mut reader = ByteReader::new(&[0, 8, 1]);
        assert!(Opcode::read(0x00A2, &mut reader, ReadContext::default()).is_err());
    }

    #[test]
    fn test_extended_header() {
        let mut data = vec![0xFF, 0xFE, 0, 0];
        data.extend_from_slice(&0x0090_0000i32.to_be_bytes());
        data.extend_from_slice(&0x0090_0000i32.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 0, 0, 200, 1, 44]);
        data.extend_from_slice(&[0; 4]);
        let opcode = read(0x0C00, &data);
        let Opcode::HeaderOp(header) = opcode else {
            panic!("expected header, got {:?}", opcode);
        };
        assert_eq!(
            header.resolution(),
            Some((FixedPoint::from(144i16), FixedPoint::from(144i16)))
        );
        assert_eq!(header.frame(), Some(Rect::new(0, 0, 200, 300)));
    }

    #[test]
    fn test_standard_header() {
        let mut data = vec![0xFF, 0xFF, 0xFF, 0xFF];
        for edge in [0i32, 0, 100, 50] {
            data.extend_from_slice(&(edge << 16).to_be_bytes());
        }
        data.extend_from_slice(&[0; 4]);
        let Opcode::HeaderOp(header) = read(0x0C00, &data) else {
            panic!("expected header");
        };
        assert_eq!(header.frame(), Some(Rect::new(0, 0, 100, 50)));
        assert_eq!(
            header.resolution(),
            Some((FixedPoint::from(72i16), FixedPoint::from(72i16)))
        );
    }

    #[test]
    fn test_categories() {
        assert_eq!(Opcode::EndPic.category(), OpcodeCategory::Picture);
        assert_eq!(Opcode::Nop.category(), OpcodeCategory::Skip);
        assert_eq!(Opcode::TxSize(12).category(), OpcodeCategory::TextState);
        assert_eq!(Opcode::PnMode(8).category(), OpcodeCategory::PenState);
        assert_eq!(Opcode::Origin(Delta::ZERO).category(), OpcodeCategory::PortState);
    }
}
