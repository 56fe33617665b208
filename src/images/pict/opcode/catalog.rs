// Opcode number to opcode kind
//
// Every 16-bit opcode number maps to a kind, including the ranges Apple
// reserved for future use. A reserved kind records how many bytes to skip,
// which keeps the stream in sync when an unknown opcode turns up.
//
// Reference: Inside Macintosh: Imaging With QuickDraw, Appendix A

use super::shapes::{ShapeKind, Verb};

/// How a reserved opcode's payload length is determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReservedLength {
    /// A fixed number of bytes
    Fixed(usize),
    /// A 16-bit byte count follows the opcode
    Word,
    /// A 32-bit byte count follows the opcode
    Long,
    /// A 16-bit size that counts itself (polygon and region layouts)
    SelfSizedWord,
}

/// Static parameters of an opcode, before its payload is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpcodeKind {
    Nop,
    Clip,
    BkPat,
    TxFont,
    TxFace,
    TxMode,
    SpExtra,
    PnSize,
    PnMode,
    PnPat,
    FillPat,
    OvSize,
    Origin,
    TxSize,
    FgColor,
    BkColor,
    TxRatio,
    Version,
    BkPixPat,
    PnPixPat,
    FillPixPat,
    PnLocHFrac,
    ChExtra,
    RgbFgCol,
    RgbBkCol,
    HiliteMode,
    HiliteColor,
    DefHilite,
    OpColor,
    Line,
    LineFrom,
    ShortLine,
    ShortLineFrom,
    LongText,
    DhText,
    DvText,
    DhDvText,
    FontName,
    LineJustify,
    GlyphState,
    /// Shape drawing; `same` reuses the previous shape's geometry
    Shape {
        kind: ShapeKind,
        verb: Verb,
        same: bool,
    },
    BitsRect,
    BitsRgn,
    PackBitsRect,
    PackBitsRgn,
    DirectBitsRect,
    DirectBitsRgn,
    ShortComment,
    LongComment,
    EndPic,
    HeaderOp,
    CompressedQuickTime,
    UncompressedQuickTime,
    Reserved(ReservedLength),
}

const SHAPE_KINDS: [ShapeKind; 6] = [
    ShapeKind::Rect,
    ShapeKind::RoundRect,
    ShapeKind::Oval,
    ShapeKind::Arc,
    ShapeKind::Polygon,
    ShapeKind::Region,
];

const VERBS: [Verb; 5] = [Verb::Frame, Verb::Paint, Verb::Erase, Verb::Invert, Verb::Fill];

/// Shape opcodes 0x30..=0x8F: high nibble picks the shape, low nibble the
/// verb (0..=4) or same-shape verb (8..=0xC); the rest are reserved
fn shape_kind(number: u16) -> OpcodeKind {
    let kind = SHAPE_KINDS[(number as usize >> 4) - 3];
    let low = (number & 0x0F) as usize;
    match low {
        0..=4 => OpcodeKind::Shape {
            kind,
            verb: VERBS[low],
            same: false,
        },
        8..=0x0C => OpcodeKind::Shape {
            kind,
            verb: VERBS[low - 8],
            same: true,
        },
        // 5..=7 carry the full shape payload, 0xD..=0xF the same-shape one
        5..=7 => OpcodeKind::Reserved(match kind {
            ShapeKind::Rect | ShapeKind::RoundRect | ShapeKind::Oval => ReservedLength::Fixed(8),
            ShapeKind::Arc => ReservedLength::Fixed(12),
            ShapeKind::Polygon | ShapeKind::Region => ReservedLength::SelfSizedWord,
        }),
        _ => OpcodeKind::Reserved(match kind {
            ShapeKind::Arc => ReservedLength::Fixed(4),
            _ => ReservedLength::Fixed(0),
        }),
    }
}

/// Map an opcode number to its kind; total over the 16-bit space
pub fn lookup(number: u16) -> OpcodeKind {
    use OpcodeKind::*;
    use ReservedLength::{Fixed, Long, Word};

    match number {
        0x0000 => Nop,
        0x0001 => Clip,
        0x0002 => BkPat,
        0x0003 => TxFont,
        0x0004 => TxFace,
        0x0005 => TxMode,
        0x0006 => SpExtra,
        0x0007 => PnSize,
        0x0008 => PnMode,
        0x0009 => PnPat,
        0x000A => FillPat,
        0x000B => OvSize,
        0x000C => Origin,
        0x000D => TxSize,
        0x000E => FgColor,
        0x000F => BkColor,
        0x0010 => TxRatio,
        0x0011 => Version,
        0x0012 => BkPixPat,
        0x0013 => PnPixPat,
        0x0014 => FillPixPat,
        0x0015 => PnLocHFrac,
        0x0016 => ChExtra,
        0x0017..=0x0019 => Reserved(Fixed(0)),
        0x001A => RgbFgCol,
        0x001B => RgbBkCol,
        0x001C => HiliteMode,
        0x001D => HiliteColor,
        0x001E => DefHilite,
        0x001F => OpColor,
        0x0020 => Line,
        0x0021 => LineFrom,
        0x0022 => ShortLine,
        0x0023 => ShortLineFrom,
        0x0024..=0x0027 => Reserved(Word),
        0x0028 => LongText,
        0x0029 => DhText,
        0x002A => DvText,
        0x002B => DhDvText,
        0x002C => FontName,
        0x002D => LineJustify,
        0x002E => GlyphState,
        0x002F => Reserved(Word),
        0x0030..=0x008F => shape_kind(number),
        0x0090 => BitsRect,
        0x0091 => BitsRgn,
        0x0092..=0x0097 => Reserved(Word),
        0x0098 => PackBitsRect,
        0x0099 => PackBitsRgn,
        0x009A => DirectBitsRect,
        0x009B => DirectBitsRgn,
        0x009C..=0x009F => Reserved(Word),
        0x00A0 => ShortComment,
        0x00A1 => LongComment,
        0x00A2..=0x00AF => Reserved(Word),
        0x00B0..=0x00CF => Reserved(Fixed(0)),
        0x00D0..=0x00FE => Reserved(Long),
        0x00FF => EndPic,
        0x02FF => Reserved(Fixed(2)),
        0x0C00 => HeaderOp,
        0x0100..=0x7FFF => Reserved(Fixed((number as usize >> 8) * 2)),
        0x8000..=0x80FF => Reserved(Fixed(0)),
        0x8200 => CompressedQuickTime,
        0x8201 => UncompressedQuickTime,
        0x8100..=0xFFFF => Reserved(Long),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_named_opcodes() {
        assert_eq!(lookup(0x0000), OpcodeKind::Nop);
        assert_eq!(lookup(0x0011), OpcodeKind::Version);
        assert_eq!(lookup(0x00FF), OpcodeKind::EndPic);
        assert_eq!(lookup(0x0C00), OpcodeKind::HeaderOp);
        assert_eq!(lookup(0x8200), OpcodeKind::CompressedQuickTime);
        assert_eq!(lookup(0x009A), OpcodeKind::DirectBitsRect);
    }

    #[test]
    fn test_shape_opcodes() {
        assert_eq!(
            lookup(0x0031),
            OpcodeKind::Shape {
                kind: ShapeKind::Rect,
                verb: Verb::Paint,
                same: false
            }
        );
        assert_eq!(
            lookup(0x006C),
            OpcodeKind::Shape {
                kind: ShapeKind::Arc,
                verb: Verb::Fill,
                same: true
            }
        );
        assert_eq!(
            lookup(0x0084),
            OpcodeKind::Shape {
                kind: ShapeKind::Region,
                verb: Verb::Fill,
                same: false
            }
        );
    }

    #[test]
    fn test_reserved_ranges() {
        use ReservedLength::*;
        let cases = [
            (0x0017, Fixed(0)),
            (0x0024, Word),
            (0x0035, Fixed(8)),
            (0x003D, Fixed(0)),
            (0x0065, Fixed(12)),
            (0x006D, Fixed(4)),
            (0x0075, SelfSizedWord),
            (0x0087, SelfSizedWord),
            (0x008F, Fixed(0)),
            (0x0092, Word),
            (0x00A2, Word),
            (0x00B0, Fixed(0)),
            (0x00D0, Long),
            (0x0100, Fixed(2)),
            (0x02FF, Fixed(2)),
            (0x0300, Fixed(6)),
            (0x7FFF, Fixed(0xFE)),
            (0x8000, Fixed(0)),
            (0x8100, Long),
            (0xFFFF, Long),
        ];
        for (number, length) in cases {
            assert_eq!(lookup(number), OpcodeKind::Reserved(length), "opcode 0x{:04X}", number);
        }
    }

    #[test]
    fn test_catalog_is_total() {
        for number in 0..=u16::MAX {
            let _ = lookup(number);
        }
    }

    proptest! {
        #[test]
        fn high_opcodes_are_reserved(number in 0x8202u16..=0xFFFF) {
            prop_assert_eq!(lookup(number), OpcodeKind::Reserved(ReservedLength::Long));
        }

        #[test]
        fn two_byte_reserved_length(number in 0x0D00u16..=0x7FFF) {
            prop_assert_eq!(
                lookup(number),
                OpcodeKind::Reserved(ReservedLength::Fixed((number as usize >> 8) * 2))
            );
        }
    }
}
