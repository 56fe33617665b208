//! Colour model: direct RGB, legacy QuickDraw colours, CMYK, blends and
//! colour tables.
//!
//! Colours stay symbolic here; they are only resolved to RGB by whoever
//! renders the picture.

use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use bitflags::bitflags;
use once_cell::sync::Lazy;

/// RGB colour with 16-bit channels
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct RgbColor {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
}

impl RgbColor {
    pub const BLACK: Self = Self::new(0, 0, 0);
    pub const WHITE: Self = Self::new(0xFFFF, 0xFFFF, 0xFFFF);

    pub const fn new(red: u16, green: u16, blue: u16) -> Self {
        Self { red, green, blue }
    }

    /// Widen 8-bit channels by byte replication
    pub const fn from_rgb8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: (red as u16) << 8 | red as u16,
            green: (green as u16) << 8 | green as u16,
            blue: (blue as u16) << 8 | blue as u16,
        }
    }

    /// Widen a packed `xRRRRRGGGGGBBBBB` value
    pub const fn from_rgb555(value: u16) -> Self {
        let r = ((value >> 10) & 0x1F) as u8;
        let g = ((value >> 5) & 0x1F) as u8;
        let b = (value & 0x1F) as u8;
        Self::from_rgb8(r << 3 | r >> 2, g << 3 | g >> 2, b << 3 | b >> 2)
    }

    /// Read three big-endian 16-bit channels
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let red = reader.read_u16()?;
        let green = reader.read_u16()?;
        let blue = reader.read_u16()?;
        Ok(Self { red, green, blue })
    }

    /// Narrow to 8-bit channels
    pub const fn to_rgb8(self) -> [u8; 3] {
        [
            (self.red >> 8) as u8,
            (self.green >> 8) as u8,
            (self.blue >> 8) as u8,
        ]
    }
}

/// The eight colours of the original (pre-Color QuickDraw) model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuickDrawColor {
    Black,
    White,
    Red,
    Green,
    Blue,
    Cyan,
    Magenta,
    Yellow,
}

impl QuickDrawColor {
    const CYAN_BIT: u32 = 1 << 8;
    const MAGENTA_BIT: u32 = 1 << 7;
    const YELLOW_BIT: u32 = 1 << 6;
    const BLACK_BIT: u32 = 1;

    /// Decode a planar colour code (`blackColor` = 33, `redColor` = 205, ...)
    ///
    /// Codes other than the eight named constants are decoded from their
    /// cyan/magenta/yellow plane bits.
    pub fn from_code(code: u32) -> Self {
        let cyan = code & Self::CYAN_BIT != 0;
        let magenta = code & Self::MAGENTA_BIT != 0;
        let yellow = code & Self::YELLOW_BIT != 0;
        match (cyan, magenta, yellow) {
            (false, false, false) if code & Self::BLACK_BIT != 0 => Self::Black,
            (false, false, false) => Self::White,
            (true, false, false) => Self::Cyan,
            (false, true, false) => Self::Magenta,
            (false, false, true) => Self::Yellow,
            (false, true, true) => Self::Red,
            (true, false, true) => Self::Green,
            (true, true, false) => Self::Blue,
            (true, true, true) => Self::Black,
        }
    }

    /// The canonical code for this colour
    pub const fn code(self) -> u32 {
        match self {
            Self::Black => 33,
            Self::White => 30,
            Self::Red => 205,
            Self::Green => 341,
            Self::Blue => 409,
            Self::Cyan => 273,
            Self::Magenta => 137,
            Self::Yellow => 69,
        }
    }

    pub const fn to_rgb(self) -> RgbColor {
        match self {
            Self::Black => RgbColor::BLACK,
            Self::White => RgbColor::WHITE,
            Self::Red => RgbColor::new(0xDD6B, 0x08C2, 0x06A2),
            Self::Green => RgbColor::new(0x0000, 0x8000, 0x11B0),
            Self::Blue => RgbColor::new(0x0000, 0x0000, 0xD400),
            Self::Cyan => RgbColor::new(0x0241, 0xAB54, 0xEAFF),
            Self::Magenta => RgbColor::new(0xF2D7, 0x0856, 0x84EC),
            Self::Yellow => RgbColor::new(0xFC66, 0xF37F, 0x0523),
        }
    }
}

/// A colour as specified by the picture
#[derive(Debug, Clone, PartialEq)]
pub enum Color {
    /// Direct RGB
    Rgb(RgbColor),
    /// Legacy eight-colour code
    QuickDraw(QuickDrawColor),
    /// Process colour, optionally named (spot colour)
    Cmyk {
        cyan: u16,
        magenta: u16,
        yellow: u16,
        black: u16,
        name: Option<String>,
    },
    /// `weight` of `first` mixed with `1 - weight` of `second`
    Blend {
        first: Box<Color>,
        second: Box<Color>,
        weight: f64,
    },
}

impl Color {
    pub const BLACK: Color = Color::Rgb(RgbColor::BLACK);
    pub const WHITE: Color = Color::Rgb(RgbColor::WHITE);

    /// Lazy mix of two colours
    pub fn blend(first: Color, second: Color, weight: f64) -> Color {
        Color::Blend {
            first: Box::new(first),
            second: Box::new(second),
            weight: weight.clamp(0.0, 1.0),
        }
    }

    /// Resolve to direct RGB
    pub fn to_rgb(&self) -> RgbColor {
        match self {
            Color::Rgb(rgb) => *rgb,
            Color::QuickDraw(qd) => qd.to_rgb(),
            Color::Cmyk {
                cyan,
                magenta,
                yellow,
                black,
                ..
            } => {
                let k = 0xFFFF - *black as u32;
                let channel = |c: u16| ((0xFFFF - c as u32) * k / 0xFFFF) as u16;
                RgbColor::new(channel(*cyan), channel(*magenta), channel(*yellow))
            },
            Color::Blend {
                first,
                second,
                weight,
            } => {
                let a = first.to_rgb();
                let b = second.to_rgb();
                let mix = |x: u16, y: u16| (x as f64 * weight + y as f64 * (1.0 - weight)).round() as u16;
                RgbColor::new(mix(a.red, b.red), mix(a.green, b.green), mix(a.blue, b.blue))
            },
        }
    }
}

impl From<RgbColor> for Color {
    fn from(rgb: RgbColor) -> Self {
        Color::Rgb(rgb)
    }
}

bitflags! {
    /// Colour table flags (`ctFlags`)
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ColorTableFlags: u16 {
        /// Entries are addressed by position, not by their value field
        const DEVICE = 0x8000;
    }
}

/// Hard cap on palette size: palette image data is at most 8 bits per pixel.
const MAX_COLOR_TABLE_ENTRIES: usize = 256;

/// Indexed palette
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColorTable {
    pub seed: u32,
    pub flags: ColorTableFlags,
    pub colors: Vec<RgbColor>,
    /// Some entry's value field disagreed with its position
    pub index_mismatch: bool,
}

impl ColorTable {
    /// Table from a list of colours
    pub fn new(colors: Vec<RgbColor>) -> Self {
        Self {
            seed: 0,
            flags: ColorTableFlags::empty(),
            colors,
            index_mismatch: false,
        }
    }

    /// Read a `ColorTable` record
    ///
    /// Real-world files often carry value fields that do not match the entry
    /// position; such entries are placed by position and the table is flagged
    /// rather than rejected.
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let seed = reader.read_u32()?;
        let flags = ColorTableFlags::from_bits_retain(reader.read_u16()?);
        let size = reader.read_i16()? as i32 + 1;
        let count = usize::try_from(size).map_err(|_| Error::InvalidLength {
            what: "color table",
            length: size as i64,
        })?;
        if count > MAX_COLOR_TABLE_ENTRIES {
            return Err(Error::LimitExceeded {
                what: "color table entry",
                value: count,
                limit: MAX_COLOR_TABLE_ENTRIES,
            });
        }

        let mut colors = vec![RgbColor::BLACK; count];
        let mut index_mismatch = false;
        for position in 0..count {
            let value = reader.read_u16()? as usize;
            let color = RgbColor::read(reader)?;
            let index = if flags.contains(ColorTableFlags::DEVICE) {
                position
            } else if value < count {
                if value != position {
                    index_mismatch = true;
                }
                value
            } else {
                index_mismatch = true;
                position
            };
            colors[index] = color;
        }
        if index_mismatch {
            log::warn!("color table with {} entries has inconsistent indices", count);
        }

        Ok(Self {
            seed,
            flags,
            colors,
            index_mismatch,
        })
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Colour at `index`
    pub fn get(&self, index: usize) -> Option<RgbColor> {
        self.colors.get(index).copied()
    }

    /// Built-in Apple palette for 1, 2, 4 or 8 bits per pixel
    pub fn standard(depth: u16) -> Result<&'static ColorTable> {
        match depth {
            1 => Ok(&STANDARD_1BIT),
            2 => Ok(&STANDARD_2BIT),
            4 => Ok(&STANDARD_4BIT),
            8 => Ok(&STANDARD_8BIT),
            _ => Err(Error::UnsupportedDepth(depth)),
        }
    }

    /// Linear grey ramp from white (index 0) to black, as used by
    /// grey-scale QuickTime depths
    pub fn grayscale(depth: u16) -> Result<ColorTable> {
        if !matches!(depth, 1 | 2 | 4 | 8) {
            return Err(Error::UnsupportedDepth(depth));
        }
        let count = 1usize << depth;
        let colors = (0..count)
            .map(|i| {
                let level = (0xFFFF - i * 0xFFFF / (count - 1)) as u16;
                RgbColor::new(level, level, level)
            })
            .collect();
        Ok(ColorTable::new(colors))
    }
}

static STANDARD_1BIT: Lazy<ColorTable> =
    Lazy::new(|| ColorTable::new(vec![RgbColor::WHITE, RgbColor::BLACK]));

static STANDARD_2BIT: Lazy<ColorTable> = Lazy::new(|| {
    ColorTable::new(vec![
        RgbColor::WHITE,
        RgbColor::new(0xAAAA, 0xAAAA, 0xAAAA),
        RgbColor::new(0x5555, 0x5555, 0x5555),
        RgbColor::BLACK,
    ])
});

static STANDARD_4BIT: Lazy<ColorTable> = Lazy::new(|| {
    let rgb = [
        (0xFF, 0xFF, 0xFF),
        (0xFC, 0xF3, 0x05),
        (0xFF, 0x64, 0x02),
        (0xDD, 0x08, 0x06),
        (0xF2, 0x08, 0x84),
        (0x46, 0x00, 0xA5),
        (0x00, 0x00, 0xD4),
        (0x02, 0xAB, 0xEA),
        (0x1F, 0xB7, 0x14),
        (0x00, 0x64, 0x11),
        (0x56, 0x2C, 0x05),
        (0x90, 0x71, 0x3A),
        (0xC0, 0xC0, 0xC0),
        (0x80, 0x80, 0x80),
        (0x40, 0x40, 0x40),
        (0x00, 0x00, 0x00),
    ];
    ColorTable::new(
        rgb.iter()
            .map(|&(r, g, b)| RgbColor::from_rgb8(r, g, b))
            .collect(),
    )
});

/// The Macintosh system palette: a 6x6x6 colour cube (minus black), ten-step
/// red, green, blue and grey ramps, then black.
static STANDARD_8BIT: Lazy<ColorTable> = Lazy::new(|| {
    const CUBE: [u8; 6] = [0xFF, 0xCC, 0x99, 0x66, 0x33, 0x00];
    const RAMP: [u8; 10] = [0xEE, 0xDD, 0xBB, 0xAA, 0x88, 0x77, 0x55, 0x44, 0x22, 0x11];

    let mut colors = Vec::with_capacity(256);
    for &r in &CUBE {
        for &g in &CUBE {
            for &b in &CUBE {
                colors.push(RgbColor::from_rgb8(r, g, b));
            }
        }
    }
    colors.pop();
    colors.extend(RAMP.iter().map(|&v| RgbColor::from_rgb8(v, 0, 0)));
    colors.extend(RAMP.iter().map(|&v| RgbColor::from_rgb8(0, v, 0)));
    colors.extend(RAMP.iter().map(|&v| RgbColor::from_rgb8(0, 0, v)));
    colors.extend(RAMP.iter().map(|&v| RgbColor::from_rgb8(v, v, v)));
    colors.push(RgbColor::BLACK);
    ColorTable::new(colors)
});
