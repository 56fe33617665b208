// PICT stream parser
//
// Reads the picture header and then one opcode after another until EndPic
// or the end of the buffer. Picture-level opcodes (version, header) update
// the picture as they are read. A failure part way through keeps everything
// decoded before it: the error is stored on the picture instead of being
// returned.

use super::opcode::{Opcode, PixPatternFill, ReadContext};
use super::types::Rect;
use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use crate::common::fixed::FixedPoint;
use crate::images::quicktime::QuickTimeImage;
use crate::images::raster::RasterImage;
use rayon::prelude::*;

/// Size of the application header in front of PICT files
pub const FILE_HEADER_SIZE: usize = 512;

/// `picSize` plus `picFrame`
const PICTURE_HEADER_SIZE: usize = 10;

/// Version opcode of a version 2 picture, read as 16-bit words
const VERSION_2_PREAMBLE: [u8; 4] = [0x00, 0x11, 0x02, 0xFF];

/// Version opcode of a version 1 picture
const VERSION_1_PREAMBLE: [u8; 2] = [0x11, 0x01];

/// Default bound on the number of opcodes read from one picture
pub const DEFAULT_MAX_OPCODES: usize = 1_000_000;

/// PICT format version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PictVersion {
    /// One-byte opcodes
    V1,
    /// Two-byte opcodes aligned to even offsets
    V2,
}

/// Where the picture data starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderOffset {
    /// Use [`detect_header_offset`]
    #[default]
    Auto,
    Explicit(usize),
}

/// Parser configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    pub header_offset: HeaderOffset,
    /// Display name used in diagnostics
    pub name: Option<String>,
    /// Run embedded QuickTime codecs; when off their bytes are kept encoded
    pub decode_images: bool,
    /// Stop after this many opcodes
    pub max_opcodes: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            header_offset: HeaderOffset::Auto,
            name: None,
            decode_images: true,
            max_opcodes: DEFAULT_MAX_OPCODES,
        }
    }
}

impl ParseOptions {
    pub fn with_header_offset(mut self, offset: HeaderOffset) -> Self {
        self.header_offset = offset;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_decode_images(mut self, decode: bool) -> Self {
        self.decode_images = decode;
        self
    }

    pub fn with_max_opcodes(mut self, max: usize) -> Self {
        self.max_opcodes = max;
        self
    }
}

/// A tolerated problem found while parsing
#[derive(Debug, Clone, PartialEq)]
pub enum ParseWarning {
    /// Opcode with no defined meaning was skipped
    ReservedOpcode {
        offset: usize,
        opcode: u16,
        length: usize,
    },
    /// A colour table listed indices out of order or out of range
    ColorTableMismatch { offset: usize, opcode: u16 },
    /// An embedded image could not be decoded
    ImageFailed {
        offset: usize,
        opcode: u16,
        error: Error,
    },
    /// The data ended without an EndPic opcode
    MissingEndPic,
}

/// A parsed picture
#[derive(Debug, Clone, PartialEq)]
pub struct Picture {
    pub name: Option<String>,
    /// Declared size; only meaningful for small version 1 pictures
    pub size: u16,
    pub frame: Rect,
    /// Horizontal and vertical resolution in dpi
    pub resolution: (FixedPoint, FixedPoint),
    pub version: PictVersion,
    pub opcodes: Vec<Opcode>,
    pub warnings: Vec<ParseWarning>,
    /// Error that stopped parsing early, if any
    pub error: Option<Error>,
}

/// Find where picture data starts: after a 512-byte file header, or at 0
pub fn detect_header_offset(data: &[u8]) -> usize {
    let starts_picture = |offset: usize| {
        let opcode = data.get(offset + PICTURE_HEADER_SIZE..);
        opcode.is_some_and(|op| op.starts_with(&VERSION_2_PREAMBLE) || op.starts_with(&VERSION_1_PREAMBLE))
    };
    if starts_picture(0) {
        return 0;
    }
    if data.len() < FILE_HEADER_SIZE + PICTURE_HEADER_SIZE {
        return 0;
    }
    if starts_picture(FILE_HEADER_SIZE) || data[..FILE_HEADER_SIZE].iter().all(|&b| b == 0) {
        FILE_HEADER_SIZE
    } else {
        0
    }
}

impl Picture {
    /// Parse with default options
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with_options(data, &ParseOptions::default())
    }

    /// Parse a picture. Fails only when the picture header itself cannot
    /// be read; later errors end up in [`Picture::error`].
    pub fn parse_with_options(data: &[u8], options: &ParseOptions) -> Result<Self> {
        let base = match options.header_offset {
            HeaderOffset::Auto => detect_header_offset(data),
            HeaderOffset::Explicit(offset) => offset,
        };
        let mut reader = ByteReader::at(data, base)?;
        let size = reader.read_u16()?;
        let frame = Rect::read(&mut reader)?;
        let wide = reader.peek_bytes(VERSION_2_PREAMBLE.len()).is_ok_and(|b| b == VERSION_2_PREAMBLE);

        let mut picture = Picture {
            name: options.name.clone(),
            size,
            frame,
            resolution: (FixedPoint::from(72i16), FixedPoint::from(72i16)),
            version: if wide { PictVersion::V2 } else { PictVersion::V1 },
            opcodes: Vec::new(),
            warnings: Vec::new(),
            error: None,
        };
        let ctx = ReadContext {
            decode_images: options.decode_images,
        };
        picture.read_opcodes(&mut reader, base, ctx, options.max_opcodes);

        log::debug!(
            "{}: {} opcodes, {} warnings",
            picture.display_name(),
            picture.opcodes.len(),
            picture.warnings.len()
        );
        Ok(picture)
    }

    fn read_opcodes(&mut self, reader: &mut ByteReader<'_>, base: usize, ctx: ReadContext, max_opcodes: usize) {
        loop {
            if self.opcodes.len() >= max_opcodes {
                self.error = Some(Error::LimitExceeded {
                    what: "opcode",
                    value: self.opcodes.len(),
                    limit: max_opcodes,
                });
                break;
            }
            let wide = self.version == PictVersion::V2;
            if (wide && reader.align(base, 2).is_err()) || reader.at_end() {
                log::warn!("{}: no EndPic before end of data", self.display_name());
                self.warnings.push(ParseWarning::MissingEndPic);
                break;
            }

            let offset = reader.position();
            let number = if wide {
                reader.read_u16()
            } else {
                reader.read_u8().map(u16::from)
            };
            let result = number.and_then(|number| Ok((number, Opcode::read(number, reader, ctx)?)));
            let (number, opcode) = match result {
                Ok(read) => read,
                Err(e) => {
                    log::warn!("{}: parsing stopped at offset {}: {}", self.display_name(), offset, e);
                    self.error = Some(e);
                    break;
                },
            };
            log::debug!("0x{:04X} at {}: {:?}", number, offset, opcode.category());

            self.apply(&opcode, number, offset, reader);
            let done = opcode == Opcode::EndPic;
            self.opcodes.push(opcode);
            if done {
                break;
            }
        }
    }

    /// Fold the picture-level effect of an opcode into the picture
    fn apply(&mut self, opcode: &Opcode, number: u16, offset: usize, reader: &mut ByteReader<'_>) {
        match opcode {
            Opcode::Version(2) if self.version == PictVersion::V1 => {
                // Rest of the 0x02FF version word
                if reader.peek_u8().is_ok_and(|b| b == 0xFF) {
                    let _ = reader.read_u8();
                }
                self.version = PictVersion::V2;
            },
            Opcode::HeaderOp(header) => {
                if let Some(resolution) = header.resolution() {
                    self.resolution = resolution;
                }
                if let Some(frame) = header.frame() {
                    self.frame = frame;
                }
            },
            Opcode::Reserved { length, .. } => {
                log::warn!(
                    "{}: skipped reserved opcode 0x{:04X} ({} bytes) at {}",
                    self.display_name(),
                    number,
                    length,
                    offset
                );
                self.warnings.push(ParseWarning::ReservedOpcode {
                    offset,
                    opcode: number,
                    length: *length,
                });
            },
            Opcode::Bits(bits) => {
                if bits.header.color_table.as_ref().is_some_and(|table| table.index_mismatch) {
                    log::warn!("{}: inconsistent colour table indices at {}", self.display_name(), offset);
                    self.warnings.push(ParseWarning::ColorTableMismatch {
                        offset,
                        opcode: number,
                    });
                }
            },
            Opcode::QuickTime(qt) => {
                if let Some(error) = qt.image().and_then(QuickTimeImage::error) {
                    self.warnings.push(ParseWarning::ImageFailed {
                        offset,
                        opcode: number,
                        error: error.clone(),
                    });
                }
            },
            _ => {},
        }
    }

    /// Name for diagnostics
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("<picture>")
    }

    pub fn width(&self) -> i32 {
        self.frame.width()
    }

    pub fn height(&self) -> i32 {
        self.frame.height()
    }

    /// True when parsing reached EndPic without an error
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.opcodes.last() == Some(&Opcode::EndPic)
    }

    /// Every decoded raster: bitmaps, pixel pattern images and QuickTime images
    pub fn rasters(&self) -> impl Iterator<Item = &RasterImage> {
        self.opcodes.iter().filter_map(|opcode| match opcode {
            Opcode::Bits(bits) => Some(&bits.image),
            Opcode::QuickTime(qt) => qt.image().and_then(QuickTimeImage::raster),
            Opcode::BkPixPat(pattern) | Opcode::PnPixPat(pattern) | Opcode::FillPixPat(pattern) => {
                match &pattern.fill {
                    PixPatternFill::Pixels(image) => Some(image),
                    _ => None,
                }
            },
            _ => None,
        })
    }
}

/// Parse independent pictures in parallel
pub fn parse_many(inputs: &[&[u8]], options: &ParseOptions) -> Vec<Result<Picture>> {
    inputs
        .par_iter()
        .map(|data| Picture::parse_with_options(data, options))
        .collect()
}
