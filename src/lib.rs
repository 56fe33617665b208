//! QuickDraw - a decoder for Macintosh PICT pictures
//!
//! This library turns classic Mac OS PICT data into typed opcodes and
//! decoded pixel buffers. It covers both picture versions, regions,
//! PackBits bitmaps and the QuickTime codecs that appear in pictures
//! (Cinepak, Road Pizza, Graphics, Targa, Planar, YUV, QuickTake, raw).
//!
//! # Features
//!
//! - **Best-effort parsing**: a damaged opcode stops the parse but keeps
//!   everything decoded before it
//! - **Exhaustive opcode catalog**: reserved opcodes are skipped with the
//!   published lengths, so unknown data never desynchronises the stream
//! - **Self-contained codecs**: each embedded image decodes independently
//!   and a codec failure never fails the picture
//! - **Parallel batches**: [`parse_many`] decodes pictures on the rayon pool
//!
//! # Example - Parsing a picture
//!
//! ```no_run
//! use quickdraw::{Opcode, Picture};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let data = std::fs::read("picture.pict")?;
//! let picture = Picture::parse(&data)?;
//! println!("{}x{}, {} opcodes", picture.width(), picture.height(), picture.opcodes.len());
//!
//! for opcode in &picture.opcodes {
//!     if let Opcode::Bits(bits) = opcode {
//!         println!("bitmap {}x{}", bits.image.width(), bits.image.height());
//!     }
//! }
//! if let Some(error) = &picture.error {
//!     println!("stopped early: {}", error);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example - Resources from DeRez output
//!
//! ```no_run
//! use quickdraw::{Picture, extract_resources};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let text = std::fs::read_to_string("resources.r")?;
//! for resource in extract_resources(&text)?.iter().filter(|r| r.is_pict()) {
//!     let picture = Picture::parse(&resource.to_pict_file())?;
//!     println!("{}: {} opcodes", resource.file_name(), picture.opcodes.len());
//! }
//! # Ok(())
//! # }
//! ```

/// Byte cursor, fixed-point numbers and the error type
pub mod common;

/// PICT parsing, QuickTime codecs and decoded rasters
pub mod images;

// Re-export commonly used types for convenience
pub use common::{ByteReader, Error, FixedPoint, FourCc, Result};
pub use images::pict::{
    HeaderOffset, Opcode, OpcodeCategory, ParseOptions, ParseWarning, PictVersion, Picture, Rect, Region,
    detect_header_offset, extract_resources, parse_many,
};
pub use images::quicktime::{ImageDescription, QuickTimeImage};
pub use images::raster::{PixMapMetadata, RasterImage};
