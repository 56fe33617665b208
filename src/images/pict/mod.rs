// Macintosh PICT (QuickDraw picture) decoding
//
// A picture is a 10-byte header (size and frame) followed by a stream of
// opcodes. Version 1 pictures use one-byte opcodes; version 2 pictures
// announce themselves with `0011 02FF` and use two-byte opcodes aligned to
// even offsets. Files usually carry an extra 512-byte application header
// in front of the picture.
//
// References:
// - Inside Macintosh: Imaging With QuickDraw, Appendix A
// - Apple Technical Note QD 14 (TN1023): Understanding the PICT Format

pub mod color;
pub mod data;
pub mod derez;
pub mod opcode;
pub mod parser;
pub mod pattern;
pub mod region;
pub mod types;

#[cfg(feature = "imgconv")]
pub mod converter;

pub use color::{Color, ColorTable, QuickDrawColor, RgbColor};
pub use derez::{DerezResource, extract_resources};
pub use opcode::{Opcode, OpcodeCategory};
pub use parser::{HeaderOffset, ParseOptions, ParseWarning, PictVersion, Picture, detect_header_offset, parse_many};
pub use pattern::Pattern;
pub use region::Region;
pub use types::{Delta, Point, Polygon, Rect};
