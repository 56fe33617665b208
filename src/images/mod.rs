// Picture and image decoding
//
// # Architecture
//
// - `pict`: PICT header, opcode catalog and parse loop, regions, colours
// - `quicktime`: codecs for images embedded with the QuickTime opcodes
// - `raster`: the decoded pixel buffer every decoder produces

pub mod pict;
pub mod quicktime;
pub mod raster;

pub use raster::{PixMapMetadata, RasterImage};
