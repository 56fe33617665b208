// QuickTime image codecs embedded in PICT
//
// The compressed-QuickTime opcode carries an image description naming a
// codec and the compressed bytes. Each codec module decodes one still image
// into a `RasterImage`; all per-image state (codebooks, colour caches) lives
// inside that one decode call.
//
// References:
// - Inside Macintosh: QuickTime, Image Compression Manager
// - QuickTime File Format: Image description atoms

pub mod blocks;
pub mod cinepak;
pub mod description;
pub mod planar;
pub mod quicktake;
pub mod raw;
pub mod rpza;
pub mod smc;
pub mod targa;
pub mod yuv;

pub use blocks::BlockPixMap;
pub use description::ImageDescription;

use crate::common::binary::FourCc;
use crate::common::error::{Error, Result};
use crate::images::raster::RasterImage;

/// Codecs recognised in an image description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    Cinepak,
    RoadPizza,
    Graphics,
    Targa,
    Planar,
    Raw,
    IntelRaw,
    Yuv2,
    Vuy2,
    QuickTake,
    /// Self-contained formats handed through undecoded
    Jpeg,
    Png,
    Tiff,
    Gif,
    Other(FourCc),
}

impl Codec {
    pub fn from_four_cc(code: FourCc) -> Self {
        match &code.0 {
            b"cvid" => Self::Cinepak,
            b"rpza" => Self::RoadPizza,
            b"smc " => Self::Graphics,
            b"tga " => Self::Targa,
            b"8BPS" => Self::Planar,
            b"raw " => Self::Raw,
            b"YVU9" => Self::IntelRaw,
            b"yuv2" => Self::Yuv2,
            b"2vuy" => Self::Vuy2,
            b"qktk" => Self::QuickTake,
            b"jpeg" => Self::Jpeg,
            b"png " => Self::Png,
            b"tiff" => Self::Tiff,
            b"gif " => Self::Gif,
            _ => Self::Other(code),
        }
    }

    /// True for formats a general-purpose image library reads directly
    pub fn is_passthrough(&self) -> bool {
        matches!(self, Self::Jpeg | Self::Png | Self::Tiff | Self::Gif)
    }
}

/// Result of handling an embedded image
#[derive(Debug, Clone, PartialEq)]
pub enum QuickTimeImage {
    /// Decoded pixels
    Raster(RasterImage),
    /// Bytes of a self-contained format, or decoding was switched off
    Encoded { codec: FourCc, data: Vec<u8> },
    /// The codec rejected the payload; the picture parse is unaffected
    Failed(Error),
}

impl QuickTimeImage {
    pub fn raster(&self) -> Option<&RasterImage> {
        match self {
            Self::Raster(image) => Some(image),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&Error> {
        match self {
            Self::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Decode one embedded image with the codec its description names
pub fn decode_image(desc: &ImageDescription, data: &[u8]) -> Result<RasterImage> {
    match Codec::from_four_cc(desc.codec) {
        Codec::Cinepak => cinepak::decode(data, desc),
        Codec::RoadPizza => rpza::decode(data, desc),
        Codec::Graphics => smc::decode(data, desc),
        Codec::Targa => targa::decode(data, desc),
        Codec::Planar => planar::decode(data, desc),
        Codec::Raw => raw::decode(data, desc),
        Codec::IntelRaw => yuv::decode_yvu9(data, desc),
        Codec::Yuv2 => yuv::decode_packed(data, desc, yuv::PackedYuv::Yuv2),
        Codec::Vuy2 => yuv::decode_packed(data, desc, yuv::PackedYuv::Vuy2),
        Codec::QuickTake => quicktake::decode(data, desc),
        codec @ (Codec::Jpeg | Codec::Png | Codec::Tiff | Codec::Gif) => Err(Error::Unsupported(
            format!("{:?} data is passed through, not decoded", codec),
        )),
        Codec::Other(code) => Err(Error::Unsupported(format!("QuickTime codec '{}'", code))),
    }
}

/// Handle an embedded image without failing the surrounding parse
pub fn decode_payload(desc: &ImageDescription, data: &[u8], decode: bool) -> QuickTimeImage {
    let codec = Codec::from_four_cc(desc.codec);
    if !decode || codec.is_passthrough() {
        return QuickTimeImage::Encoded {
            codec: desc.codec,
            data: data.to_vec(),
        };
    }
    match decode_image(desc, data) {
        Ok(image) => QuickTimeImage::Raster(image),
        Err(error) => {
            log::warn!("{} image {}x{} failed to decode: {}", desc.codec, desc.width, desc.height, error);
            QuickTimeImage::Failed(error)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_lookup() {
        assert_eq!(Codec::from_four_cc(FourCc::new(b"cvid")), Codec::Cinepak);
        assert_eq!(Codec::from_four_cc(FourCc::new(b"smc ")), Codec::Graphics);
        assert!(Codec::from_four_cc(FourCc::new(b"jpeg")).is_passthrough());
        assert_eq!(
            Codec::from_four_cc(FourCc::new(b"h264")),
            Codec::Other(FourCc::new(b"h264"))
        );
    }

    #[test]
    fn test_passthrough_keeps_bytes() {
        let desc = ImageDescription::new(FourCc::new(b"jpeg"), 1, 1, 24);
        let image = decode_payload(&desc, &[0xFF, 0xD8], true);
        assert_eq!(
            image,
            QuickTimeImage::Encoded {
                codec: FourCc::new(b"jpeg"),
                data: vec![0xFF, 0xD8]
            }
        );
    }

    #[test]
    fn test_codec_failure_is_captured() {
        let desc = ImageDescription::new(FourCc::new(b"rpza"), 4, 4, 16);
        let image = decode_payload(&desc, &[0x00], true);
        assert!(image.error().is_some());
        assert!(image.raster().is_none());
    }

    #[test]
    fn test_unknown_codec() {
        let desc = ImageDescription::new(FourCc::new(b"h264"), 4, 4, 24);
        assert!(matches!(decode_image(&desc, &[]), Err(Error::Unsupported(_))));
    }

    #[test]
    fn test_raw_dispatch() {
        let desc = ImageDescription::new(FourCc::new(b"raw "), 1, 1, 24);
        let image = decode_payload(&desc, &[1, 2, 3], true);
        assert_eq!(image.raster().unwrap().pixel_rgba(0, 0), Some([1, 2, 3, 255]));
    }
}
