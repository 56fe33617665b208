//! QuickTime image description (`idsc`)
//!
//! Every embedded QuickTime image starts with an 86-byte big-endian header
//! naming the codec, dimensions and depth, optionally followed by a colour
//! table or extension atoms.

use crate::common::binary::{ByteReader, FourCc, decode_mac_roman};
use crate::common::error::{Error, Result};
use crate::common::fixed::FixedPoint;
use crate::images::pict::color::ColorTable;
use zerocopy::{BE, FromBytes, I16, I32, U16, U32};
use zerocopy_derive::{FromBytes as DeriveFromBytes, Immutable, KnownLayout, Unaligned};

/// On-disk image description header
#[derive(Debug, Clone, Copy, DeriveFromBytes, Immutable, KnownLayout, Unaligned)]
#[repr(C)]
struct RawImageDescription {
    id_size: U32<BE>,
    codec: [u8; 4],
    reserved1: U32<BE>,
    reserved2: U16<BE>,
    data_ref_index: U16<BE>,
    version: U16<BE>,
    revision: U16<BE>,
    vendor: [u8; 4],
    temporal_quality: U32<BE>,
    spatial_quality: U32<BE>,
    width: U16<BE>,
    height: U16<BE>,
    h_res: I32<BE>,
    v_res: I32<BE>,
    data_size: U32<BE>,
    frame_count: U16<BE>,
    name: [u8; 32],
    depth: I16<BE>,
    clut_id: I16<BE>,
}

/// Size of the fixed header
pub const IMAGE_DESCRIPTION_SIZE: usize = std::mem::size_of::<RawImageDescription>();

/// Parsed image description
#[derive(Debug, Clone, PartialEq)]
pub struct ImageDescription {
    pub codec: FourCc,
    pub version: u16,
    pub revision: u16,
    pub vendor: FourCc,
    pub temporal_quality: u32,
    pub spatial_quality: u32,
    pub width: u16,
    pub height: u16,
    pub h_res: FixedPoint,
    pub v_res: FixedPoint,
    pub data_size: u32,
    pub frame_count: u16,
    /// Compressor name
    pub name: String,
    /// Pixel depth; 33..=40 mean grey-scale of `depth - 32` bits
    pub depth: i16,
    /// Colour table resource id; 0 means a table follows the header
    pub clut_id: i16,
    pub color_table: Option<ColorTable>,
    /// Extension atoms, kept raw
    pub extensions: Vec<u8>,
}

impl ImageDescription {
    /// Minimal description, used by tests and callers building payloads
    pub fn new(codec: FourCc, width: u16, height: u16, depth: i16) -> Self {
        Self {
            codec,
            version: 0,
            revision: 0,
            vendor: FourCc::default(),
            temporal_quality: 0,
            spatial_quality: 0,
            width,
            height,
            h_res: FixedPoint::from(72i16),
            v_res: FixedPoint::from(72i16),
            data_size: 0,
            frame_count: 1,
            name: String::new(),
            depth,
            clut_id: -1,
            color_table: None,
            extensions: Vec::new(),
        }
    }

    /// Read a description; the reader ends up just past `idSize` bytes
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let header = reader.peek_bytes(IMAGE_DESCRIPTION_SIZE)?;
        let (raw, _) = RawImageDescription::read_from_prefix(header)
            .map_err(|_| Error::ParseError("Failed to parse image description".into()))?;
        let id_size = raw.id_size.get() as usize;
        if id_size < IMAGE_DESCRIPTION_SIZE {
            return Err(Error::InvalidLength {
                what: "image description",
                length: id_size as i64,
            });
        }
        let mut body = reader.sub_reader(id_size)?;
        body.skip(IMAGE_DESCRIPTION_SIZE)?;

        let depth = raw.depth.get();
        let clut_id = raw.clut_id.get();
        let color_table = if clut_id == 0 && (1..=8).contains(&depth) && body.remaining() >= 8 {
            Some(ColorTable::read(&mut body)?)
        } else {
            None
        };
        let extensions = body.rest().to_vec();

        let name_len = (raw.name[0] as usize).min(31);
        Ok(Self {
            codec: FourCc(raw.codec),
            version: raw.version.get(),
            revision: raw.revision.get(),
            vendor: FourCc(raw.vendor),
            temporal_quality: raw.temporal_quality.get(),
            spatial_quality: raw.spatial_quality.get(),
            width: raw.width.get(),
            height: raw.height.get(),
            h_res: FixedPoint::from_raw(raw.h_res.get()),
            v_res: FixedPoint::from_raw(raw.v_res.get()),
            data_size: raw.data_size.get(),
            frame_count: raw.frame_count.get(),
            name: decode_mac_roman(&raw.name[1..1 + name_len]),
            depth,
            clut_id,
            color_table,
            extensions,
        })
    }

    /// Bits per pixel with the grey-scale flag removed
    pub fn bits_per_pixel(&self) -> u16 {
        match self.depth {
            d @ 33..=40 => (d - 32) as u16,
            d => d.max(0) as u16,
        }
    }

    /// True for the grey-scale depths 33..=40
    pub fn is_grayscale(&self) -> bool {
        (33..=40).contains(&self.depth)
    }

    /// Palette for indexed depths: the embedded table, a grey ramp, or the
    /// standard Apple palette
    pub fn palette(&self) -> Result<ColorTable> {
        if let Some(table) = &self.color_table {
            return Ok(table.clone());
        }
        let bits = self.bits_per_pixel();
        if self.is_grayscale() {
            return ColorTable::grayscale(bits);
        }
        ColorTable::standard(bits).cloned()
    }

    /// Check a decoded frame size against the declared one
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<()> {
        if (width, height) != (self.width as u32, self.height as u32) {
            return Err(Error::DimensionMismatch {
                expected: (self.width as u32, self.height as u32),
                actual: (width, height),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Serialise a description header (no colour table)
    pub(crate) fn description_bytes(codec: &[u8; 4], width: u16, height: u16, depth: i16) -> Vec<u8> {
        let mut data = Vec::with_capacity(IMAGE_DESCRIPTION_SIZE);
        data.extend_from_slice(&(IMAGE_DESCRIPTION_SIZE as u32).to_be_bytes());
        data.extend_from_slice(codec);
        data.extend_from_slice(&[0; 8]);
        data.extend_from_slice(&[0, 0, 0, 0]);
        data.extend_from_slice(b"appl");
        data.extend_from_slice(&[0; 8]);
        data.extend_from_slice(&width.to_be_bytes());
        data.extend_from_slice(&height.to_be_bytes());
        data.extend_from_slice(&0x0048_0000u32.to_be_bytes());
        data.extend_from_slice(&0x0048_0000u32.to_be_bytes());
        data.extend_from_slice(&0u32.to_be_bytes());
        data.extend_from_slice(&1u16.to_be_bytes());
        let mut name = [0u8; 32];
        name[0] = 4;
        name[1..5].copy_from_slice(b"Test");
        data.extend_from_slice(&name);
        data.extend_from_slice(&depth.to_be_bytes());
        data.extend_from_slice(&(-1i16).to_be_bytes());
        data
    }

    #[test]
    fn test_read_description() {
        let data = description_bytes(b"rpza", 64, 48, 16);
        assert_eq!(data.len(), IMAGE_DESCRIPTION_SIZE);
        let mut reader = ByteReader::new(&data);
        let desc = ImageDescription::read(&mut reader).unwrap();
        assert_eq!(desc.codec, FourCc::new(b"rpza"));
        assert_eq!(desc.vendor.to_string(), "appl");
        assert_eq!((desc.width, desc.height), (64, 48));
        assert_eq!(desc.h_res.rounded(), 72);
        assert_eq!(desc.name, "Test");
        assert_eq!(desc.depth, 16);
        assert!(desc.color_table.is_none());
        assert!(reader.at_end());
    }

    #[test]
    fn test_grayscale_depth() {
        let desc = ImageDescription::new(FourCc::new(b"raw "), 1, 1, 40);
        assert!(desc.is_grayscale());
        assert_eq!(desc.bits_per_pixel(), 8);
        assert_eq!(desc.palette().unwrap().len(), 256);
    }

    #[test]
    fn test_dimension_check() {
        let desc = ImageDescription::new(FourCc::new(b"cvid"), 16, 16, 24);
        assert!(desc.check_dimensions(16, 16).is_ok());
        assert!(matches!(
            desc.check_dimensions(16, 8),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
