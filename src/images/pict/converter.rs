// Decoded raster to `image` conversion
//
// Expands any `RasterImage` layout (indexed, 16-bit, 24-bit, 32-bit) into
// an RGBA buffer and encodes it with the `image` crate.

use crate::common::error::{Error, Result};
use crate::images::raster::RasterImage;
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

impl RasterImage {
    /// Expand to 8-bit RGBA
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width(), self.height(), |x, y| {
            // Indices past the end of a short colour table come out transparent
            Rgba(self.pixel_rgba(x, y).unwrap_or([0, 0, 0, 0]))
        })
    }

    /// Encode in the given format
    pub fn convert_to_format(&self, format: ImageFormat) -> Result<Vec<u8>> {
        let image = self.to_rgba_image();
        let mut buffer = Cursor::new(Vec::new());
        image
            .write_to(&mut buffer, format)
            .map_err(|e| Error::ParseError(format!("Failed to encode image: {}", e)))?;
        Ok(buffer.into_inner())
    }

    /// Encode as PNG
    pub fn convert_to_png(&self) -> Result<Vec<u8>> {
        self.convert_to_format(ImageFormat::Png)
    }
}

#[cfg(test)]
mod tests {
    use crate::images::pict::color::{ColorTable, RgbColor};
    use crate::images::raster::{PixMapMetadata, RasterImage};

    #[test]
    fn test_indexed_expansion() {
        let table = ColorTable::new(vec![RgbColor::WHITE, RgbColor::new(0xFFFF, 0, 0)]);
        let image = RasterImage::new(PixMapMetadata::indexed(2, 1, 8, table), vec![1, 0]).unwrap();
        let rgba = image.to_rgba_image();
        assert_eq!(rgba.get_pixel(0, 0).0, [0xFF, 0, 0, 0xFF]);
        assert_eq!(rgba.get_pixel(1, 0).0, [0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn test_short_table_is_transparent() {
        let table = ColorTable::new(vec![RgbColor::BLACK]);
        let image = RasterImage::new(PixMapMetadata::indexed(1, 1, 8, table), vec![7]).unwrap();
        assert_eq!(image.to_rgba_image().get_pixel(0, 0).0, [0, 0, 0, 0]);
    }

    #[test]
    fn test_png_signature() {
        let image = RasterImage::new(PixMapMetadata::rgb(1, 1), vec![1, 2, 3]).unwrap();
        let png = image.convert_to_png().unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
    }
}
