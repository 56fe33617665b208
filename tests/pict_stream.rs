//! End-to-end parsing of synthetic PICT streams through the public API.

use quickdraw::images::pict::opcode::{BitsKind, CommentKind, CommentPayload};
use quickdraw::{
    Error, FourCc, HeaderOffset, Opcode, OpcodeCategory, ParseOptions, ParseWarning, PictVersion, Picture,
    QuickTimeImage, Rect, extract_resources, parse_many,
};

/// Version 2 picture builder; opcodes are padded to even offsets
struct PictBuilder {
    data: Vec<u8>,
}

impl PictBuilder {
    fn new(bottom: i16, right: i16) -> Self {
        let mut data = vec![0, 0, 0, 0, 0, 0];
        data.extend_from_slice(&bottom.to_be_bytes());
        data.extend_from_slice(&right.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x11, 0x02, 0xFF]);
        Self { data }
    }

    fn opcode(mut self, number: u16, payload: &[u8]) -> Self {
        if self.data.len() % 2 != 0 {
            self.data.push(0);
        }
        self.data.extend_from_slice(&number.to_be_bytes());
        self.data.extend_from_slice(payload);
        self
    }

    fn finish(self) -> Vec<u8> {
        self.opcode(0x00FF, &[]).data
    }
}

fn rect(top: i16, left: i16, bottom: i16, right: i16) -> Vec<u8> {
    [top, left, bottom, right].iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// PackBitsRect payload: 8x2 pixels, 8 bits deep, every pixel index 1.
/// The colour table lists its entries in reverse order.
fn pack_bits_rect() -> Vec<u8> {
    let mut data = (8u16 | 0x8000).to_be_bytes().to_vec();
    data.extend(rect(0, 0, 2, 8));
    data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 0]);
    data.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    data.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    data.extend_from_slice(&[0, 0, 0, 8, 0, 1, 0, 8]);
    data.extend_from_slice(&[0; 12]);
    // Colour table: seed, flags, size - 1, then (value, r, g, b)
    data.extend_from_slice(&[0, 0, 0, 0, 0, 0, 0, 1]);
    data.extend_from_slice(&[0, 1, 0, 0, 0, 0, 0, 0]);
    data.extend_from_slice(&[0, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF]);
    data.extend(rect(0, 0, 2, 8));
    data.extend(rect(10, 10, 12, 18));
    data.extend_from_slice(&0i16.to_be_bytes());
    for _ in 0..2 {
        data.extend_from_slice(&[2, 0xF9, 1]);
    }
    data
}

/// DirectBitsRect payload: 70x2 pixels, 32 bits deep, three planes.
/// rowBytes is 280, so each row carries a word byte count.
fn direct_bits_rect() -> Vec<u8> {
    let mut data = vec![0, 0, 0, 0xFF];
    data.extend_from_slice(&(280u16 | 0x8000).to_be_bytes());
    data.extend(rect(0, 0, 2, 70));
    data.extend_from_slice(&[0, 0, 0, 4, 0, 0, 0, 0]);
    data.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    data.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    data.extend_from_slice(&[0, 16, 0, 32, 0, 3, 0, 8]);
    data.extend_from_slice(&[0; 12]);
    data.extend(rect(0, 0, 2, 70));
    data.extend(rect(0, 0, 2, 70));
    data.extend_from_slice(&0i16.to_be_bytes());
    for row in 0..2u8 {
        data.extend_from_slice(&6u16.to_be_bytes());
        data.extend_from_slice(&[0xBB, 0x40 + row, 0xBB, 0x50, 0xBB, 0x60]);
    }
    data
}

fn image_description(codec: &[u8; 4], width: u16, height: u16, depth: i16) -> Vec<u8> {
    let mut data = 86u32.to_be_bytes().to_vec();
    data.extend_from_slice(codec);
    data.extend_from_slice(&[0; 12]);
    data.extend_from_slice(b"appl");
    data.extend_from_slice(&[0; 8]);
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    data.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    data.extend_from_slice(&0x0048_0000u32.to_be_bytes());
    data.extend_from_slice(&0u32.to_be_bytes());
    data.extend_from_slice(&1u16.to_be_bytes());
    data.extend_from_slice(&[0; 32]);
    data.extend_from_slice(&depth.to_be_bytes());
    data.extend_from_slice(&(-1i16).to_be_bytes());
    data
}

/// CompressedQuickTime payload wrapping one image
fn compressed_quicktime(codec: &[u8; 4], width: u16, height: u16, depth: i16, pixels: &[u8]) -> Vec<u8> {
    let mut body = 0u16.to_be_bytes().to_vec();
    for i in 0..9 {
        let value: i32 = if i % 4 == 0 { 0x0001_0000 } else { 0 };
        body.extend_from_slice(&value.to_be_bytes());
    }
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend(rect(0, 0, 0, 0));
    body.extend_from_slice(&0u16.to_be_bytes());
    body.extend(rect(0, 0, height as i16, width as i16));
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend_from_slice(&0u32.to_be_bytes());
    body.extend(image_description(codec, width, height, depth));
    body.extend_from_slice(pixels);

    let mut data = (body.len() as u32).to_be_bytes().to_vec();
    data.extend(body);
    data
}

fn mixed_picture() -> Vec<u8> {
    let mut comment = 100u16.to_be_bytes().to_vec();
    comment.extend_from_slice(&6u16.to_be_bytes());
    comment.extend_from_slice(b"drw2\x01\x02");

    PictBuilder::new(40, 60)
        .opcode(0x0098, &pack_bits_rect())
        .opcode(0x00A1, &comment)
        .opcode(0x8200, &compressed_quicktime(b"raw ", 2, 1, 24, &[1, 2, 3, 4, 5, 6]))
        .finish()
}

#[test]
fn mixed_version_2_picture() {
    let picture = Picture::parse(&mixed_picture()).unwrap();
    assert_eq!(picture.version, PictVersion::V2);
    assert_eq!(picture.frame, Rect::new(0, 0, 40, 60));
    assert!(picture.is_complete(), "stopped with {:?}", picture.error);

    let categories: Vec<OpcodeCategory> = picture.opcodes.iter().map(Opcode::category).collect();
    assert_eq!(
        categories,
        vec![
            OpcodeCategory::Picture,
            OpcodeCategory::Raster,
            OpcodeCategory::Comment,
            OpcodeCategory::Raster,
            OpcodeCategory::Picture
        ]
    );

    let Opcode::Bits(bits) = &picture.opcodes[1] else {
        panic!("expected bits, got {:?}", picture.opcodes[1]);
    };
    assert_eq!(bits.kind, BitsKind::PackBits);
    assert_eq!(bits.dst_rect, Rect::new(10, 10, 12, 18));
    assert_eq!(bits.image.pixel_rgba(7, 1), Some([0, 0, 0, 0xFF]));

    let Opcode::Comment(comment) = &picture.opcodes[2] else {
        panic!("expected comment");
    };
    assert_eq!(comment.kind, CommentKind::ApplicationComment);
    assert!(matches!(
        &comment.payload,
        CommentPayload::Application { signature, .. } if *signature == FourCc::new(b"drw2")
    ));

    let rasters: Vec<_> = picture.rasters().collect();
    assert_eq!(rasters.len(), 2);
    assert_eq!(rasters[1].pixel_rgba(1, 0), Some([4, 5, 6, 0xFF]));

    // Reversed colour table entries are tolerated and reported
    assert_eq!(
        picture.warnings,
        vec![ParseWarning::ColorTableMismatch {
            offset: 14,
            opcode: 0x0098
        }]
    );
}

#[test]
fn wide_direct_bits_keep_stream_in_sync() {
    let data = PictBuilder::new(2, 70)
        .opcode(0x009A, &direct_bits_rect())
        .opcode(0x0031, &rect(0, 0, 2, 70))
        .finish();
    let picture = Picture::parse(&data).unwrap();
    assert!(picture.is_complete(), "stopped with {:?}", picture.error);
    assert_eq!(picture.opcodes.len(), 4);

    let Opcode::Bits(bits) = &picture.opcodes[1] else {
        panic!("expected direct bits, got {:?}", picture.opcodes[1]);
    };
    assert_eq!(bits.kind, BitsKind::DirectBits);
    assert_eq!(bits.image.pixel_rgba(0, 0), Some([0x40, 0x50, 0x60, 0xFF]));
    assert_eq!(bits.image.pixel_rgba(69, 1), Some([0x41, 0x50, 0x60, 0xFF]));
    assert_eq!(picture.opcodes[2].category(), OpcodeCategory::Shape);
}

#[test]
fn failed_codec_does_not_stop_picture() {
    let data = PictBuilder::new(4, 4)
        .opcode(0x8200, &compressed_quicktime(b"rpza", 4, 4, 16, &[0xE1, 0, 0, 9, 0x60]))
        .opcode(0x0031, &rect(0, 0, 4, 4))
        .finish();
    let picture = Picture::parse(&data).unwrap();
    assert!(picture.is_complete());
    assert_eq!(picture.opcodes.len(), 4);
    assert!(matches!(
        picture.warnings.as_slice(),
        [ParseWarning::ImageFailed { opcode: 0x8200, .. }]
    ));
}

#[test]
fn truncated_bitmap_keeps_earlier_opcodes() {
    let mut data = PictBuilder::new(10, 10).opcode(0x0034, &rect(1, 1, 5, 5)).finish();
    data.pop();
    data.pop();
    data.extend_from_slice(&0x0098u16.to_be_bytes());
    data.extend_from_slice(&pack_bits_rect()[..60]);

    let picture = Picture::parse(&data).unwrap();
    assert_eq!(picture.opcodes.len(), 2);
    assert!(matches!(picture.error, Some(Error::OutOfBounds { .. })));
}

#[test]
fn derez_resources_parse_like_files() {
    let picture_bytes = mixed_picture();
    let mut text = String::from("data 'PICT' (129, \"Mixed\") {\n");
    for chunk in picture_bytes.chunks(16) {
        let words: Vec<String> = chunk
            .chunks(2)
            .map(|pair| pair.iter().map(|b| format!("{:02X}", b)).collect())
            .collect();
        text.push_str(&format!("\t$\"{}\"\n", words.join(" ")));
    }
    text.push_str("};\n");

    let resources = extract_resources(&text).unwrap();
    assert_eq!(resources.len(), 1);
    assert_eq!(resources[0].file_name(), "Mixed.PICT");
    assert_eq!(resources[0].data, picture_bytes);

    let from_resource = Picture::parse(&resources[0].to_pict_file()).unwrap();
    let direct = Picture::parse(&picture_bytes).unwrap();
    assert_eq!(from_resource.opcodes, direct.opcodes);
}

#[test]
fn batch_parse_with_options() {
    let first = mixed_picture();
    let mut second = vec![0xAB; 512];
    second.extend(mixed_picture());

    let options = ParseOptions::default().with_decode_images(false);
    let results = parse_many(&[first.as_slice(), &second[512..]], &options);
    assert!(results.iter().all(|r| r.as_ref().is_ok_and(Picture::is_complete)));

    let picture = results[0].as_ref().unwrap();
    let Opcode::QuickTime(qt) = &picture.opcodes[3] else {
        panic!("expected QuickTime opcode");
    };
    assert!(matches!(qt.image(), Some(QuickTimeImage::Encoded { data, .. }) if data.len() == 6));

    let explicit = ParseOptions::default().with_header_offset(HeaderOffset::Explicit(512));
    let picture = Picture::parse_with_options(&second, &explicit).unwrap();
    assert!(picture.is_complete());
    assert_eq!(picture.rasters().count(), 2);
}
