//! QuickDraw region codec
//!
//! A region is a bounding box plus, for non-rectangular shapes, a list of
//! scanline records. Each record is a line number followed by pairs of
//! horizontal inversion points terminated by `0x7FFF`; a line number of
//! `0x7FFF` ends the region. The records encode edges, so each mask row is
//! XORed with the row above to recover coverage. The coverage grid is then
//! turned back into a small set of rectangles.

use super::types::Rect;
use crate::common::binary::ByteReader;
use crate::common::error::{Error, Result};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Scanline and span terminator
const REGION_END: i16 = 0x7FFF;

/// Size of the `rgnSize` word plus the bounding box
const REGION_HEADER_SIZE: usize = 10;

/// Decoded region
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Bounding box
    pub bounds: Rect,
    /// Rectangles covering the region; empty for a rectangular region
    pub rects: Vec<Rect>,
    /// Row-major coverage mask, one byte per pixel (`0xFF` inside)
    pub mask: Vec<u8>,
}

impl Region {
    /// Rectangular region
    pub fn rectangle(bounds: Rect) -> Self {
        Self {
            bounds,
            rects: Vec::new(),
            mask: Vec::new(),
        }
    }

    /// True when the region is its bounding box
    pub fn is_rect(&self) -> bool {
        self.rects.is_empty()
    }

    /// Read a region record (`rgnSize`, bounding box, scanline words)
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let size = reader.read_u16()? as usize;
        if size < REGION_HEADER_SIZE {
            return Err(Error::CorruptRegion(format!("region size {} too small", size)));
        }
        let bounds = Rect::read(reader)?;
        let payload = reader.read_bytes(size - REGION_HEADER_SIZE)?;
        if payload.is_empty() {
            return Ok(Self::rectangle(bounds));
        }
        let words: Vec<i16> = payload
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Self::decode(bounds, &words)
    }

    /// Decode scanline words against a bounding box
    pub fn decode(bounds: Rect, words: &[i16]) -> Result<Self> {
        if words.is_empty() {
            return Ok(Self::rectangle(bounds));
        }
        let width = bounds.width();
        let height = bounds.height();
        if width <= 0 || height <= 0 {
            return Err(Error::CorruptRegion(format!(
                "bounding box {}x{} has no area",
                width, height
            )));
        }
        let (width, height) = (width as usize, height as usize);
        let top = bounds.top().rounded();
        let left = bounds.left().rounded();

        let mut mask = vec![0u8; width * height];
        let mut words = words.iter().copied();
        loop {
            let line = match words.next() {
                Some(REGION_END) | None => break,
                Some(line) => line as i32 - top,
            };
            if line < 0 || line as usize > height {
                return Err(Error::CorruptRegion(format!(
                    "line {} outside bounding box",
                    line + top
                )));
            }
            loop {
                let start = match words.next() {
                    Some(REGION_END) | None => break,
                    Some(h) => h as i32 - left,
                };
                let end = match words.next() {
                    Some(REGION_END) | None => {
                        return Err(Error::CorruptRegion("unpaired span start".into()));
                    },
                    Some(h) => h as i32 - left,
                };
                if start < 0 || end < start || end as usize > width {
                    return Err(Error::CorruptRegion(format!(
                        "span {}..{} outside bounding box",
                        start + left,
                        end + left
                    )));
                }
                // The closing line sits on the bottom edge and has no row
                if (line as usize) < height {
                    let row = line as usize * width;
                    mask[row + start as usize..row + end as usize].fill(0xFF);
                }
            }
        }

        for y in 1..height {
            let (previous, current) = mask.split_at_mut(y * width);
            let previous = &previous[(y - 1) * width..];
            for (cell, above) in current[..width].iter_mut().zip(previous) {
                *cell ^= above;
            }
        }

        let rects = vectorize(&mask, width, height, top, left);
        Ok(Self {
            bounds,
            rects,
            mask,
        })
    }

    /// True if the pixel at picture coordinates (`h`, `v`) is inside
    pub fn contains(&self, h: i32, v: i32) -> bool {
        let x = h - self.bounds.left().rounded();
        let y = v - self.bounds.top().rounded();
        let width = self.bounds.width();
        if x < 0 || y < 0 || x >= width || y >= self.bounds.height() {
            return false;
        }
        if self.is_rect() {
            return true;
        }
        self.mask
            .get(y as usize * width as usize + x as usize)
            .is_some_and(|&b| b != 0)
    }
}

/// Maximal runs of covered columns in one mask row, as `(start, end)`
fn row_runs(row: &[u8]) -> SmallVec<[(usize, usize); 8]> {
    let mut runs = SmallVec::new();
    let mut start = None;
    for (x, &cell) in row.iter().enumerate() {
        match (cell != 0, start) {
            (true, None) => start = Some(x),
            (false, Some(s)) => {
                runs.push((s, x));
                start = None;
            },
            _ => {},
        }
    }
    if let Some(s) = start {
        runs.push((s, row.len()));
    }
    runs
}

/// Merge row runs into rectangles
///
/// A run continues an open rectangle only when both its start and end
/// columns match the previous row; anything else closes the old rectangle
/// and opens a new one.
fn vectorize(mask: &[u8], width: usize, height: usize, top: i32, left: i32) -> Vec<Rect> {
    // start column -> (end column, first row)
    let mut open: BTreeMap<usize, (usize, usize)> = BTreeMap::new();
    let mut rects = Vec::new();
    let emit = |rects: &mut Vec<Rect>, start: usize, end: usize, first: usize, last: usize| {
        rects.push(Rect::new(
            (top + first as i32) as i16,
            (left + start as i32) as i16,
            (top + last as i32) as i16,
            (left + end as i32) as i16,
        ));
    };

    for y in 0..height {
        let runs = row_runs(&mask[y * width..(y + 1) * width]);
        let mut next = BTreeMap::new();
        for &(start, end) in &runs {
            match open.remove(&start) {
                Some((open_end, first)) if open_end == end => {
                    next.insert(start, (end, first));
                },
                Some((open_end, first)) => {
                    emit(&mut rects, start, open_end, first, y);
                    next.insert(start, (end, y));
                },
                None => {
                    next.insert(start, (end, y));
                },
            }
        }
        for (start, (end, first)) in open {
            emit(&mut rects, start, end, first, y);
        }
        open = next;
    }
    for (start, (end, first)) in open {
        emit(&mut rects, start, end, first, height);
    }
    rects
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region_bytes(bounds: (i16, i16, i16, i16), words: &[i16]) -> Vec<u8> {
        let size = REGION_HEADER_SIZE + words.len() * 2;
        let mut data = (size as u16).to_be_bytes().to_vec();
        for v in [bounds.0, bounds.1, bounds.2, bounds.3] {
            data.extend_from_slice(&v.to_be_bytes());
        }
        for w in words {
            data.extend_from_slice(&w.to_be_bytes());
        }
        data
    }

    #[test]
    fn test_rectangular_region() {
        let data = region_bytes((0, 0, 10, 20), &[]);
        let region = Region::read(&mut ByteReader::new(&data)).unwrap();
        assert!(region.is_rect());
        assert_eq!(region.bounds, Rect::new(0, 0, 10, 20));
        assert!(region.contains(19, 9));
        assert!(!region.contains(20, 9));
    }

    #[test]
    fn test_solid_region_is_one_rect() {
        let words = [10, 5, 15, 0x7FFF, 14, 5, 15, 0x7FFF, 0x7FFF];
        let data = region_bytes((10, 5, 14, 15), &words);
        let region = Region::read(&mut ByteReader::new(&data)).unwrap();
        assert_eq!(region.rects, vec![Rect::new(10, 5, 14, 15)]);
        assert!(region.mask.iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_disjoint_spans_give_two_rects() {
        // Two columns, 0..2 and 4..6, over rows 0..3
        let words = [0, 0, 2, 4, 6, 0x7FFF, 3, 0, 2, 4, 6, 0x7FFF, 0x7FFF];
        let data = region_bytes((0, 0, 3, 6), &words);
        let region = Region::read(&mut ByteReader::new(&data)).unwrap();
        assert_eq!(region.rects.len(), 2);
        assert!(region.rects.contains(&Rect::new(0, 0, 3, 2)));
        assert!(region.rects.contains(&Rect::new(0, 4, 3, 6)));
        assert!(!region.rects[0].intersects(&region.rects[1]));
        assert!(region.contains(1, 1));
        assert!(!region.contains(3, 1));
    }

    #[test]
    fn test_l_shape() {
        // Rows 0..2 cover 0..4, rows 2..4 cover 0..2
        let words = [0, 0, 4, 0x7FFF, 2, 2, 4, 0x7FFF, 4, 0, 2, 0x7FFF, 0x7FFF];
        let region = Region::decode(Rect::new(0, 0, 4, 4), &words).unwrap();
        assert_eq!(
            region.rects,
            vec![Rect::new(0, 0, 2, 4), Rect::new(2, 0, 4, 2)]
        );
    }

    #[test]
    fn test_span_outside_bounds() {
        let words = [0, 0, 40, 0x7FFF, 0x7FFF];
        assert!(matches!(
            Region::decode(Rect::new(0, 0, 4, 4), &words),
            Err(Error::CorruptRegion(_))
        ));
    }

    #[test]
    fn test_empty_bounds_with_data() {
        let words = [0, 0, 1, 0x7FFF, 0x7FFF];
        assert!(matches!(
            Region::decode(Rect::new(0, 0, 0, 4), &words),
            Err(Error::CorruptRegion(_))
        ));
    }
}
