//! Geometry primitives used across the PICT format
//!
//! QuickDraw stores coordinates as 16-bit integers, vertical first. They are
//! widened to 16.16 fixed point here so that header bounding boxes and
//! resolution-scaled frames share one representation.

use crate::common::binary::ByteReader;
use crate::common::error::Result;
use crate::common::fixed::FixedPoint;
use std::ops::{Add, Sub};

/// A point in QuickDraw coordinate space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub h: FixedPoint,
    pub v: FixedPoint,
}

impl Point {
    pub const ZERO: Self = Self {
        h: FixedPoint::ZERO,
        v: FixedPoint::ZERO,
    };

    /// Point from integer coordinates
    pub fn new(h: i16, v: i16) -> Self {
        Self {
            h: h.into(),
            v: v.into(),
        }
    }

    /// Read a point stored as `v, h` 16-bit integers
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let v = reader.read_i16()?;
        let h = reader.read_i16()?;
        Ok(Self::new(h, v))
    }

    /// Read a point stored as `v, h` fixed-point values
    pub fn read_fixed(reader: &mut ByteReader<'_>) -> Result<Self> {
        let v = reader.read_fixed()?;
        let h = reader.read_fixed()?;
        Ok(Self { h, v })
    }
}

impl Add<Delta> for Point {
    type Output = Point;

    fn add(self, delta: Delta) -> Point {
        Point {
            h: self.h + delta.dh,
            v: self.v + delta.dv,
        }
    }
}

impl Sub for Point {
    type Output = Delta;

    fn sub(self, other: Point) -> Delta {
        Delta {
            dh: self.h - other.h,
            dv: self.v - other.v,
        }
    }
}

/// Difference between two points
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Delta {
    pub dh: FixedPoint,
    pub dv: FixedPoint,
}

impl Delta {
    pub const ZERO: Self = Self {
        dh: FixedPoint::ZERO,
        dv: FixedPoint::ZERO,
    };

    pub fn new(dh: i16, dv: i16) -> Self {
        Self {
            dh: dh.into(),
            dv: dv.into(),
        }
    }

    /// Read a delta stored as `dh, dv` 16-bit integers (origin opcode order)
    pub fn read_hv(reader: &mut ByteReader<'_>) -> Result<Self> {
        let dh = reader.read_i16()?;
        let dv = reader.read_i16()?;
        Ok(Self::new(dh, dv))
    }

    /// Read a delta stored as signed `dh, dv` bytes (short line opcodes)
    pub fn read_short(reader: &mut ByteReader<'_>) -> Result<Self> {
        let dh = reader.read_i8()?;
        let dv = reader.read_i8()?;
        Ok(Self {
            dh: dh.into(),
            dv: dv.into(),
        })
    }
}

impl Add for Delta {
    type Output = Delta;

    fn add(self, other: Delta) -> Delta {
        Delta {
            dh: self.dh + other.dh,
            dv: self.dv + other.dv,
        }
    }
}

/// Rectangle defined by its top-left and bottom-right corners
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Rect {
    pub top_left: Point,
    pub bottom_right: Point,
}

impl Rect {
    pub const EMPTY: Self = Self {
        top_left: Point::ZERO,
        bottom_right: Point::ZERO,
    };

    /// Rectangle from integer edges in QuickDraw order
    pub fn new(top: i16, left: i16, bottom: i16, right: i16) -> Self {
        Self {
            top_left: Point::new(left, top),
            bottom_right: Point::new(right, bottom),
        }
    }

    /// Read a rectangle stored as `top, left, bottom, right`
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let top_left = Point::read(reader)?;
        let bottom_right = Point::read(reader)?;
        Ok(Self {
            top_left,
            bottom_right,
        })
    }

    /// Read a rectangle of four fixed-point edges
    pub fn read_fixed(reader: &mut ByteReader<'_>) -> Result<Self> {
        let top_left = Point::read_fixed(reader)?;
        let bottom_right = Point::read_fixed(reader)?;
        Ok(Self {
            top_left,
            bottom_right,
        })
    }

    #[inline]
    pub fn top(&self) -> FixedPoint {
        self.top_left.v
    }

    #[inline]
    pub fn left(&self) -> FixedPoint {
        self.top_left.h
    }

    #[inline]
    pub fn bottom(&self) -> FixedPoint {
        self.bottom_right.v
    }

    #[inline]
    pub fn right(&self) -> FixedPoint {
        self.bottom_right.h
    }

    /// `bottom_right - top_left`
    #[inline]
    pub fn dimensions(&self) -> Delta {
        self.bottom_right - self.top_left
    }

    /// Width rounded to whole pixels
    #[inline]
    pub fn width(&self) -> i32 {
        self.dimensions().dh.rounded()
    }

    /// Height rounded to whole pixels
    #[inline]
    pub fn height(&self) -> i32 {
        self.dimensions().dv.rounded()
    }

    /// True when the rectangle has no area
    pub fn is_empty(&self) -> bool {
        let d = self.dimensions();
        d.dh.raw() <= 0 || d.dv.raw() <= 0
    }

    /// Rectangle moved by `delta`
    pub fn offset(&self, delta: Delta) -> Self {
        Self {
            top_left: self.top_left + delta,
            bottom_right: self.bottom_right + delta,
        }
    }

    /// True if the two rectangles share any area
    pub fn intersects(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

/// Polygon: bounding box plus vertices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polygon {
    pub bounds: Rect,
    pub points: Vec<Point>,
}

impl Polygon {
    /// Read a polygon; the leading size word counts itself
    pub fn read(reader: &mut ByteReader<'_>) -> Result<Self> {
        let size = reader.read_u16()? as usize;
        if size < 10 {
            return Err(crate::common::error::Error::InvalidLength {
                what: "polygon",
                length: size as i64,
            });
        }
        let bounds = Rect::read(reader)?;
        let count = (size - 10) / 4;
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            points.push(Point::read(reader)?);
        }
        // Odd trailing bytes are padding
        reader.skip((size - 10) % 4)?;
        Ok(Self { bounds, points })
    }

    /// True if the last vertex repeats the first
    pub fn is_closed(&self) -> bool {
        self.points.len() > 1 && self.points.first() == self.points.last()
    }
}
