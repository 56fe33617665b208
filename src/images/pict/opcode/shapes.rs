// Shape drawing opcodes (0x30..=0x8F)

use crate::common::binary::ByteReader;
use crate::common::error::Result;
use crate::images::pict::region::Region;
use crate::images::pict::types::{Polygon, Rect};

/// Shape family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Rect,
    RoundRect,
    Oval,
    Arc,
    Polygon,
    Region,
}

/// Drawing verb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Outline with the pen
    Frame,
    /// Fill with the pen pattern
    Paint,
    /// Fill with the background pattern
    Erase,
    /// Invert covered pixels
    Invert,
    /// Fill with the fill pattern
    Fill,
}

/// Shape geometry as stored in the opcode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Geometry {
    /// Reuse the last shape of the same kind
    Same,
    Rect(Rect),
    /// `rect` is `None` for the same-arc opcodes, which store only angles
    Arc {
        rect: Option<Rect>,
        start_angle: i16,
        arc_angle: i16,
    },
    Polygon(Polygon),
    Region(Region),
}

impl Geometry {
    /// Read the payload for a shape opcode
    pub fn read(kind: ShapeKind, same: bool, reader: &mut ByteReader<'_>) -> Result<Self> {
        match (kind, same) {
            (ShapeKind::Arc, same) => {
                let rect = if same { None } else { Some(Rect::read(reader)?) };
                Ok(Geometry::Arc {
                    rect,
                    start_angle: reader.read_i16()?,
                    arc_angle: reader.read_i16()?,
                })
            },
            (_, true) => Ok(Geometry::Same),
            (ShapeKind::Rect | ShapeKind::RoundRect | ShapeKind::Oval, false) => {
                Ok(Geometry::Rect(Rect::read(reader)?))
            },
            (ShapeKind::Polygon, false) => Ok(Geometry::Polygon(Polygon::read(reader)?)),
            (ShapeKind::Region, false) => Ok(Geometry::Region(Region::read(reader)?)),
        }
    }

    /// Bounding box, when the opcode carries one
    pub fn bounds(&self) -> Option<Rect> {
        match self {
            Geometry::Same => None,
            Geometry::Rect(rect) => Some(*rect),
            Geometry::Arc { rect, .. } => *rect,
            Geometry::Polygon(polygon) => Some(polygon.bounds),
            Geometry::Region(region) => Some(region.bounds),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arc_payloads() {
        let data = [0, 0, 0, 0, 0, 10, 0, 10, 0, 90, 0, 45];
        let geometry = Geometry::read(ShapeKind::Arc, false, &mut ByteReader::new(&data)).unwrap();
        assert_eq!(
            geometry,
            Geometry::Arc {
                rect: Some(Rect::new(0, 0, 10, 10)),
                start_angle: 90,
                arc_angle: 45
            }
        );

        let geometry = Geometry::read(ShapeKind::Arc, true, &mut ByteReader::new(&data[8..])).unwrap();
        assert_eq!(geometry.bounds(), None);
    }

    #[test]
    fn test_same_shape_reads_nothing() {
        let mut reader = ByteReader::new(&[]);
        assert_eq!(
            Geometry::read(ShapeKind::Oval, true, &mut reader).unwrap(),
            Geometry::Same
        );
    }
}
