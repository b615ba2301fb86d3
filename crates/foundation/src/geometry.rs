//! Feature and sketch geometry.
//!
//! Polygon types and predicates come from `geo`; this module bridges them to
//! [`Extent`] (the spatial index key) and [`Vec2`].

use geo::{BoundingRect, Coord, Point, Rect};

pub use geo::{LineString, MultiPolygon, Polygon};

use crate::bounds::Extent;
use crate::math::Vec2;

impl From<Rect<f64>> for Extent {
    fn from(rect: Rect<f64>) -> Self {
        Extent::new([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
    }
}

impl Extent {
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            Coord {
                x: self.min[0],
                y: self.min[1],
            },
            Coord {
                x: self.max[0],
                y: self.max[1],
            },
        )
    }

    /// Closed counter-clockwise rectangle covering the extent.
    pub fn to_polygon(&self) -> Polygon {
        self.to_rect().to_polygon()
    }
}

impl From<Coord<f64>> for Vec2 {
    fn from(c: Coord<f64>) -> Self {
        Vec2::new(c.x, c.y)
    }
}

impl From<Point<f64>> for Vec2 {
    fn from(p: Point<f64>) -> Self {
        Vec2::new(p.x(), p.y())
    }
}

/// Bounding extent of any polygonal geometry; `None` when it has no vertices.
pub fn extent_of<G>(geometry: &G) -> Option<Extent>
where
    G: BoundingRect<f64, Output = Option<Rect<f64>>>,
{
    geometry.bounding_rect().map(Extent::from)
}

/// Ring vertices without the closing duplicate `geo` keeps on every ring.
pub fn open_ring(ring: &LineString) -> Vec<Vec2> {
    let mut points: Vec<Vec2> = ring.coords().map(|c| Vec2::from(*c)).collect();
    if points.len() >= 2 && points.first() == points.last() {
        points.pop();
    }
    points
}

/// False for polygons whose exterior cannot enclose any area.
pub fn is_areal(polygon: &Polygon) -> bool {
    open_ring(polygon.exterior()).len() >= 3
}
