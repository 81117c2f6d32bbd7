use geo::{Coord, Point, Polygon, Rect};

/// A point on a corridor boundary, `offset` meters of arc length from the ring start
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SamplePoint {
    pub position: Coord<f64>,
    pub offset: f64,
    /// Index of the corridor polygon whose exterior the point lies on
    pub part: usize,
}

impl SamplePoint {
    pub fn point(&self) -> Point<f64> {
        Point::from(self.position)
    }
}

/// Axis-aligned sampling footprint; `id` names the extracted tile pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub id: usize,
    pub center: Coord<f64>,
    pub rect: Rect<f64>,
}

impl Cell {
    pub fn width(&self) -> f64 {
        self.rect.width()
    }

    pub fn height(&self) -> f64 {
        self.rect.height()
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        self.rect.to_polygon()
    }
}
