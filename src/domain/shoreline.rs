use geo::{Area, LineString, MultiPolygon, Polygon};

use crate::geometry::line_length;

/// Raw coastline of one island as read from its vector file
///
/// Each record is one polygon (exterior plus interior rings); slivers, offshore
/// rocks and duplicated parts all show up as extra records.
#[derive(Debug, Clone)]
pub struct Shoreline {
    pub island: String,
    pub records: Vec<Polygon<f64>>,
}

impl Shoreline {
    pub fn new(island: impl Into<String>, records: Vec<Polygon<f64>>) -> Self {
        Self {
            island: island.into(),
            records,
        }
    }

    pub fn ring_count(&self) -> usize {
        self.records.iter().map(|p| 1 + p.interiors().len()).sum()
    }
}

/// A shoreline reduced to the exterior ring of its largest record
#[derive(Debug, Clone)]
pub struct SanitizedShoreline {
    pub island: String,
    pub ring: LineString<f64>,
}

impl SanitizedShoreline {
    pub fn area(&self) -> f64 {
        self.to_polygon().unsigned_area()
    }

    pub fn perimeter(&self) -> f64 {
        line_length(&self.ring)
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(self.ring.clone(), vec![])
    }
}

/// Band of constant width around a shoreline, dissolved into one multipolygon
#[derive(Debug, Clone)]
pub struct Corridor {
    pub island: String,
    pub shape: MultiPolygon<f64>,
}

impl Corridor {
    pub fn interior_count(&self) -> usize {
        self.shape.iter().map(|p| p.interiors().len()).sum()
    }

    pub fn area(&self) -> f64 {
        self.shape.unsigned_area()
    }
}
