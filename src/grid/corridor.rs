use geo::{Area, LineString, MultiPolygon, Polygon};

use crate::domain::{Corridor, SanitizedShoreline};
use crate::geometry::{BufferStyle, buffer_line};

fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), vec![]).unsigned_area()
}

/// Buffer the shoreline boundary by `radius` meters into a single dissolved corridor
pub fn build_corridor(shoreline: &SanitizedShoreline, radius: f64, style: BufferStyle) -> Corridor {
    let shape = buffer_line(&shoreline.ring, radius, style);

    log::debug!(
        "{}: corridor of {} part(s), {:.0} m2",
        shoreline.island,
        shape.0.len(),
        shape.unsigned_area()
    );

    Corridor {
        island: shoreline.island.clone(),
        shape,
    }
}

/// Eliminate interior rings covering at least `threshold` of their parent ring's area
///
/// Each interior ring is judged on its own against the exterior of the polygon
/// that contains it; smaller gaps are kept.
pub fn filter_corridor(corridor: &Corridor, threshold: f64) -> Corridor {
    let mut eliminated = 0;

    let polygons = corridor
        .shape
        .iter()
        .map(|polygon| {
            let parent_area = ring_area(polygon.exterior());
            let kept: Vec<LineString<f64>> = polygon
                .interiors()
                .iter()
                .filter(|ring| {
                    let keep = ring_area(ring) < threshold * parent_area;
                    if !keep {
                        eliminated += 1;
                    }
                    keep
                })
                .cloned()
                .collect();
            Polygon::new(polygon.exterior().clone(), kept)
        })
        .collect();

    log::debug!(
        "{}: eliminated {} interior ring(s)",
        corridor.island,
        eliminated
    );

    Corridor {
        island: corridor.island.clone(),
        shape: MultiPolygon::new(polygons),
    }
}
