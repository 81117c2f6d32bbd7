use geo::{Area, LineString, Polygon};

use crate::domain::{SanitizedShoreline, Shoreline};
use crate::error::{GridError, Result};
use crate::geometry::simplify_ring;

fn ring_area(ring: &LineString<f64>) -> f64 {
    Polygon::new(ring.clone(), vec![]).unsigned_area()
}

/// Reduce a raw shoreline to the exterior ring of its largest record
///
/// Every other record is discarded, interior rings of the kept record are
/// dropped, and consecutive duplicate vertices are collapsed. A positive
/// `simplify_tolerance` additionally applies Douglas-Peucker simplification.
pub fn sanitize(shoreline: &Shoreline, simplify_tolerance: f64) -> Result<SanitizedShoreline> {
    let (largest, area) = shoreline
        .records
        .iter()
        .map(|record| (record, ring_area(record.exterior())))
        .filter(|(_, area)| *area > 0.0)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .ok_or_else(|| GridError::EmptyShoreline(shoreline.island.clone()))?;

    log::debug!(
        "{}: kept ring of {:.0} m2, discarded {} of {} rings",
        shoreline.island,
        area,
        shoreline.ring_count() - 1,
        shoreline.ring_count()
    );

    let mut coords = largest.exterior().0.clone();
    coords.dedup();
    let mut ring = LineString::new(coords);
    ring.close();

    Ok(SanitizedShoreline {
        island: shoreline.island.clone(),
        ring: simplify_ring(&ring, simplify_tolerance),
    })
}
