use geo::{Coord, Rect};

use crate::domain::{Cell, SamplePoint};

/// Envelope of the disk of `radius` around `center`
///
/// The bounding box of a disk is the square `center ± (radius, radius)`, so it
/// is computed directly instead of from a polygonal circle.
pub fn footprint(center: Coord<f64>, radius: f64) -> Rect<f64> {
    let offset = Coord {
        x: radius,
        y: radius,
    };
    Rect::new(center - offset, center + offset)
}

/// One cell per sample point, ids assigned in input order from zero
pub fn build_cells(points: &[SamplePoint], radius: f64) -> Vec<Cell> {
    points
        .iter()
        .enumerate()
        .map(|(id, point)| Cell {
            id,
            center: point.position,
            rect: footprint(point.position, radius),
        })
        .collect()
}
