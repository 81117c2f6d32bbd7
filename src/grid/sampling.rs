use geo::LineString;

use crate::domain::{Corridor, SamplePoint};
use crate::geometry::line_length;

/// Place points every `step` meters of arc length along a closed ring
///
/// The first point is the ring's start vertex. Points are placed at arc
/// lengths `0, step, 2 * step, ...` strictly below the ring length: the
/// closing vertex repeats the start and a short remainder gets no point.
pub fn sample_ring(ring: &LineString<f64>, step: f64, part: usize) -> Vec<SamplePoint> {
    let mut points = Vec::new();
    if !(step.is_finite() && step > 0.0) || ring.0.is_empty() {
        return points;
    }

    let total = line_length(ring);
    let limit = total - total * 1e-12;
    if total == 0.0 {
        points.push(SamplePoint {
            position: ring.0[0],
            offset: 0.0,
            part,
        });
        return points;
    }

    let mut k = 0usize;
    let mut target = 0.0;
    let mut start = 0.0;

    for segment in ring.lines() {
        let d = segment.delta();
        let len = d.x.hypot(d.y);
        if len == 0.0 {
            continue;
        }
        let end = start + len;

        while target < end && target < limit {
            let t = (target - start) / len;
            points.push(SamplePoint {
                position: segment.start + d * t,
                offset: target,
                part,
            });
            k += 1;
            target = k as f64 * step;
        }

        start = end;
    }

    points
}

/// Sample the exterior ring of every corridor polygon, in order
pub fn sample_corridor(corridor: &Corridor, step: f64) -> Vec<SamplePoint> {
    corridor
        .shape
        .iter()
        .enumerate()
        .flat_map(|(part, polygon)| sample_ring(polygon.exterior(), step, part))
        .collect()
}
