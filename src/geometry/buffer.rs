//! Minkowski-sum buffering composed from `geo` primitives
//!
//! A line is buffered by sweeping every segment into a capsule (the convex
//! hull of the two end disks) and dissolving all capsules with boolean union.

use geo::{BooleanOps, ConvexHull, Coord, LineString, MultiPoint, MultiPolygon, Point, Polygon};
use std::f64::consts::PI;

/// How round joins and caps are approximated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferStyle {
    /// Polygon vertices per quarter circle
    pub segments_per_quadrant: usize,
}

impl Default for BufferStyle {
    fn default() -> Self {
        Self {
            segments_per_quadrant: 8,
        }
    }
}

impl BufferStyle {
    pub fn new(segments_per_quadrant: usize) -> Self {
        Self {
            segments_per_quadrant: segments_per_quadrant.max(1),
        }
    }

    fn vertex_count(&self) -> usize {
        4 * self.segments_per_quadrant.max(1)
    }
}

fn circle_points(center: Coord<f64>, radius: f64, style: BufferStyle) -> Vec<Coord<f64>> {
    let n = style.vertex_count();
    (0..n)
        .map(|i| {
            let angle = 2.0 * PI * i as f64 / n as f64;
            Coord {
                x: center.x + radius * angle.cos(),
                y: center.y + radius * angle.sin(),
            }
        })
        .collect()
}

/// Regular polygon inscribed in the circle of `radius` around `center`
///
/// Vertices include the four axis extremes, so the polygon's envelope is
/// exactly `center ± radius`.
pub fn disk(center: Coord<f64>, radius: f64, style: BufferStyle) -> Polygon<f64> {
    let mut ring = circle_points(center, radius, style);
    ring.push(ring[0]);
    Polygon::new(LineString::new(ring), vec![])
}

/// Buffer of the segment `a`-`b`
///
/// The exact perpendicular offsets of both end points are added to the hull so
/// the long sides lie at exactly `radius` from the segment whatever its direction.
fn capsule(a: Coord<f64>, b: Coord<f64>, radius: f64, style: BufferStyle) -> Polygon<f64> {
    let mut points: Vec<Point<f64>> = circle_points(a, radius, style)
        .into_iter()
        .chain(circle_points(b, radius, style))
        .map(Point::from)
        .collect();

    let d = b - a;
    let len = d.x.hypot(d.y);
    if len > 0.0 {
        let normal = Coord {
            x: -d.y / len * radius,
            y: d.x / len * radius,
        };
        for c in [a + normal, a - normal, b + normal, b - normal] {
            points.push(Point::from(c));
        }
    }

    MultiPoint::new(points).convex_hull()
}

/// Buffer a line string by `radius`, dissolving every part into one multipolygon
///
/// Closed rings produce a band with an interior ring where the line enclosed
/// more than `2 * radius` of width.
pub fn buffer_line(line: &LineString<f64>, radius: f64, style: BufferStyle) -> MultiPolygon<f64> {
    match line.0.len() {
        0 => MultiPolygon::new(vec![]),
        1 => MultiPolygon::new(vec![disk(line.0[0], radius, style)]),
        _ => {
            let capsules = line
                .lines()
                .map(|segment| MultiPolygon::new(vec![capsule(segment.start, segment.end, radius, style)]))
                .collect();
            union_all(capsules)
        }
    }
}

/// Dissolve a set of multipolygons with a balanced pairwise union
pub fn union_all(mut parts: Vec<MultiPolygon<f64>>) -> MultiPolygon<f64> {
    while parts.len() > 1 {
        let mut merged = Vec::with_capacity(parts.len().div_ceil(2));
        let mut iter = parts.into_iter();
        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => merged.push(a.union(&b)),
                None => merged.push(a),
            }
        }
        parts = merged;
    }
    parts.pop().unwrap_or_else(|| MultiPolygon::new(vec![]))
}
