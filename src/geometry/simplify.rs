use geo::{LineString, Simplify};

/// Douglas-Peucker simplification of a closed ring
///
/// An `epsilon` of zero disables simplification. Rings that are already small,
/// or that would collapse below a triangle, are returned unchanged.
pub fn simplify_ring(ring: &LineString<f64>, epsilon: f64) -> LineString<f64> {
    if epsilon <= 0.0 || ring.0.len() < 5 {
        return ring.clone();
    }

    let simplified = ring.simplify(&epsilon);

    if simplified.0.len() < 4 {
        return ring.clone();
    }

    simplified
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::Coord;

    fn jagged_ring() -> LineString<f64> {
        // 100 m square with a 1 cm wobble on every meter of the bottom edge
        let mut coords: Vec<Coord<f64>> = (0..100)
            .map(|i| Coord {
                x: i as f64,
                y: if i % 2 == 0 { 0.0 } else { 0.01 },
            })
            .collect();
        coords.push(Coord { x: 100.0, y: 0.0 });
        coords.push(Coord { x: 100.0, y: 100.0 });
        coords.push(Coord { x: 0.0, y: 100.0 });
        coords.push(Coord { x: 0.0, y: 0.0 });
        LineString::new(coords)
    }

    #[test]
    fn test_zero_epsilon_is_identity() {
        let ring = jagged_ring();
        assert_eq!(simplify_ring(&ring, 0.0), ring);
    }

    #[test]
    fn test_simplify_reduces_points() {
        let ring = jagged_ring();
        let simplified = simplify_ring(&ring, 0.5);

        assert!(simplified.0.len() < ring.0.len());
        assert!(simplified.is_closed());
    }

    #[test]
    fn test_simplify_preserves_minimum() {
        let ring = jagged_ring();
        let simplified = simplify_ring(&ring, 1_000.0);
        assert!(simplified.0.len() >= 4);
    }
}
