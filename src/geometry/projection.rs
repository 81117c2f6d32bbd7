use geo::{Coord, MapCoords, Rect};

/// Local equirectangular projection from WGS84 lon/lat to meters
///
/// - x = (lon - center_lon) * cos(center_lat) * 111320
/// - y = (lat - center_lat) * 111320
///
/// x depends only on longitude and y only on latitude, so axis-aligned
/// rectangles stay axis-aligned in both directions. Accurate enough for a
/// single island (tens of kilometers).
#[derive(Debug, Clone, Copy)]
pub struct Projector {
    center: Coord<f64>,
    cos_lat: f64,
}

// Meters per degree at the equator
const METERS_PER_DEGREE: f64 = 111320.0;

impl Projector {
    /// Create a projector centered at `center` (x = lon, y = lat)
    pub fn new(center: Coord<f64>) -> Self {
        Self {
            center,
            cos_lat: center.y.to_radians().cos(),
        }
    }

    /// Projector centered on the middle of a lon/lat bounding box
    pub fn for_extent(extent: Rect<f64>) -> Self {
        Self::new(extent.center())
    }

    /// Project a lon/lat coordinate to local meters
    pub fn project(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (c.x - self.center.x) * self.cos_lat * METERS_PER_DEGREE,
            y: (c.y - self.center.y) * METERS_PER_DEGREE,
        }
    }

    /// Inverse of [`Projector::project`]
    pub fn unproject(&self, c: Coord<f64>) -> Coord<f64> {
        Coord {
            x: c.x / (self.cos_lat * METERS_PER_DEGREE) + self.center.x,
            y: c.y / METERS_PER_DEGREE + self.center.y,
        }
    }

    pub fn project_geometry<G>(&self, geometry: &G) -> G
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geometry.map_coords(|c| self.project(c))
    }

    pub fn unproject_geometry<G>(&self, geometry: &G) -> G
    where
        G: MapCoords<f64, f64, Output = G>,
    {
        geometry.map_coords(|c| self.unproject(c))
    }
}
