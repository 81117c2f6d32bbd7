use geo::{BoundingRect, Coord, Intersects, Polygon, Rect, coord};
use geojson::JsonValue;
use image::{GrayImage, Luma};
use std::path::Path;

use super::world_file::WorldFile;
use crate::error::Result;
use crate::io::{PolygonFeature, read_polygon_features};

#[derive(Debug, Clone)]
struct LabeledPolygon {
    polygon: Polygon<f64>,
    bbox: Rect<f64>,
    label: u8,
}

impl LabeledPolygon {
    fn covers(&self, point: &Coord<f64>) -> bool {
        self.bbox.intersects(point) && self.polygon.intersects(point)
    }
}

/// Habitat polygons with integer class labels, ready to burn into masks
#[derive(Debug, Clone)]
pub struct HabitatLayer {
    polygons: Vec<LabeledPolygon>,
    background: u8,
}

/// Integer label of a feature; numeric strings are accepted as written by shapefile exports
fn feature_label(value: &JsonValue) -> Option<u8> {
    match value {
        JsonValue::Number(n) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        JsonValue::String(s) => s.trim().parse::<u8>().ok(),
        _ => None,
    }
}

impl HabitatLayer {
    /// Build from polygon features; those without a usable `label_field` are skipped
    pub fn from_features(features: Vec<PolygonFeature>, label_field: &str, background: u8) -> Self {
        let total = features.len();
        let polygons: Vec<LabeledPolygon> = features
            .into_iter()
            .filter_map(|f| {
                let label = f.properties.get(label_field).and_then(feature_label)?;
                let bbox = f.polygon.bounding_rect()?;
                Some(LabeledPolygon {
                    polygon: f.polygon,
                    bbox,
                    label,
                })
            })
            .collect();

        if polygons.len() < total {
            log::warn!(
                "{} of {} habitat polygons have no integer '{}' and were ignored",
                total - polygons.len(),
                total,
                label_field
            );
        }

        Self {
            polygons,
            background,
        }
    }

    pub fn open(path: &Path, label_field: &str, background: u8) -> Result<Self> {
        let features = read_polygon_features(path)?;
        log::debug!("Read {} habitat polygons from {}", features.len(), path.display());
        Ok(Self::from_features(features, label_field, background))
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    fn candidates(&self, window: &Rect<f64>) -> Vec<&LabeledPolygon> {
        self.polygons
            .iter()
            .filter(|p| p.bbox.intersects(window))
            .collect()
    }

    /// Label at a world coordinate; later polygons are drawn over earlier ones
    pub fn label_at(&self, x: f64, y: f64) -> u8 {
        let point = coord! { x: x, y: y };
        self.polygons
            .iter()
            .rev()
            .find(|p| p.covers(&point))
            .map_or(self.background, |p| p.label)
    }

    /// Burn the layer into a `width × height` mask sampled at pixel centers
    pub fn rasterize(&self, transform: &WorldFile, width: u32, height: u32) -> GrayImage {
        let mut mask = GrayImage::from_pixel(width, height, Luma([self.background]));
        if width == 0 || height == 0 {
            return mask;
        }

        let (x0, y0) = transform.pixel_center(0, 0);
        let (x1, y1) = transform.pixel_center(width - 1, height - 1);
        let window = Rect::new(coord! { x: x0, y: y0 }, coord! { x: x1, y: y1 });
        let candidates = self.candidates(&window);
        if candidates.is_empty() {
            return mask;
        }

        for (col, row, pixel) in mask.enumerate_pixels_mut() {
            let (x, y) = transform.pixel_center(col, row);
            let point = coord! { x: x, y: y };
            if let Some(hit) = candidates.iter().rev().find(|p| p.covers(&point)) {
                *pixel = Luma([hit.label]);
            }
        }
        mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use geojson::JsonObject;

    fn feature(polygon: Polygon<f64>, label: JsonValue) -> PolygonFeature {
        let mut properties = JsonObject::new();
        properties.insert("label".to_string(), label);
        PolygonFeature {
            polygon,
            properties,
        }
    }

    fn square(x0: f64, y0: f64, size: f64) -> Polygon<f64> {
        polygon![
            (x: x0, y: y0),
            (x: x0 + size, y: y0),
            (x: x0 + size, y: y0 + size),
            (x: x0, y: y0 + size),
        ]
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(feature_label(&JsonValue::from(4)), Some(4));
        assert_eq!(feature_label(&JsonValue::from("15")), Some(15));
        assert_eq!(feature_label(&JsonValue::from(300)), None);
        assert_eq!(feature_label(&JsonValue::from(-1)), None);
        assert_eq!(feature_label(&JsonValue::Null), None);
    }

    #[test]
    fn test_unlabeled_features_skipped() {
        let features = vec![
            feature(square(0.0, 0.0, 10.0), JsonValue::from(1)),
            feature(square(0.0, 0.0, 10.0), JsonValue::from("sand")),
            PolygonFeature {
                polygon: square(0.0, 0.0, 10.0),
                properties: JsonObject::new(),
            },
        ];

        let layer = HabitatLayer::from_features(features, "label", 0);
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_label_at_prefers_later_polygon() {
        let layer = HabitatLayer::from_features(
            vec![
                feature(square(0.0, 0.0, 10.0), JsonValue::from(2)),
                feature(square(5.0, 5.0, 10.0), JsonValue::from(4)),
            ],
            "label",
            0,
        );

        assert_eq!(layer.label_at(1.0, 1.0), 2);
        assert_eq!(layer.label_at(7.0, 7.0), 4);
        assert_eq!(layer.label_at(50.0, 50.0), 0);
    }

    #[test]
    fn test_rasterize_at_pixel_centers() {
        // Left half of a 4 x 4 tile at 1 m covered by label 3
        let layer = HabitatLayer::from_features(
            vec![feature(
                polygon![
                    (x: 100.0, y: 196.0),
                    (x: 102.0, y: 196.0),
                    (x: 102.0, y: 200.0),
                    (x: 100.0, y: 200.0),
                ],
                JsonValue::from(3),
            )],
            "label",
            0,
        );
        let transform = WorldFile::north_up(100.0, 200.0, 1.0);

        let mask = layer.rasterize(&transform, 4, 4);

        for row in 0..4 {
            assert_eq!(mask.get_pixel(0, row).0[0], 3);
            assert_eq!(mask.get_pixel(1, row).0[0], 3);
            assert_eq!(mask.get_pixel(2, row).0[0], 0);
            assert_eq!(mask.get_pixel(3, row).0[0], 0);
        }
    }

    #[test]
    fn test_rasterize_outside_layer_is_background() {
        let layer = HabitatLayer::from_features(
            vec![feature(square(0.0, 0.0, 10.0), JsonValue::from(1))],
            "label",
            7,
        );
        let mask = layer.rasterize(&WorldFile::north_up(1000.0, 1000.0, 1.0), 3, 3);
        assert!(mask.pixels().all(|p| p.0[0] == 7));
    }
}
