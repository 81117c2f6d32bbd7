use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use std::path::Path;

use crate::domain::{Cell, Corridor, SamplePoint, SanitizedShoreline, Shoreline};
use crate::error::{GridError, Result};

/// Polygon read from a vector file together with its attribute table row
#[derive(Debug, Clone)]
pub struct PolygonFeature {
    pub polygon: Polygon<f64>,
    pub properties: JsonObject,
}

fn read_features(path: &Path) -> Result<Vec<Feature>> {
    let contents = std::fs::read_to_string(path)?;
    let features = match contents.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(geometry) => vec![Feature {
            bbox: None,
            geometry: Some(geometry),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };
    Ok(features)
}

fn to_coord(position: &[f64], path: &Path) -> Result<Coord<f64>> {
    match position {
        [x, y, ..] => Ok(Coord { x: *x, y: *y }),
        _ => Err(GridError::UnsupportedGeometry {
            path: path.to_path_buf(),
            kind: format!("position with {} value(s)", position.len()),
        }),
    }
}

fn to_ring(positions: &[Vec<f64>], path: &Path) -> Result<LineString<f64>> {
    let coords = positions
        .iter()
        .map(|p| to_coord(p, path))
        .collect::<Result<Vec<_>>>()?;
    let mut ring = LineString::new(coords);
    ring.close();
    Ok(ring)
}

fn to_polygon(rings: &[Vec<Vec<f64>>], path: &Path) -> Result<Option<Polygon<f64>>> {
    let Some((exterior, interiors)) = rings.split_first() else {
        return Ok(None);
    };
    let exterior = to_ring(exterior, path)?;
    let interiors = interiors
        .iter()
        .map(|r| to_ring(r, path))
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(Polygon::new(exterior, interiors)))
}

fn geometry_kind(value: &Value) -> &'static str {
    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

/// Every polygon part of a (multi)polygon geometry
fn polygons_of(value: &Value, path: &Path) -> Result<Vec<Polygon<f64>>> {
    match value {
        Value::Polygon(rings) => Ok(to_polygon(rings, path)?.into_iter().collect()),
        Value::MultiPolygon(parts) => {
            let mut polygons = Vec::with_capacity(parts.len());
            for rings in parts {
                polygons.extend(to_polygon(rings, path)?);
            }
            Ok(polygons)
        }
        other => Err(GridError::UnsupportedGeometry {
            path: path.to_path_buf(),
            kind: geometry_kind(other).to_string(),
        }),
    }
}

/// Read every polygon feature of a vector file, splitting multipolygons into parts
///
/// Features without geometry are skipped.
pub fn read_polygon_features(path: &Path) -> Result<Vec<PolygonFeature>> {
    let mut result = Vec::new();
    for feature in read_features(path)? {
        let Some(geometry) = &feature.geometry else {
            continue;
        };
        let properties = feature.properties.clone().unwrap_or_default();
        for polygon in polygons_of(&geometry.value, path)? {
            result.push(PolygonFeature {
                polygon,
                properties: properties.clone(),
            });
        }
    }
    Ok(result)
}

pub fn read_shoreline(path: &Path, island: &str) -> Result<Shoreline> {
    let records = read_polygon_features(path)?
        .into_iter()
        .map(|f| f.polygon)
        .collect();
    Ok(Shoreline::new(island, records))
}

fn ring_positions(ring: &LineString<f64>) -> Vec<Vec<f64>> {
    ring.coords().map(|c| vec![c.x, c.y]).collect()
}

fn polygon_rings(polygon: &Polygon<f64>) -> Vec<Vec<Vec<f64>>> {
    let mut rings = vec![ring_positions(polygon.exterior())];
    rings.extend(polygon.interiors().iter().map(ring_positions));
    rings
}

fn polygon_value(polygon: &Polygon<f64>) -> Value {
    Value::Polygon(polygon_rings(polygon))
}

fn multi_polygon_value(shape: &MultiPolygon<f64>) -> Value {
    Value::MultiPolygon(shape.iter().map(polygon_rings).collect())
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn island_properties(island: &str) -> JsonObject {
    let mut properties = JsonObject::new();
    properties.insert("island".to_string(), JsonValue::from(island));
    properties
}

/// Write a feature collection, replacing any previous output at `path`
pub fn write_features(path: &Path, features: Vec<Feature>) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let collection = FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    };
    std::fs::write(path, serde_json::to_string_pretty(&collection)?)?;
    Ok(())
}

pub fn write_shoreline(path: &Path, shoreline: &SanitizedShoreline) -> Result<()> {
    let mut properties = island_properties(&shoreline.island);
    properties.insert("area".to_string(), JsonValue::from(shoreline.area()));
    properties.insert("perimeter".to_string(), JsonValue::from(shoreline.perimeter()));
    write_features(
        path,
        vec![feature(polygon_value(&shoreline.to_polygon()), properties)],
    )
}

pub fn write_corridor(path: &Path, corridor: &Corridor) -> Result<()> {
    let mut properties = island_properties(&corridor.island);
    properties.insert("area".to_string(), JsonValue::from(corridor.area()));
    write_features(
        path,
        vec![feature(multi_polygon_value(&corridor.shape), properties)],
    )
}

pub fn write_points(path: &Path, island: &str, points: &[SamplePoint]) -> Result<()> {
    let features = points
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let mut properties = island_properties(island);
            properties.insert("id".to_string(), JsonValue::from(i));
            properties.insert("part".to_string(), JsonValue::from(p.part));
            properties.insert("offset".to_string(), JsonValue::from(p.offset));
            feature(Value::Point(vec![p.position.x, p.position.y]), properties)
        })
        .collect();
    write_features(path, features)
}

pub fn write_cells(path: &Path, island: &str, cells: &[Cell]) -> Result<()> {
    let features = cells
        .iter()
        .map(|cell| {
            let mut properties = island_properties(island);
            properties.insert("id".to_string(), JsonValue::from(cell.id));
            feature(polygon_value(&cell.to_polygon()), properties)
        })
        .collect();
    write_features(path, features)
}

/// Read a cell grid back; cells without an `id` property are numbered by position
pub fn read_cells(path: &Path) -> Result<Vec<Cell>> {
    let mut cells = Vec::new();
    for (index, f) in read_polygon_features(path)?.into_iter().enumerate() {
        let Some(rect) = f.polygon.bounding_rect() else {
            continue;
        };
        let id = f
            .properties
            .get("id")
            .and_then(JsonValue::as_u64)
            .map(|id| id as usize)
            .unwrap_or(index);
        cells.push(Cell {
            id,
            center: rect.center(),
            rect,
        });
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::footprint::build_cells;
    use geo::coord;
    use tempfile::tempdir;

    #[test]
    fn test_read_shoreline_splits_multipolygons() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("Oahu.geojson");
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"name": "main"}, "geometry": {
                    "type": "MultiPolygon",
                    "coordinates": [
                        [[[0, 0], [10, 0], [10, 10], [0, 10], [0, 0]]],
                        [[[20, 0], [21, 0], [21, 1], [20, 0]]]
                    ]
                }},
                {"type": "Feature", "properties": null, "geometry": null},
                {"type": "Feature", "properties": {}, "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[30, 0], [31, 0], [31, 1]]]
                }}
            ]
        }"#;
        std::fs::write(&path, json).unwrap();

        let shoreline = read_shoreline(&path, "oahu").unwrap();

        assert_eq!(shoreline.records.len(), 3);
        assert!(shoreline.records[2].exterior().is_closed());
    }

    #[test]
    fn test_rejects_line_geometry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.geojson");
        std::fs::write(
            &path,
            r#"{"type": "LineString", "coordinates": [[0, 0], [1, 1]]}"#,
        )
        .unwrap();

        assert!(matches!(
            read_shoreline(&path, "maui"),
            Err(GridError::UnsupportedGeometry { .. })
        ));
    }

    #[test]
    fn test_cells_survive_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("rects5").join("lanai.geojson");
        let points = [
            SamplePoint {
                position: coord! { x: 100.0, y: 200.0 },
                offset: 0.0,
                part: 0,
            },
            SamplePoint {
                position: coord! { x: 150.0, y: 200.0 },
                offset: 50.0,
                part: 0,
            },
        ];
        let cells = build_cells(&points, 50.0);

        write_cells(&path, "lanai", &cells).unwrap();
        let read = read_cells(&path).unwrap();

        assert_eq!(read, cells);
    }

    #[test]
    fn test_write_replaces_previous_output() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("points.geojson");
        let point = SamplePoint {
            position: coord! { x: 1.0, y: 2.0 },
            offset: 0.0,
            part: 0,
        };

        write_points(&path, "kauai", &[point, point, point]).unwrap();
        write_points(&path, "kauai", &[point]).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let collection: FeatureCollection = contents.parse().unwrap();
        assert_eq!(collection.features.len(), 1);
    }
}
