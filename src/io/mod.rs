pub mod geojson;

pub use geojson::{
    PolygonFeature, read_cells, read_polygon_features, read_shoreline, write_cells,
    write_corridor, write_points, write_shoreline,
};
