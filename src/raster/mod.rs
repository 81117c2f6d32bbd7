//! Georeferenced rasters: world files, mosaic clipping, habitat masks and tile extraction

pub mod extract;
pub mod mosaic;
pub mod rasterize;
pub mod world_file;

pub use extract::{
    ExtractionOutcome, ExtractionReport, ExtractionStatus, TileCounts, TileExtractor,
};
pub use mosaic::{Mosaic, Tile};
pub use rasterize::HabitatLayer;
pub use world_file::{WorldFile, read_sidecar, sidecar_path};
