use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GridError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("shoreline for {0} has no ring with positive area")]
    EmptyShoreline(String),

    #[error("unsupported geometry in {path}: {kind}")]
    UnsupportedGeometry { path: PathBuf, kind: String },

    #[error("invalid world file {path}: {reason}")]
    WorldFile { path: PathBuf, reason: String },

    #[error("rotated rasters are not supported")]
    RotatedRaster,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("dataset error: {0}")]
    Dataset(String),
}

pub type Result<T> = std::result::Result<T, GridError>;
