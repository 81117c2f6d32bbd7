use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{GridError, Result};

/// Islands covered by the NCCOS 2007 main Hawaiian islands survey.
pub const DEFAULT_ISLANDS: [&str; 9] = [
    "hawaii",
    "oahu",
    "maui",
    "kauai",
    "lanai",
    "molokai",
    "niihau",
    "kahoolawe",
    "kaula",
];

/// Coordinate units of the shoreline vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShorelineUnits {
    /// Projected metric CRS (UTM and friends); used as-is.
    #[default]
    Meters,
    /// WGS84 lon/lat; projected to a local metric plane for the grid stages.
    Degrees,
}

fn default_pix_res() -> f64 {
    1.0
}
fn default_islands() -> Vec<String> {
    DEFAULT_ISLANDS.iter().map(|s| s.to_string()).collect()
}
fn default_root() -> PathBuf {
    PathBuf::from("data")
}
fn default_source() -> String {
    "nccos".to_string()
}
fn default_year() -> String {
    "2007".to_string()
}
fn default_pix_dim() -> u32 {
    512
}
fn default_overlap() -> f64 {
    0.5
}
fn default_corridor_threshold() -> f64 {
    0.99
}
fn default_segments_per_quadrant() -> usize {
    8
}
fn default_label_field() -> String {
    "label".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct FileConfig {
    /// Ground resolution of the mosaics in meters per pixel
    #[serde(default = "default_pix_res")]
    pub pix_res: f64,
    #[serde(default = "default_islands")]
    pub islands: Vec<String>,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub data_extraction: ExtractionConfig,
    #[serde(default)]
    pub habitat: HabitatConfig,
    #[serde(default)]
    pub verbose: bool,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            pix_res: default_pix_res(),
            islands: default_islands(),
            data: DataConfig::default(),
            data_extraction: ExtractionConfig::default(),
            habitat: HabitatConfig::default(),
            verbose: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_source")]
    pub source: String,
    #[serde(default = "default_year")]
    pub year: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            source: default_source(),
            year: default_year(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExtractionConfig {
    /// Tile width and height in pixels
    #[serde(default = "default_pix_dim")]
    pub pix_dim: u32,
    /// Fractional overlap between neighbouring cells, in [0, 1)
    #[serde(default = "default_overlap")]
    pub overlap: f64,
    /// Interior rings at or above this share of their parent's area are eliminated
    #[serde(default = "default_corridor_threshold")]
    pub corridor_threshold: f64,
    /// Corridor buffer radius in meters, defaults to half the cell size
    #[serde(default)]
    pub corridor_radius: Option<f64>,
    /// Half width of a cell in meters, defaults to half the cell size
    #[serde(default)]
    pub footprint_radius: Option<f64>,
    #[serde(default = "default_segments_per_quadrant")]
    pub segments_per_quadrant: usize,
    /// Douglas-Peucker tolerance applied to the shoreline, 0 disables it
    #[serde(default)]
    pub simplify_tolerance: f64,
    #[serde(default)]
    pub shoreline_units: ShorelineUnits,
    #[serde(default)]
    pub keep_world_files: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            pix_dim: default_pix_dim(),
            overlap: default_overlap(),
            corridor_threshold: default_corridor_threshold(),
            corridor_radius: None,
            footprint_radius: None,
            segments_per_quadrant: default_segments_per_quadrant(),
            simplify_tolerance: 0.0,
            shoreline_units: ShorelineUnits::default(),
            keep_world_files: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HabitatConfig {
    /// Integer feature property holding the raw habitat class
    #[serde(default = "default_label_field")]
    pub label_field: String,
    /// Mask value for pixels outside every habitat polygon
    #[serde(default)]
    pub background: u8,
}

impl Default for HabitatConfig {
    fn default() -> Self {
        Self {
            label_field: default_label_field(),
            background: 0,
        }
    }
}

/// Validated, derived parameters for the grid stages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    pub pix_dim: u32,
    /// Side length of a cell in meters (`pix_res * pix_dim`)
    pub cell_size: f64,
    /// Arc length between consecutive sample points
    pub step: f64,
    pub corridor_radius: f64,
    pub footprint_radius: f64,
    pub corridor_threshold: f64,
    pub segments_per_quadrant: usize,
    pub simplify_tolerance: f64,
    pub units: ShorelineUnits,
}

/// Parameters of the tile extraction step
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSettings {
    pub pix_dim: u32,
    pub keep_world_files: bool,
    pub label_field: String,
    pub background: u8,
}

impl FileConfig {
    pub fn load() -> Option<Self> {
        let config_paths = get_config_paths();

        for path in config_paths {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => return Some(config),
                    Err(e) => {
                        log::warn!("Failed to parse config file {:?}: {}", path, e);
                    }
                }
            }
        }
        None
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| GridError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn grid_settings(&self) -> Result<GridSettings> {
        let ext = &self.data_extraction;

        if !(self.pix_res.is_finite() && self.pix_res > 0.0) {
            return Err(GridError::Config(format!(
                "pix_res must be positive, got {}",
                self.pix_res
            )));
        }
        if ext.pix_dim == 0 {
            return Err(GridError::Config("pix_dim must be positive".to_string()));
        }
        if !(0.0..1.0).contains(&ext.overlap) {
            return Err(GridError::Config(format!(
                "overlap must lie in [0, 1), got {}",
                ext.overlap
            )));
        }
        if !(ext.corridor_threshold > 0.0 && ext.corridor_threshold <= 1.0) {
            return Err(GridError::Config(format!(
                "corridor_threshold must lie in (0, 1], got {}",
                ext.corridor_threshold
            )));
        }
        if ext.segments_per_quadrant == 0 {
            return Err(GridError::Config(
                "segments_per_quadrant must be at least 1".to_string(),
            ));
        }
        if !(ext.simplify_tolerance.is_finite() && ext.simplify_tolerance >= 0.0) {
            return Err(GridError::Config(
                "simplify_tolerance must be non-negative".to_string(),
            ));
        }

        let cell_size = self.pix_res * ext.pix_dim as f64;
        let corridor_radius = positive_radius("corridor_radius", ext.corridor_radius, cell_size)?;
        let footprint_radius =
            positive_radius("footprint_radius", ext.footprint_radius, cell_size)?;

        Ok(GridSettings {
            pix_dim: ext.pix_dim,
            cell_size,
            step: cell_size * (1.0 - ext.overlap),
            corridor_radius,
            footprint_radius,
            corridor_threshold: ext.corridor_threshold,
            segments_per_quadrant: ext.segments_per_quadrant,
            simplify_tolerance: ext.simplify_tolerance,
            units: ext.shoreline_units,
        })
    }

    pub fn extraction_settings(&self) -> Result<ExtractionSettings> {
        let ext = &self.data_extraction;
        if ext.pix_dim == 0 {
            return Err(GridError::Config("pix_dim must be positive".to_string()));
        }
        if self.habitat.label_field.trim().is_empty() {
            return Err(GridError::Config(
                "habitat.label_field must not be empty".to_string(),
            ));
        }
        Ok(ExtractionSettings {
            pix_dim: ext.pix_dim,
            keep_world_files: ext.keep_world_files,
            label_field: self.habitat.label_field.clone(),
            background: self.habitat.background,
        })
    }
}

fn positive_radius(name: &str, value: Option<f64>, cell_size: f64) -> Result<f64> {
    let radius = value.unwrap_or(cell_size / 2.0);
    if radius.is_finite() && radius > 0.0 {
        Ok(radius)
    } else {
        Err(GridError::Config(format!(
            "{} must be positive, got {}",
            name, radius
        )))
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("shoregrid.toml"));
    paths.push(PathBuf::from(".shoregrid.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("shoregrid").join("config.toml"));
        paths.push(config_dir.join("shoregrid.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".shoregrid.toml"));
    }

    paths
}
