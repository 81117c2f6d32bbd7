//! On-disk layout of the source datasets and everything derived from them
//!
//! ```text
//! {root}/{source}/{year}/
//!   Shorelines/Shorelines/{Island}.geojson
//!   Habitat_GIS_Data/{island}.geojson
//!   {Island}_IKONOS/{island}*.tif (+ world file)
//!   temp/rects1..rects5/{island}.geojson
//!   images/{island}-{id}.png
//!   masks/{island}-{id}.png
//! ```

use std::path::{Path, PathBuf};

use crate::config::DataConfig;
use crate::error::Result;

/// Intermediate outputs of the grid pipeline, one temp directory each
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Sanitized,
    Corridor,
    Filtered,
    Points,
    Cells,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Sanitized,
        Stage::Corridor,
        Stage::Filtered,
        Stage::Points,
        Stage::Cells,
    ];

    pub fn dir_name(self) -> &'static str {
        match self {
            Stage::Sanitized => "rects1",
            Stage::Corridor => "rects2",
            Stage::Filtered => "rects3",
            Stage::Points => "rects4",
            Stage::Cells => "rects5",
        }
    }
}

#[derive(Debug, Clone)]
pub struct DataLayout {
    root: PathBuf,
    source: String,
    year: String,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>, source: &str, year: &str) -> Self {
        Self {
            root: root.into(),
            source: source.to_string(),
            year: year.to_string(),
        }
    }

    pub fn from_config(config: &DataConfig) -> Self {
        Self::new(config.root.clone(), &config.source, &config.year)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn source_dir(&self) -> PathBuf {
        self.root.join(&self.source)
    }

    /// `{root}/{source}/{year}`
    pub fn base(&self) -> PathBuf {
        self.source_dir().join(&self.year)
    }

    pub fn shoreline(&self, island: &str) -> PathBuf {
        self.base()
            .join("Shorelines")
            .join("Shorelines")
            .join(format!("{}.geojson", capitalize(island)))
    }

    pub fn habitat(&self, island: &str) -> PathBuf {
        // Niihau and Kaula were surveyed as one habitat layer
        let name = match island {
            "niihau" | "kaula" => "niihau_kaula",
            other => other,
        };
        self.base()
            .join("Habitat_GIS_Data")
            .join(format!("{}.geojson", name))
    }

    pub fn mosaic_dir(&self, island: &str) -> PathBuf {
        self.base().join(format!("{}_IKONOS", capitalize(island)))
    }

    /// Every `.tif` in the island's mosaic directory whose name starts with the island name.
    ///
    /// A missing directory yields no mosaics rather than an error.
    pub fn mosaics(&self, island: &str) -> Result<Vec<PathBuf>> {
        let dir = self.mosaic_dir(island);
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let prefix = island.to_lowercase();
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let lower = name.to_lowercase();
            if lower.starts_with(&prefix) && lower.ends_with(".tif") {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(paths)
    }

    pub fn temp(&self) -> PathBuf {
        self.base().join("temp")
    }

    pub fn stage(&self, stage: Stage, island: &str) -> PathBuf {
        self.temp()
            .join(stage.dir_name())
            .join(format!("{}.geojson", island))
    }

    pub fn images(&self) -> PathBuf {
        self.base().join("images")
    }

    pub fn masks(&self) -> PathBuf {
        self.base().join("masks")
    }
}

/// Name of the tile pair extracted at one cell
pub fn tile_name(island: &str, cell_id: usize) -> String {
    format!("{}-{}.png", island, cell_id)
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
