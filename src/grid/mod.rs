//! Shoreline → sampling grid pipeline
//!
//! Stages run in a fixed order, each consuming the previous stage's value:
//!
//! 1. [`sanitize`]: largest exterior ring only
//! 2. [`build_corridor`]: boundary buffered by the corridor radius, dissolved
//! 3. [`filter_corridor`]: interior rings at or above the threshold eliminated
//! 4. [`sample_corridor`]: points every `step` meters along each exterior
//! 5. [`build_cells`]: square footprint per point
//!
//! Every stage output is written to its own temp directory as a new file.

pub mod corridor;
pub mod footprint;
pub mod sampling;
pub mod sanitize;

pub use corridor::{build_corridor, filter_corridor};
pub use footprint::{build_cells, footprint};
pub use sampling::{sample_corridor, sample_ring};
pub use sanitize::sanitize;

use geo::{BoundingRect, MultiPolygon};

use crate::config::{GridSettings, ShorelineUnits};
use crate::domain::{Cell, Corridor, SamplePoint, SanitizedShoreline, Shoreline};
use crate::error::{GridError, Result};
use crate::geometry::{BufferStyle, Projector};
use crate::io;
use crate::layout::{DataLayout, Stage};

/// Every intermediate value produced for one island
#[derive(Debug, Clone)]
pub struct GridBuild {
    pub sanitized: SanitizedShoreline,
    pub corridor: Corridor,
    pub filtered: Corridor,
    pub points: Vec<SamplePoint>,
    pub cells: Vec<Cell>,
}

impl GridBuild {
    pub fn summary(&self) -> GridSummary {
        GridSummary {
            perimeter: self.sanitized.perimeter(),
            corridor_parts: self.filtered.shape.0.len(),
            eliminated_rings: self.corridor.interior_count() - self.filtered.interior_count(),
            cells: self.cells.len(),
        }
    }

    fn unproject(&self, projector: &Projector) -> Self {
        let corridor = |c: &Corridor| Corridor {
            island: c.island.clone(),
            shape: projector.unproject_geometry(&c.shape),
        };
        Self {
            sanitized: SanitizedShoreline {
                island: self.sanitized.island.clone(),
                ring: projector.unproject_geometry(&self.sanitized.ring),
            },
            corridor: corridor(&self.corridor),
            filtered: corridor(&self.filtered),
            points: self
                .points
                .iter()
                .map(|p| SamplePoint {
                    position: projector.unproject(p.position),
                    ..*p
                })
                .collect(),
            cells: self
                .cells
                .iter()
                .map(|c| Cell {
                    id: c.id,
                    center: projector.unproject(c.center),
                    rect: projector.unproject_geometry(&c.rect),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSummary {
    /// Length of the sanitized shoreline in meters
    pub perimeter: f64,
    pub corridor_parts: usize,
    pub eliminated_rings: usize,
    pub cells: usize,
}

#[derive(Debug)]
pub enum IslandStatus {
    Completed(GridSummary),
    Skipped(String),
    Failed(GridError),
}

#[derive(Debug)]
pub struct IslandOutcome {
    pub island: String,
    pub status: IslandStatus,
}

pub struct GridPipeline<'a> {
    layout: &'a DataLayout,
    settings: GridSettings,
}

impl<'a> GridPipeline<'a> {
    pub fn new(layout: &'a DataLayout, settings: GridSettings) -> Self {
        Self { layout, settings }
    }

    /// Run every stage in memory on a shoreline expressed in meters
    pub fn build(&self, shoreline: &Shoreline) -> Result<GridBuild> {
        let s = &self.settings;
        let style = BufferStyle::new(s.segments_per_quadrant);

        let sanitized = sanitize(shoreline, s.simplify_tolerance)?;
        let corridor = build_corridor(&sanitized, s.corridor_radius, style);
        let filtered = filter_corridor(&corridor, s.corridor_threshold);
        let points = sample_corridor(&filtered, s.step);
        let cells = build_cells(&points, s.footprint_radius);

        Ok(GridBuild {
            sanitized,
            corridor,
            filtered,
            points,
            cells,
        })
    }

    /// Build and write the grid of one island
    ///
    /// Returns `Ok(None)` when the island has no shoreline file. Earlier stage
    /// output is removed first, so a skipped or failed island leaves no grid.
    pub fn run_island(&self, island: &str) -> Result<Option<GridSummary>> {
        self.clear(island)?;
        let path = self.layout.shoreline(island);
        if !path.exists() {
            return Ok(None);
        }

        let shoreline = io::read_shoreline(&path, island)?;
        let build = match self.settings.units {
            ShorelineUnits::Meters => self.build(&shoreline)?,
            ShorelineUnits::Degrees => {
                let extent = MultiPolygon::new(shoreline.records.clone())
                    .bounding_rect()
                    .ok_or_else(|| GridError::EmptyShoreline(island.to_string()))?;
                let projector = Projector::for_extent(extent);
                let projected = Shoreline::new(
                    island,
                    shoreline
                        .records
                        .iter()
                        .map(|r| projector.project_geometry(r))
                        .collect(),
                );
                self.build(&projected)?.unproject(&projector)
            }
        };

        self.write(island, &build)?;
        let summary = build.summary();
        log::info!(
            "{}: {} cells along {:.0} m of shoreline",
            island,
            summary.cells,
            summary.perimeter
        );
        Ok(Some(summary))
    }

    fn clear(&self, island: &str) -> Result<()> {
        for stage in Stage::ALL {
            let path = self.layout.stage(stage, island);
            match std::fs::remove_file(&path) {
                Ok(()) => log::debug!("Removed stale {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    fn write(&self, island: &str, build: &GridBuild) -> Result<()> {
        let layout = self.layout;
        io::write_shoreline(&layout.stage(Stage::Sanitized, island), &build.sanitized)?;
        io::write_corridor(&layout.stage(Stage::Corridor, island), &build.corridor)?;
        io::write_corridor(&layout.stage(Stage::Filtered, island), &build.filtered)?;
        io::write_points(&layout.stage(Stage::Points, island), island, &build.points)?;
        io::write_cells(&layout.stage(Stage::Cells, island), island, &build.cells)?;
        Ok(())
    }

    /// Process islands one after another; a skip or failure never stops the others
    pub fn run(&self, islands: &[String]) -> Vec<IslandOutcome> {
        islands
            .iter()
            .map(|island| {
                let status = match self.run_island(island) {
                    Ok(Some(summary)) => IslandStatus::Completed(summary),
                    Ok(None) => {
                        log::warn!("No shoreline found for {}. Skipping...", island);
                        IslandStatus::Skipped(format!(
                            "missing shoreline {}",
                            self.layout.shoreline(island).display()
                        ))
                    }
                    Err(e) => {
                        log::error!("Failed to build grid for {}: {}", island, e);
                        IslandStatus::Failed(e)
                    }
                };
                IslandOutcome {
                    island: island.clone(),
                    status,
                }
            })
            .collect()
    }
}
