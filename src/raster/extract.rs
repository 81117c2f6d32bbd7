use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;

use super::mosaic::Mosaic;
use super::rasterize::HabitatLayer;
use super::world_file::sidecar_path;
use crate::config::ExtractionSettings;
use crate::error::{GridError, Result};
use crate::io;
use crate::layout::{DataLayout, Stage, tile_name};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TileCounts {
    pub images: usize,
    pub masks: usize,
}

#[derive(Debug)]
pub enum ExtractionStatus {
    Completed(TileCounts),
    Skipped(String),
    Failed(GridError),
}

#[derive(Debug)]
pub struct ExtractionOutcome {
    pub island: String,
    pub status: ExtractionStatus,
}

/// Per-island results of one extraction run
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub outcomes: Vec<ExtractionOutcome>,
}

impl ExtractionReport {
    pub fn totals(&self) -> TileCounts {
        self.outcomes
            .iter()
            .fold(TileCounts::default(), |acc, o| match &o.status {
                ExtractionStatus::Completed(c) => TileCounts {
                    images: acc.images + c.images,
                    masks: acc.masks + c.masks,
                },
                _ => acc,
            })
    }

    pub fn completed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, ExtractionStatus::Completed(_)))
            .count()
    }
}

/// Clips every grid cell of an island out of its mosaic and habitat layer
pub struct TileExtractor<'a> {
    layout: &'a DataLayout,
    settings: ExtractionSettings,
    show_progress: bool,
}

impl<'a> TileExtractor<'a> {
    pub fn new(layout: &'a DataLayout, settings: ExtractionSettings) -> Self {
        Self {
            layout,
            settings,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    fn progress_bar(&self, island: &str, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::with_template("{msg:>10} [{bar:40.cyan/blue}] {pos}/{len} tiles")
        {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.set_message(island.to_string());
        pb
    }

    pub fn run(&self, islands: &[String]) -> ExtractionReport {
        let outcomes = islands
            .iter()
            .map(|island| {
                let status = match self.run_island(island) {
                    Ok(status) => status,
                    Err(e) => {
                        log::error!("Failed to extract tiles for {}: {}", island, e);
                        ExtractionStatus::Failed(e)
                    }
                };
                ExtractionOutcome {
                    island: island.clone(),
                    status,
                }
            })
            .collect();
        ExtractionReport { outcomes }
    }

    /// Extract the tile pairs of one island; missing inputs skip the island
    pub fn run_island(&self, island: &str) -> Result<ExtractionStatus> {
        let layout = self.layout;

        let mosaics = layout.mosaics(island)?;
        let mosaic_path = match mosaics.as_slice() {
            [] => {
                log::warn!("No mosaic found for {}. Skipping...", island);
                return Ok(ExtractionStatus::Skipped(format!(
                    "no mosaic in {}",
                    layout.mosaic_dir(island).display()
                )));
            }
            [single] => single,
            several => {
                log::warn!(
                    "Found {} mosaics for {}, merge them into one. Skipping...",
                    several.len(),
                    island
                );
                return Ok(ExtractionStatus::Skipped(format!(
                    "{} mosaics need to be merged",
                    several.len()
                )));
            }
        };

        let grid_path = layout.stage(Stage::Cells, island);
        if !grid_path.exists() {
            log::warn!("No grid found for {}, run the grid step first. Skipping...", island);
            return Ok(ExtractionStatus::Skipped(format!(
                "missing grid {}",
                grid_path.display()
            )));
        }

        let cells = io::read_cells(&grid_path)?;
        let mosaic = Mosaic::open(mosaic_path)?;

        let habitat_path = layout.habitat(island);
        let habitat = if habitat_path.exists() {
            Some(HabitatLayer::open(
                &habitat_path,
                &self.settings.label_field,
                self.settings.background,
            )?)
        } else {
            log::warn!(
                "No habitat layer at {}, extracting images only",
                habitat_path.display()
            );
            None
        };

        let images_dir = layout.images();
        let masks_dir = layout.masks();
        std::fs::create_dir_all(&images_dir)?;
        if habitat.is_some() {
            std::fs::create_dir_all(&masks_dir)?;
        }

        let size = self.settings.pix_dim;
        let pb = self.progress_bar(island, cells.len());
        let mut counts = TileCounts::default();

        for cell in &cells {
            let name = tile_name(island, cell.id);
            let tile = mosaic.clip(&cell.rect, size);

            let image_path = images_dir.join(&name);
            tile.image.save(&image_path)?;
            tile.transform.write(&sidecar_path(&image_path))?;
            counts.images += 1;

            if let Some(layer) = &habitat {
                let mask = layer.rasterize(&tile.transform, size, size);
                mask.save(masks_dir.join(&name))?;
                counts.masks += 1;
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        if !self.settings.keep_world_files {
            prune_non_png(&images_dir)?;
        }

        log::info!(
            "{}: {} images, {} masks from {}",
            island,
            counts.images,
            counts.masks,
            mosaic_path.display()
        );
        Ok(ExtractionStatus::Completed(counts))
    }
}

/// Remove everything but `.png` files from a tile directory
fn prune_non_png(dir: &Path) -> Result<usize> {
    let mut removed = 0;
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let is_png = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("png"));
        if !is_png {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SamplePoint;
    use crate::grid::build_cells;
    use crate::raster::WorldFile;
    use geo::coord;
    use image::{Rgb, RgbImage};
    use tempfile::tempdir;

    fn settings(keep_world_files: bool) -> ExtractionSettings {
        ExtractionSettings {
            pix_dim: 4,
            keep_world_files,
            label_field: "label".to_string(),
            background: 0,
        }
    }

    fn write_mosaic(layout: &DataLayout, island: &str, file: &str) {
        let dir = layout.mosaic_dir(island);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(file);
        RgbImage::from_pixel(20, 20, Rgb([40, 80, 120]))
            .save(&path)
            .unwrap();
        WorldFile::north_up(0.0, 20.0, 1.0)
            .write(&path.with_extension("tfw"))
            .unwrap();
    }

    fn write_grid(layout: &DataLayout, island: &str) {
        let points: Vec<SamplePoint> = [(5.0, 15.0), (10.0, 10.0), (19.0, 1.0)]
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| SamplePoint {
                position: coord! { x: x, y: y },
                offset: i as f64,
                part: 0,
            })
            .collect();
        let cells = build_cells(&points, 2.0);
        io::write_cells(&layout.stage(Stage::Cells, island), island, &cells).unwrap();
    }

    fn write_habitat(layout: &DataLayout, island: &str) {
        let path = layout.habitat(island);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {"label": 2}, "geometry": {"type": "Polygon",
                 "coordinates": [[[0, 0], [20, 0], [20, 20], [0, 20], [0, 0]]]}}
            ]}"#,
        )
        .unwrap();
    }

    #[test]
    fn test_multiple_mosaics_skip_island() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), "nccos", "2007");

        write_mosaic(&layout, "oahu", "oahu_east.tif");
        write_mosaic(&layout, "oahu", "oahu_west.tif");
        write_grid(&layout, "oahu");
        write_mosaic(&layout, "maui", "maui_mosaic.tif");
        write_grid(&layout, "maui");
        write_habitat(&layout, "maui");

        let extractor = TileExtractor::new(&layout, settings(false));
        let report = extractor.run(&["oahu".to_string(), "maui".to_string()]);

        assert!(matches!(
            report.outcomes[0].status,
            ExtractionStatus::Skipped(_)
        ));
        assert!(matches!(
            report.outcomes[1].status,
            ExtractionStatus::Completed(TileCounts { images: 3, masks: 3 })
        ));
        assert!(!layout.images().join("oahu-0.png").exists());
        assert!(layout.images().join("maui-0.png").exists());
        assert!(layout.masks().join("maui-2.png").exists());
        assert_eq!(report.totals().images, 3);
    }

    #[test]
    fn test_tiles_are_colocated() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), "nccos", "2007");
        write_mosaic(&layout, "lanai", "lanai.tif");
        write_grid(&layout, "lanai");
        write_habitat(&layout, "lanai");

        TileExtractor::new(&layout, settings(true)).run(&["lanai".to_string()]);

        let image = image::open(layout.images().join("lanai-1.png"))
            .unwrap()
            .to_rgb8();
        let mask = image::open(layout.masks().join("lanai-1.png"))
            .unwrap()
            .to_luma8();
        assert_eq!(image.dimensions(), (4, 4));
        assert_eq!(mask.dimensions(), (4, 4));
        assert_eq!(*image.get_pixel(0, 0), Rgb([40, 80, 120]));
        assert!(mask.pixels().all(|p| p.0[0] == 2));

        // Cell 1 is centered at (10, 10): its top-left corner is (8, 12)
        let transform = WorldFile::read(&layout.images().join("lanai-1.pgw")).unwrap();
        assert_eq!(transform.to_pixel(8.0, 12.0), (0.0, 0.0));
    }

    #[test]
    fn test_cells_past_mosaic_edge_are_padded() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), "nccos", "2007");
        write_mosaic(&layout, "kauai", "kauai.tif");
        write_grid(&layout, "kauai");

        TileExtractor::new(&layout, settings(false)).run(&["kauai".to_string()]);

        // Cell 2 spans x 17..21, y -1..3 and hangs over the right and bottom edges
        let image = image::open(layout.images().join("kauai-2.png"))
            .unwrap()
            .to_rgb8();
        assert_eq!(*image.get_pixel(0, 0), Rgb([40, 80, 120]));
        assert_eq!(*image.get_pixel(3, 0), Rgb([0, 0, 0]));
        assert_eq!(*image.get_pixel(0, 3), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_world_files_pruned_unless_kept() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), "nccos", "2007");
        write_mosaic(&layout, "molokai", "molokai.tif");
        write_grid(&layout, "molokai");

        let extractor = TileExtractor::new(&layout, settings(false));
        let report = extractor.run(&["molokai".to_string()]);

        assert!(matches!(
            report.outcomes[0].status,
            ExtractionStatus::Completed(TileCounts { images: 3, masks: 0 })
        ));
        assert!(!layout.images().join("molokai-0.pgw").exists());
        assert!(!layout.masks().exists());

        TileExtractor::new(&layout, settings(true)).run(&["molokai".to_string()]);
        assert!(layout.images().join("molokai-0.pgw").exists());
    }

    #[test]
    fn test_missing_prerequisites_skip() {
        let dir = tempdir().unwrap();
        let layout = DataLayout::new(dir.path(), "nccos", "2007");
        write_mosaic(&layout, "niihau", "niihau.tif");

        let report = TileExtractor::new(&layout, settings(false))
            .run(&["niihau".to_string(), "kaula".to_string()]);

        assert!(
            report
                .outcomes
                .iter()
                .all(|o| matches!(o.status, ExtractionStatus::Skipped(_)))
        );
        assert_eq!(report.completed(), 0);
    }
}
