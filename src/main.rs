use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::time::Instant;

use shoregrid::config::FileConfig;
use shoregrid::dataset::{Compose, TileDataset, contact_sheet, label_sheet};
use shoregrid::download::{Downloader, download_nccos, download_soest};
use shoregrid::grid::{GridPipeline, IslandStatus};
use shoregrid::layout::DataLayout;
use shoregrid::raster::{ExtractionStatus, TileExtractor};

/// Sample coastlines into fixed-size cells and cut image/mask tiles for reef mapping
///
/// Examples:
///   # Fetch the 2007 main Hawaiian islands survey
///   shoregrid download --nccos2007
///
///   # Build sampling grids for two islands
///   shoregrid grid oahu maui
///
///   # Cut 512 px tiles along every grid
///   shoregrid extract
///
///   # Look at 16 random tile pairs
///   shoregrid preview --count 16 --nrow 4 -o preview.png
#[derive(Parser, Debug)]
#[command(name = "shoregrid")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to config file (optional, auto-searches shoregrid.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Data root directory
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Data source (e.g. nccos)
    #[arg(long, global = true)]
    source: Option<String>,

    /// Survey year
    #[arg(long, global = true)]
    year: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build the shoreline sampling grid of each island
    Grid {
        /// Islands to process (defaults to the configured list)
        islands: Vec<String>,
    },
    /// Clip image and mask tiles at every grid cell
    Extract {
        /// Islands to process (defaults to the configured list)
        islands: Vec<String>,

        /// Keep the world files next to extracted images
        #[arg(long)]
        keep_world_files: bool,
    },
    /// Download the public source archives
    Download {
        #[arg(long)]
        nccos2003: bool,

        #[arg(long)]
        nccos2007: bool,

        #[arg(long)]
        soest: bool,
    },
    /// Write contact sheets of random tile pairs
    Preview {
        /// Number of tile pairs to draw
        #[arg(long, default_value = "16")]
        count: usize,

        /// Tiles per row
        #[arg(long, default_value = "4")]
        nrow: u32,

        /// Output image; the label sheet is written next to it with a `-labels` suffix
        #[arg(short = 'o', long, default_value = "preview.png")]
        output: PathBuf,

        /// Apply random flips and rotations
        #[arg(long)]
        augment: bool,

        /// Seed for tile selection and augmentation
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();
    let total_start = Instant::now();

    // Installed before the config is read so config warnings are printed;
    // the level is settled once `verbose` is known unless RUST_LOG is set
    let level_from_env = std::env::var_os(env_logger::DEFAULT_FILTER_ENV).is_some();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    if !level_from_env {
        log::set_max_level(log_level(args.verbose));
    }

    let mut config = if let Some(ref config_path) = args.config {
        if config_path.exists() {
            FileConfig::from_path(config_path)
                .context(format!("Failed to load config file: {:?}", config_path))?
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        FileConfig::load().unwrap_or_default()
    };

    // CLI values take precedence over config file values
    if let Some(root) = args.root.clone() {
        config.data.root = root;
    }
    if let Some(source) = args.source.clone() {
        config.data.source = source;
    }
    if let Some(year) = args.year.clone() {
        config.data.year = year;
    }

    let verbose = args.verbose || config.verbose;
    if !level_from_env {
        log::set_max_level(log_level(verbose));
    }

    println!("shoregrid - Coastline Sampling Grids");
    println!("====================================");
    println!();

    let layout = DataLayout::from_config(&config.data);
    if verbose {
        println!("Configuration:");
        println!("  Data: {}", layout.base().display());
        println!("  Pixel resolution: {}m", config.pix_res);
        println!("  Tile size: {}px", config.data_extraction.pix_dim);
        println!("  Overlap: {}", config.data_extraction.overlap);
        println!(
            "  Corridor threshold: {}",
            config.data_extraction.corridor_threshold
        );
        println!();
    }

    match args.command {
        Command::Grid { islands } => run_grid(&config, &layout, islands)?,
        Command::Extract {
            islands,
            keep_world_files,
        } => {
            if keep_world_files {
                config.data_extraction.keep_world_files = true;
            }
            run_extract(&config, &layout, islands)?
        }
        Command::Download {
            nccos2003,
            nccos2007,
            soest,
        } => run_download(&layout, nccos2003, nccos2007, soest)?,
        Command::Preview {
            count,
            nrow,
            output,
            augment,
            seed,
        } => run_preview(&config, &layout, count, nrow, &output, augment, seed)?,
    }

    println!();
    println!("Done in {:.1}s", total_start.elapsed().as_secs_f64());
    Ok(())
}

fn log_level(verbose: bool) -> log::LevelFilter {
    if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    }
}

fn islands_or_default(islands: Vec<String>, config: &FileConfig) -> Vec<String> {
    let islands = if islands.is_empty() {
        config.islands.clone()
    } else {
        islands
    };
    islands.into_iter().map(|i| i.to_lowercase()).collect()
}

fn run_grid(config: &FileConfig, layout: &DataLayout, islands: Vec<String>) -> Result<()> {
    let settings = config
        .grid_settings()
        .context("Invalid data extraction settings")?;
    let islands = islands_or_default(islands, config);

    println!(
        "Building grids: cell {}m, step {}m, {} island(s)",
        settings.cell_size,
        settings.step,
        islands.len()
    );

    let pipeline = GridPipeline::new(layout, settings);
    let mut outcomes = Vec::with_capacity(islands.len());
    for island in &islands {
        let spinner = create_spinner(&format!("Building grid for {}...", island));
        outcomes.extend(pipeline.run(std::slice::from_ref(island)));
        spinner.finish_and_clear();
    }

    println!();
    println!("Summary:");
    for outcome in &outcomes {
        match &outcome.status {
            IslandStatus::Completed(s) => println!(
                "  {:<10} {} cells, {:.1} km shoreline, {} corridor part(s), {} ring(s) eliminated",
                outcome.island,
                s.cells,
                s.perimeter / 1000.0,
                s.corridor_parts,
                s.eliminated_rings
            ),
            IslandStatus::Skipped(reason) => {
                println!("  {:<10} skipped: {}", outcome.island, reason)
            }
            IslandStatus::Failed(e) => println!("  {:<10} failed: {}", outcome.island, e),
        }
    }
    Ok(())
}

fn run_extract(config: &FileConfig, layout: &DataLayout, islands: Vec<String>) -> Result<()> {
    let settings = config
        .extraction_settings()
        .context("Invalid data extraction settings")?;
    let islands = islands_or_default(islands, config);

    println!(
        "Extracting {}px tiles into {}",
        settings.pix_dim,
        layout.images().display()
    );

    let report = TileExtractor::new(layout, settings)
        .with_progress(true)
        .run(&islands);

    println!();
    println!("Summary:");
    for outcome in &report.outcomes {
        match &outcome.status {
            ExtractionStatus::Completed(c) => println!(
                "  {:<10} {} images, {} masks",
                outcome.island, c.images, c.masks
            ),
            ExtractionStatus::Skipped(reason) => {
                println!("  {:<10} skipped: {}", outcome.island, reason)
            }
            ExtractionStatus::Failed(e) => println!("  {:<10} failed: {}", outcome.island, e),
        }
    }
    let totals = report.totals();
    println!(
        "  Total: {} images, {} masks from {} island(s)",
        totals.images,
        totals.masks,
        report.completed()
    );
    Ok(())
}

fn run_download(layout: &DataLayout, nccos2003: bool, nccos2007: bool, soest: bool) -> Result<()> {
    if !(nccos2003 || nccos2007 || soest) {
        bail!("Nothing to download: pass --nccos2003, --nccos2007 and/or --soest");
    }

    if nccos2003 || nccos2007 {
        let downloader = Downloader::new().context("Failed to create HTTP client")?;
        let spinner = create_spinner("Downloading NCCOS archives...");
        let summary = download_nccos(&downloader, layout, nccos2003, nccos2007)
            .context("Failed to download NCCOS archives");
        spinner.finish_and_clear();
        let summary = summary?;
        println!(
            "  NCCOS: {} archive(s) fetched, {} already present",
            summary.fetched, summary.skipped
        );
    }
    if soest {
        download_soest(layout).context("Failed to download SOEST data")?;
    }
    Ok(())
}

fn run_preview(
    config: &FileConfig,
    layout: &DataLayout,
    count: usize,
    nrow: u32,
    output: &Path,
    augment: bool,
    seed: Option<u64>,
) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut dataset = TileDataset::open(&layout.base(), config.data_extraction.pix_dim)
        .context("Failed to open tile dataset")?;
    if augment {
        dataset = dataset.with_transform(Compose::augmentation());
    }
    if dataset.is_empty() {
        bail!("No tiles found in {}", layout.images().display());
    }
    let n = count.min(dataset.len());
    let dataset = dataset
        .subset(n, &mut rng)
        .context("Failed to draw tiles")?;

    let spinner = create_spinner(&format!("Loading {} tile pairs...", dataset.len()));
    let mut images = Vec::with_capacity(dataset.len());
    let mut labels = Vec::with_capacity(dataset.len());
    for i in 0..dataset.len() {
        let sample = dataset
            .get_with_rng(i, &mut rng)
            .with_context(|| format!("Failed to load {}", dataset.names()[i]))?;
        images.push(sample.image);
        labels.push(sample.label);
    }
    spinner.finish_and_clear();

    let labels_path = labels_output(output);
    contact_sheet(&images, nrow, 20)
        .save(output)
        .context(format!("Failed to write {}", output.display()))?;
    label_sheet(&labels, nrow, 20)
        .save(&labels_path)
        .context(format!("Failed to write {}", labels_path.display()))?;

    println!("Images: {}", output.display());
    println!("Labels: {}", labels_path.display());
    Ok(())
}

/// `preview.png` → `preview-labels.png`
fn labels_output(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("preview");
    let ext = output
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png");
    output.with_file_name(format!("{}-labels.{}", stem, ext))
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
