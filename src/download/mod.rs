//! Fetch and unpack the public NCCOS habitat archives

use flate2::read::GzDecoder;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GridError, Result};
use crate::layout::DataLayout;

const USER_AGENT: &str = "shoregrid/0.1.0";
const NOS_BENTHIC_URL: &str = "https://www.nodc.noaa.gov/cgi-bin/OAS/prd/download/1329.1.1.tar.gz";
const NCCOS_2007_BASE_URL: &str = "https://cdn.coastalscience.noaa.gov/datasets/e97/2007";

const NCCOS_2007_ARCHIVES: [&str; 15] = [
    // labels
    "aap/AccuracyAssessment.zip",
    "gvp/GroundValidation.zip",
    "shapes_benthic/Habitat_GIS_Data.zip",
    "shapes_shoreline/Shorelines.zip",
    "other/MHI_digital_elevation_model_hillshade_GIS_data.zip",
    // mosaics
    "mosaics/Hawaii_IKONOS.zip",
    "mosaics/Oahu_IKONOS.zip",
    "mosaics/Maui_IKONOS.zip",
    "mosaics/Kauai_IKONOS.zip",
    "mosaics/Lanai_IKONOS.zip",
    "mosaics/Molokai_IKONOS.zip",
    "mosaics/Niihau_IKONOS.zip",
    "mosaics/Kahoolawe_IKONOS.zip",
    "mosaics/Kaula_IKONOS.zip",
    "mosaics/MHI_satellite_image_mosaic_files-land.zip",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    TarGz,
}

/// A remote archive, where it is stored and where it unpacks to
#[derive(Debug, Clone, PartialEq)]
pub struct Archive {
    pub url: String,
    pub file: PathBuf,
    pub target: PathBuf,
    pub kind: ArchiveKind,
}

impl Archive {
    /// Already fetched or already unpacked
    pub fn is_present(&self) -> bool {
        self.file.exists() || self.target.exists()
    }
}

/// NOS benthic habitat archive, unpacked to `nccos/NOSbenthic`
pub fn nos_benthic_archive(layout: &DataLayout) -> Archive {
    let dir = layout.root().join("nccos");
    Archive {
        url: NOS_BENTHIC_URL.to_string(),
        file: dir.join("1329.1.1.tar.gz"),
        target: dir.join("NOSbenthic"),
        kind: ArchiveKind::TarGz,
    }
}

/// 2007 survey archives, each unpacked next to itself under its own stem
pub fn nccos2007_archives(layout: &DataLayout) -> Vec<Archive> {
    let dir = layout.root().join("nccos").join("2007");
    NCCOS_2007_ARCHIVES
        .iter()
        .map(|tail| {
            let name = tail.rsplit('/').next().unwrap_or(tail);
            let file = dir.join(name);
            Archive {
                url: format!("{}/{}", NCCOS_2007_BASE_URL, tail),
                target: file.with_extension(""),
                file,
                kind: ArchiveKind::Zip,
            }
        })
        .collect()
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadSummary {
    pub fetched: usize,
    pub skipped: usize,
}

pub struct Downloader {
    client: reqwest::blocking::Client,
    max_retries: u32,
    retry_wait: Duration,
}

impl Downloader {
    pub fn new() -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(3600))
            .build()?;
        Ok(Self {
            client,
            max_retries: 3,
            retry_wait: Duration::from_secs(30),
        })
    }

    /// Download `url` to `dest`; the file only appears once the body is complete
    pub fn fetch(&self, url: &str, dest: &Path) -> Result<u64> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let partial = dest.with_extension("part");

        let mut last_error = None;
        for attempt in 0..self.max_retries {
            if attempt > 0 {
                let wait = self.retry_wait * attempt;
                log::warn!(
                    "Retrying {} in {} seconds (attempt {}/{})",
                    url,
                    wait.as_secs(),
                    attempt + 1,
                    self.max_retries
                );
                std::thread::sleep(wait);
            }

            let mut response = match self.client.get(url).send() {
                Ok(response) => response,
                Err(e) if is_transient(&e) => {
                    last_error = Some(format!("{} (attempt {})", e, attempt + 1));
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match response.status().as_u16() {
                200 => {
                    let mut file = File::create(&partial)?;
                    match response.copy_to(&mut file) {
                        Ok(bytes) => {
                            std::fs::rename(&partial, dest)?;
                            return Ok(bytes);
                        }
                        Err(e) => {
                            drop(file);
                            std::fs::remove_file(&partial).ok();
                            if !is_transient(&e) {
                                return Err(e.into());
                            }
                            last_error = Some(format!("{} (attempt {})", e, attempt + 1));
                        }
                    }
                }
                429 | 504 => {
                    last_error = Some(format!(
                        "server returned {} (attempt {})",
                        response.status(),
                        attempt + 1
                    ));
                }
                _ => {
                    return Err(GridError::Download {
                        url: url.to_string(),
                        reason: format!("server returned {}", response.status()),
                    });
                }
            }
        }

        Err(GridError::Download {
            url: url.to_string(),
            reason: last_error.unwrap_or_else(|| "no attempt made".to_string()),
        })
    }

    /// Fetch and unpack an archive unless it is already present
    ///
    /// Returns whether anything was downloaded.
    pub fn fetch_archive(&self, archive: &Archive) -> Result<bool> {
        if archive.is_present() {
            log::info!("{} already present, skipping", archive.file.display());
            return Ok(false);
        }

        log::info!("Downloading {}", archive.url);
        let bytes = self.fetch(&archive.url, &archive.file)?;
        log::info!(
            "Fetched {:.1} MB, unpacking into {}",
            bytes as f64 / 1_048_576.0,
            archive.target.display()
        );
        unpack_or_discard(archive)?;
        Ok(true)
    }
}

/// Timeouts, refused connections and bodies cut short are worth another attempt
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body()
}

/// Unpack an archive; on failure remove both the file and the target so the
/// next run fetches it again instead of treating it as present
pub fn unpack_or_discard(archive: &Archive) -> Result<()> {
    unpack(archive).inspect_err(|e| {
        log::warn!(
            "Failed to unpack {}: {}. Removing it",
            archive.file.display(),
            e
        );
        if archive.target.exists() {
            std::fs::remove_dir_all(&archive.target).ok();
        }
        std::fs::remove_file(&archive.file).ok();
    })
}

/// Unpack a local archive into its target directory
pub fn unpack(archive: &Archive) -> Result<()> {
    std::fs::create_dir_all(&archive.target)?;
    let file = File::open(&archive.file)?;
    match archive.kind {
        ArchiveKind::Zip => {
            let mut zip = zip::ZipArchive::new(file)?;
            zip.extract(&archive.target)?;
        }
        ArchiveKind::TarGz => {
            tar::Archive::new(GzDecoder::new(file)).unpack(&archive.target)?;
        }
    }
    Ok(())
}

/// Download the NCCOS habitat data sets
///
/// The NOS benthic archive is always fetched; `nccos2007` adds the 2007 survey.
/// No archives are published for the 2003 survey.
pub fn download_nccos(
    downloader: &Downloader,
    layout: &DataLayout,
    nccos2003: bool,
    nccos2007: bool,
) -> Result<DownloadSummary> {
    let mut archives = vec![nos_benthic_archive(layout)];
    if nccos2003 {
        log::warn!("No archives are defined for the NCCOS 2003 survey, nothing to fetch");
    }
    if nccos2007 {
        archives.extend(nccos2007_archives(layout));
    }

    let mut summary = DownloadSummary::default();
    for archive in &archives {
        if downloader.fetch_archive(archive)? {
            summary.fetched += 1;
        } else {
            summary.skipped += 1;
        }
    }
    Ok(summary)
}

pub fn download_soest(_layout: &DataLayout) -> Result<DownloadSummary> {
    log::warn!("No archives are defined for the SOEST data set, nothing to fetch");
    Ok(DownloadSummary::default())
}
