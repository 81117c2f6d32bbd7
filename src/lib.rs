//! shoregrid - Sample coastlines into fixed-size cells and cut co-registered
//! image/mask tiles for reef habitat segmentation

pub mod config;
pub mod dataset;
pub mod domain;
pub mod download;
pub mod error;
pub mod geometry;
pub mod grid;
pub mod io;
pub mod layout;
pub mod raster;

pub use error::{GridError, Result};
