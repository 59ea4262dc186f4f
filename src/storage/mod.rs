//! Storage Layer
//!
//! Locates the configuration directory and manages the upload folder.

pub mod uploads;

use anyhow::Result;
use std::path::PathBuf;

pub use uploads::UploadStore;

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "prescription-ocr", "PrescriptionOcr")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}
