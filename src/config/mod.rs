//! Application Configuration
//!
//! Model, backend, upload and evaluation settings stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::evaluation::MatchMode;

/// Environment variable overriding `backend.base_url`
pub const BACKEND_URL_ENV: &str = "RX_OCR_BACKEND_URL";

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Recognition model settings
    pub model: ModelSettings,
    /// Prescription backend settings
    pub backend: BackendSettings,
    /// Upload folder settings
    pub uploads: UploadSettings,
    /// Offline evaluation settings
    pub evaluation: EvaluationSettings,
}

/// Recognition model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    /// Path to the ONNX model
    pub path: PathBuf,
    /// Optional vocabulary file, overrides the model's `vocab` metadata
    pub vocab_path: Option<PathBuf>,
    /// Input height override for models exported with dynamic dimensions
    pub input_height: Option<u32>,
    /// Input width override for models exported with dynamic dimensions
    pub input_width: Option<u32>,
    /// ONNX Runtime intra-op thread count
    pub intra_threads: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("Model/model.onnx"),
            vocab_path: None,
            input_height: None,
            input_width: None,
            intra_threads: 4,
        }
    }
}

/// Prescription backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// Base URL of the handler controller
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5198/api/Handler".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Upload folder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    /// Folder holding stashed prescription images
    pub dir: PathBuf,
    /// Files older than this many seconds are removed on cleanup
    pub max_age_secs: u64,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("uploads"),
            max_age_secs: 3600,
        }
    }
}

/// Offline evaluation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationSettings {
    /// Treat the first CSV row as a header
    pub has_header: bool,
    /// How predicted characters are labelled
    pub match_mode: MatchMode,
}

impl Default for EvaluationSettings {
    fn default() -> Self {
        Self {
            has_header: true,
            match_mode: MatchMode::Containment,
        }
    }
}

impl AppConfig {
    /// Apply environment overrides
    pub fn apply_env(&mut self) {
        self.apply_backend_url(std::env::var(BACKEND_URL_ENV).ok());
    }

    /// Replace the backend URL unless the value is missing or blank
    fn apply_backend_url(&mut self, value: Option<String>) {
        if let Some(url) = value {
            if !url.trim().is_empty() {
                self.backend.base_url = url;
            }
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
