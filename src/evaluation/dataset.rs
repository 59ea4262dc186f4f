//! Validation dataset loading
//!
//! A dataset is a two-column CSV of `image_path,label` rows. Paths written
//! with Windows separators are normalized, and relative paths are resolved
//! against an image root.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::error::DatasetError;

/// One labeled validation image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub image_path: PathBuf,
    pub label: String,
}

/// How a dataset file is read
#[derive(Debug, Clone, Default)]
pub struct DatasetOptions {
    /// Skip the first row
    pub has_header: bool,
    /// Directory relative image paths are joined to
    pub image_root: Option<PathBuf>,
}

/// Load every row of `path` in file order.
pub fn load_dataset(path: &Path, options: &DatasetOptions) -> Result<Vec<Sample>, DatasetError> {
    let csv_error = |source: csv::Error| DatasetError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.has_header)
        .flexible(true)
        .from_path(path)
        .map_err(csv_error)?;

    let csv_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut samples = Vec::new();

    for record in reader.records() {
        let record = record.map_err(csv_error)?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        if record.len() < 2 {
            return Err(DatasetError::InvalidRow {
                path: path.to_path_buf(),
                line,
                columns: record.len(),
            });
        }

        let raw_path = record[0].trim();
        if raw_path.is_empty() {
            return Err(DatasetError::EmptyImagePath {
                path: path.to_path_buf(),
                line,
            });
        }

        let image_path = resolve_image_path(raw_path, options.image_root.as_deref(), csv_dir);
        samples.push(Sample {
            image_path,
            label: record[1].to_string(),
        });
    }

    info!("Loaded {} samples from {:?}", samples.len(), path);
    Ok(samples)
}

/// Normalize separators and resolve a relative path.
///
/// With an explicit root the path is always joined to it. Without one, a
/// path that does not exist as given falls back to the CSV's directory.
fn resolve_image_path(raw: &str, image_root: Option<&Path>, csv_dir: &Path) -> PathBuf {
    let normalized = PathBuf::from(raw.replace('\\', "/"));
    if normalized.is_absolute() {
        return normalized;
    }

    match image_root {
        Some(root) => root.join(normalized),
        None if normalized.exists() => normalized,
        None => {
            let candidate = csv_dir.join(&normalized);
            if candidate.exists() {
                debug!("Resolved {:?} relative to dataset directory", normalized);
                candidate
            } else {
                normalized
            }
        }
    }
}
