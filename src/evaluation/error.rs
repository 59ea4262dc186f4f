use std::path::PathBuf;

use thiserror::Error;

use crate::vision::ModelError;

/// Failures while reading a validation dataset
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("{path}, line {line}: expected image path and label, found {columns} column(s)")]
    InvalidRow {
        path: PathBuf,
        line: u64,
        columns: usize,
    },
    #[error("{path}, line {line}: empty image path")]
    EmptyImagePath { path: PathBuf, line: u64 },
}

/// Failures that abort an evaluation run
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("failed to load image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("prediction failed for {path}: {source}")]
    Prediction {
        path: PathBuf,
        #[source]
        source: ModelError,
    },
    #[error("I/O error while {context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}
