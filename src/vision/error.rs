use std::path::PathBuf;

use thiserror::Error;

/// Recognition model failures
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("failed to load ONNX model {path}: {message}")]
    Load { path: PathBuf, message: String },
    #[error("failed to read vocabulary {path}: {source}")]
    Vocab {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model has no vocabulary; set model.vocab_path or embed `vocab` metadata")]
    MissingVocab,
    #[error("model input {name} has unsupported shape {shape:?}: {message}")]
    InputShape {
        name: String,
        shape: Vec<i64>,
        message: String,
    },
    #[error("{context}: {message}")]
    Runtime {
        context: &'static str,
        message: String,
    },
}

impl ModelError {
    pub(crate) fn runtime(context: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Runtime {
            context,
            message: err.to_string(),
        }
    }
}
