//! Offline evaluation
//!
//! Scores a recognition model against a labeled validation set. Each sample
//! gets a character error rate plus character-level precision, recall and F1;
//! the run reports their means.
//!
//! Precision/recall are computed on binary labels derived from the
//! prediction and truth after padding both to a common length:
//! - truth positions are positive when they hold a non-blank character
//! - prediction positions are positive when they hold a non-blank character
//!   that occurs somewhere in the truth ([`MatchMode::Containment`], default)
//!   or equals the truth character at that position
//!   ([`MatchMode::Positional`])

pub mod align;
pub mod batch;
pub mod classify;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod report;

pub use batch::BatchEvaluator;
pub use dataset::{load_dataset, DatasetOptions};

/// How predicted characters are labelled positive
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Character occurs anywhere in the truth
    #[default]
    Containment,
    /// Character equals the truth character at the same position
    Positional,
}
