//! Character error rate and binary classification metrics

use serde::Serialize;

use super::classify::BinaryLabels;

/// Confusion counts over a pair of binary label vectors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfusionCounts {
    pub tp: usize,
    pub fp: usize,
    pub fn_: usize,
}

impl ConfusionCounts {
    /// Count TP/FP/FN over equal-length vectors
    pub fn from_labels(y_true: &[u8], y_pred: &[u8]) -> Self {
        debug_assert_eq!(y_true.len(), y_pred.len());

        let mut counts = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t != 0, p != 0) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (true, false) => counts.fn_ += 1,
                (false, false) => {}
            }
        }
        counts
    }

    /// `TP / (TP + FP)`, 0 when nothing was predicted positive
    pub fn precision(&self) -> f64 {
        ratio(self.tp, self.tp + self.fp)
    }

    /// `TP / (TP + FN)`, 0 when nothing is positive in the truth
    pub fn recall(&self) -> f64 {
        ratio(self.tp, self.tp + self.fn_)
    }
}

/// Precision, recall and F1 for one sample
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ClassificationScores {
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl ClassificationScores {
    pub fn from_labels(labels: &BinaryLabels) -> Self {
        let counts = ConfusionCounts::from_labels(&labels.y_true, &labels.y_pred);
        let precision = counts.precision();
        let recall = counts.recall();
        let f1 = if precision + recall == 0.0 {
            0.0
        } else {
            2.0 * precision * recall / (precision + recall)
        };

        Self {
            precision,
            recall,
            f1,
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Character error rate: Levenshtein distance over the reference length.
///
/// Case and whitespace sensitive. An empty reference yields 0.0.
pub fn cer(prediction: &str, reference: &str) -> f64 {
    let total = reference.chars().count();
    if total == 0 {
        return 0.0;
    }
    strsim::levenshtein(prediction, reference) as f64 / total as f64
}
