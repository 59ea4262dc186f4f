//! Binary character labels derived from an aligned pair

use std::collections::HashSet;

use super::align::{AlignedPair, BLANK};
use super::MatchMode;

/// Truth and prediction label vectors of equal length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryLabels {
    pub y_true: Vec<u8>,
    pub y_pred: Vec<u8>,
}

/// Derive per-position labels for `pair`.
///
/// `y_true[i]` marks a non-blank truth character. Under
/// [`MatchMode::Containment`] `y_pred[i]` marks a non-blank predicted
/// character that occurs anywhere in `truth`, regardless of position.
/// Under [`MatchMode::Positional`] it must equal the truth character at `i`.
pub fn classify(pair: &AlignedPair, truth: &str, mode: MatchMode) -> BinaryLabels {
    let y_true = pair
        .truth
        .iter()
        .map(|&c| u8::from(c != BLANK))
        .collect();

    let y_pred = match mode {
        MatchMode::Containment => {
            let truth_chars: HashSet<char> = truth.chars().collect();
            pair.pred
                .iter()
                .map(|c| u8::from(*c != BLANK && truth_chars.contains(c)))
                .collect()
        }
        MatchMode::Positional => pair
            .pred
            .iter()
            .zip(&pair.truth)
            .map(|(p, t)| u8::from(*p != BLANK && p == t))
            .collect(),
    };

    BinaryLabels { y_true, y_pred }
}
