//! Character alignment for set-style comparison

/// Padding character used to equalize sequence lengths
pub const BLANK: char = ' ';

/// Prediction and ground truth padded to a common length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedPair {
    /// Predicted characters
    pub pred: Vec<char>,
    /// Ground-truth characters
    pub truth: Vec<char>,
}

/// Right-pad the shorter of `pred` and `truth` with [`BLANK`].
///
/// Lengths are counted in `char`s. Nothing is ever truncated.
pub fn align(pred: &str, truth: &str) -> AlignedPair {
    let mut pred: Vec<char> = pred.chars().collect();
    let mut truth: Vec<char> = truth.chars().collect();

    let len = pred.len().max(truth.len());
    pred.resize(len, BLANK);
    truth.resize(len, BLANK);

    AlignedPair { pred, truth }
}
