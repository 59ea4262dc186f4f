//! Greedy CTC decoding
//!
//! Converts per-timestep class scores into text: take the best class at each
//! step, merge consecutive repeats, then drop the blank class. The blank is
//! the last class, one past the end of the vocabulary.

use ndarray::ArrayView2;

/// Best-path decoder over a fixed vocabulary
#[derive(Debug, Clone)]
pub struct CtcDecoder {
    vocab: Vec<char>,
}

impl CtcDecoder {
    pub fn new(vocab: &str) -> Self {
        Self {
            vocab: vocab.chars().collect(),
        }
    }

    /// Index of the blank class
    pub fn blank_index(&self) -> usize {
        self.vocab.len()
    }

    pub fn vocab_len(&self) -> usize {
        self.vocab.len()
    }

    /// Decode a `[timesteps, classes]` score matrix.
    ///
    /// Classes beyond the vocabulary other than the blank are ignored.
    pub fn decode(&self, scores: ArrayView2<'_, f32>) -> String {
        let blank = self.blank_index();
        let mut text = String::new();
        let mut previous: Option<usize> = None;

        for row in scores.rows() {
            let best = argmax(row.iter().copied());
            if best == previous {
                continue;
            }
            previous = best;

            match best {
                Some(index) if index != blank => {
                    if let Some(&c) = self.vocab.get(index) {
                        text.push(c);
                    }
                }
                _ => {}
            }
        }

        text
    }
}

/// First index of the maximum, ignoring NaN
fn argmax(values: impl Iterator<Item = f32>) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, v) in values.enumerate() {
        if v.is_nan() {
            continue;
        }
        match best {
            Some((_, b)) if v <= b => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}
