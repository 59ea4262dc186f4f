//! Handwritten word recognition
//!
//! Runs a CTC recognition model via ONNX Runtime and decodes its output with
//! the model's vocabulary.

use std::path::Path;
use std::time::Instant;

use image::DynamicImage;
use ndarray::ArrayView2;
use tracing::{debug, info};

use super::ctc::CtcDecoder;
use super::error::ModelError;
use super::models::{OnnxSession, TensorInfo, VOCAB_METADATA_KEY};
use super::preprocess::{to_input_tensor, InputSize};
use super::Predictor;
use crate::config::ModelSettings;

/// Image-to-word recognizer backed by one ONNX session
pub struct ImageToWordModel {
    session: OnnxSession,
    input_size: InputSize,
    decoder: CtcDecoder,
}

impl ImageToWordModel {
    /// Load the model described by `settings`.
    ///
    /// This creates the ONNX Runtime session, which is the expensive part;
    /// load once and reuse the model for every prediction.
    pub fn load(settings: &ModelSettings) -> Result<Self, ModelError> {
        let session = OnnxSession::new(&settings.path, settings.intra_threads)?;

        let inputs = session.input_info();
        let input = inputs.first().ok_or_else(|| ModelError::InputShape {
            name: String::new(),
            shape: vec![],
            message: "model has no inputs".to_string(),
        })?;
        let input_size = resolve_input_size(input, settings.input_height, settings.input_width)?;

        let vocab = match &settings.vocab_path {
            Some(path) => read_vocab_file(path)?,
            None => session
                .custom_metadata(VOCAB_METADATA_KEY)?
                .ok_or(ModelError::MissingVocab)?,
        };
        if vocab.is_empty() {
            return Err(ModelError::MissingVocab);
        }

        info!(
            "Recognizer ready: input {}x{}, {} vocabulary characters",
            input_size.width,
            input_size.height,
            vocab.chars().count()
        );

        Ok(Self {
            session,
            input_size,
            decoder: CtcDecoder::new(&vocab),
        })
    }
}

impl Predictor for ImageToWordModel {
    fn predict(&mut self, image: &DynamicImage) -> Result<String, ModelError> {
        let start = Instant::now();

        let tensor = to_input_tensor(image, self.input_size);
        let (shape, data) = self.session.run(tensor)?;

        // [batch, timesteps, classes]; only the first batch item is used
        let (timesteps, classes) = match shape.as_slice() {
            [_, t, c] if *t > 0 && *c > 0 => (*t as usize, *c as usize),
            _ => {
                return Err(ModelError::runtime(
                    "decoding model output",
                    format!("expected [batch, timesteps, classes], got {:?}", shape),
                ))
            }
        };
        if data.len() < timesteps * classes {
            return Err(ModelError::runtime(
                "decoding model output",
                "output tensor is empty",
            ));
        }
        if classes != self.decoder.vocab_len() + 1 {
            debug!(
                "Output has {} classes for a vocabulary of {}",
                classes,
                self.decoder.vocab_len()
            );
        }

        let scores = ArrayView2::from_shape((timesteps, classes), &data[..timesteps * classes])
            .map_err(|e| ModelError::runtime("decoding model output", e))?;
        let text = self.decoder.decode(scores);

        debug!("Predicted {:?} in {:?}", text, start.elapsed());
        Ok(text)
    }
}

/// Take H and W from an NHWC input, using overrides for dynamic dimensions
fn resolve_input_size(
    input: &TensorInfo,
    height_override: Option<u32>,
    width_override: Option<u32>,
) -> Result<InputSize, ModelError> {
    let shape_error = |message: &str| ModelError::InputShape {
        name: input.name.clone(),
        shape: input.shape.clone(),
        message: message.to_string(),
    };

    if input.shape.len() != 4 {
        return Err(shape_error("expected [batch, height, width, channels]"));
    }

    // Overrides fill dynamic dims; a fixed dim must agree with its override
    let dim = |value: i64, over: Option<u32>, key: &str| match (value, over) {
        (v, Some(o)) if v > 0 && i64::from(o) != v => Err(shape_error(&format!(
            "model fixes this dimension to {}, but model.{} is {}",
            v, key, o
        ))),
        (v, _) if v > 0 => u32::try_from(v).map_err(|_| shape_error("dimension out of range")),
        (_, Some(o)) if o > 0 => Ok(o),
        _ => Err(shape_error(&format!("dynamic dimension; set model.{}", key))),
    };

    let height = dim(input.shape[1], height_override, "input_height")?;
    let width = dim(input.shape[2], width_override, "input_width")?;

    Ok(InputSize { width, height })
}

/// Read a vocabulary file: every character of the file, minus the trailing
/// line break
fn read_vocab_file(path: &Path) -> Result<String, ModelError> {
    let content = std::fs::read_to_string(path).map_err(|source| ModelError::Vocab {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content.trim_end_matches(['\r', '\n']).to_string())
}
