//! ONNX Runtime session handling
//!
//! Loads the recognition model once and exposes its tensor layout and
//! embedded metadata.

use ndarray::Array4;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use tracing::{debug, info};

use super::error::ModelError;

/// Metadata key holding the recognition vocabulary
pub const VOCAB_METADATA_KEY: &str = "vocab";

/// ONNX Runtime session wrapper
pub struct OnnxSession {
    session: Session,
    input_names: Vec<String>,
}

impl OnnxSession {
    /// Create a new ONNX session from a model file
    pub fn new(model_path: &Path, intra_threads: usize) -> Result<Self, ModelError> {
        info!("Loading ONNX model from {:?}", model_path);

        let load_error = |e: ort::Error| ModelError::Load {
            path: model_path.to_path_buf(),
            message: e.to_string(),
        };

        let session = Session::builder()
            .map_err(load_error)?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(load_error)?
            .with_intra_threads(intra_threads.max(1))
            .map_err(load_error)?
            .commit_from_file(model_path)
            .map_err(load_error)?;

        let input_names: Vec<String> = session
            .inputs
            .iter()
            .map(|input| input.name.clone())
            .collect();

        let output_names: Vec<String> = session
            .outputs
            .iter()
            .map(|output| output.name.clone())
            .collect();

        info!(
            "Model loaded. Inputs: {:?}, Outputs: {:?}",
            input_names, output_names
        );

        Ok(Self {
            session,
            input_names,
        })
    }

    /// Get input tensor info
    pub fn input_info(&self) -> Vec<TensorInfo> {
        self.session
            .inputs
            .iter()
            .map(|input| TensorInfo {
                name: input.name.clone(),
                shape: extract_shape(&input.input_type),
            })
            .collect()
    }

    /// Read a custom metadata entry embedded in the model
    pub fn custom_metadata(&self, key: &str) -> Result<Option<String>, ModelError> {
        let metadata = self
            .session
            .metadata()
            .map_err(|e| ModelError::runtime("reading model metadata", e))?;
        metadata
            .custom(key)
            .map_err(|e| ModelError::runtime("reading model metadata", e))
    }

    /// Run the model on a single input and return the first output as
    /// `(shape, data)`
    pub fn run(&mut self, input: Array4<f32>) -> Result<(Vec<i64>, Vec<f32>), ModelError> {
        let input_name = self
            .input_names
            .first()
            .cloned()
            .ok_or_else(|| ModelError::runtime("onnx forward pass", "model has no inputs"))?;

        let tensor =
            Tensor::from_array(input).map_err(|e| ModelError::runtime("onnx input tensor", e))?;
        let outputs = self
            .session
            .run(ort::inputs![input_name.as_str() => tensor])
            .map_err(|e| ModelError::runtime("onnx forward pass", e))?;

        if outputs.len() == 0 {
            return Err(ModelError::runtime(
                "onnx forward pass",
                "model produced no outputs",
            ));
        }

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ModelError::runtime("onnx extract output", e))?;
        debug!("Model output shape: {:?}", shape);

        Ok((shape.iter().copied().collect(), data.to_vec()))
    }
}

/// Tensor shape information
#[derive(Debug, Clone)]
pub struct TensorInfo {
    pub name: String,
    pub shape: Vec<i64>,
}

/// Extract shape from ONNX value type
fn extract_shape(value_type: &ort::value::ValueType) -> Vec<i64> {
    if let Some(shape) = value_type.tensor_shape() {
        shape.iter().copied().collect()
    } else {
        vec![]
    }
}
