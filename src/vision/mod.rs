//! Vision/OCR Layer
//!
//! Turns a prescription image into text. The recognizer is a CTC model run
//! through ONNX Runtime:
//! - `preprocess` resizes the image into the model's input tensor
//! - `models` owns the ONNX session
//! - `ctc` decodes per-timestep scores into characters
//! - `ocr` ties them together behind the [`Predictor`] trait

pub mod ctc;
pub mod error;
pub mod models;
pub mod ocr;
pub mod preprocess;

use image::DynamicImage;

pub use error::ModelError;
pub use ocr::ImageToWordModel;
pub use preprocess::load_image;

/// Anything that can read the text in an in-memory image.
///
/// Resizing to the model's expected dimensions is the predictor's job.
pub trait Predictor {
    fn predict(&mut self, image: &DynamicImage) -> Result<String, ModelError>;
}
