//! Image preprocessing for the recognition model
//!
//! The model takes a single NHWC `f32` image in BGR channel order with raw
//! `[0, 255]` pixel values, resized to its fixed input size.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage, ImageResult};
use ndarray::Array4;

/// Decode an image file into memory
pub fn load_image(path: &Path) -> ImageResult<DynamicImage> {
    image::open(path)
}

/// Fixed spatial input size of the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSize {
    pub width: u32,
    pub height: u32,
}

/// Resize `image` to `size` and pack it as a `[1, H, W, 3]` BGR tensor
pub fn to_input_tensor(image: &DynamicImage, size: InputSize) -> Array4<f32> {
    let resized = image
        .resize_exact(size.width, size.height, FilterType::Triangle)
        .to_rgb8();

    let (w, h) = (size.width as usize, size.height as usize);
    let mut tensor = Array4::<f32>::zeros((1, h, w, 3));

    for (x, y, pixel) in resized.enumerate_pixels() {
        let [r, g, b] = pixel.0;
        let (x, y) = (x as usize, y as usize);
        tensor[[0, y, x, 0]] = b as f32;
        tensor[[0, y, x, 1]] = g as f32;
        tensor[[0, y, x, 2]] = r as f32;
    }

    tensor
}
