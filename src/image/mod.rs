//! Image loading and saving utilities.

mod load;
mod save;

pub use load::{load_image, load_image_resized};
pub use save::save_image;

use ndarray::Array4;

/// Image tensor in NCHW format (batch, channels, height, width).
/// Values are normalized to [-1, 1] range.
pub type ImageTensor = Array4<f32>;

/// Number of channels in RGB images.
pub const RGB_CHANNELS: usize = 3;
