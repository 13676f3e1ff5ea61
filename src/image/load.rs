//! Image loading utilities.

use std::path::Path;

use image::{imageops::FilterType, DynamicImage};
use ndarray::Array3;

use crate::error::{Error, Result};

use super::RGB_CHANNELS;

/// Load an image from disk as a CHW tensor.
///
/// The image is converted to RGB and normalized to the [-1, 1] range. The
/// result has shape `(3, height, width)` at the file's native resolution.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Array3<f32>> {
    let img = open(path.as_ref())?;
    Ok(image_to_tensor(&img))
}

/// Load an image from disk and resize it to `(width, height)` with Lanczos3.
///
/// # Errors
///
/// Returns an error if the image cannot be loaded or a dimension is zero.
pub fn load_image_resized<P: AsRef<Path>>(path: P, size: (u32, u32)) -> Result<Array3<f32>> {
    let (width, height) = size;
    if width == 0 || height == 0 {
        return Err(Error::InvalidParameter {
            name: "size".to_string(),
            reason: format!("{width}x{height} has a zero dimension"),
        });
    }

    let img = open(path.as_ref())?;
    let resized = img.resize_exact(width, height, FilterType::Lanczos3);
    Ok(image_to_tensor(&resized))
}

fn open(path: &Path) -> Result<DynamicImage> {
    tracing::info!("Loading image: {}", path.display());

    image::open(path).map_err(|source| Error::ImageLoad {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert a `DynamicImage` to a normalized CHW tensor.
fn image_to_tensor(img: &DynamicImage) -> Array3<f32> {
    let rgb = img.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);

    Array3::from_shape_fn((RGB_CHANNELS, height, width), |(c, y, x)| {
        // Safe: x and y are bounded by the image's own u32 dimensions
        #[allow(clippy::cast_possible_truncation)]
        let pixel = rgb.get_pixel(x as u32, y as u32);
        // Normalize from [0, 255] to [-1, 1]
        (f32::from(pixel[c]) / 127.5) - 1.0
    })
}
