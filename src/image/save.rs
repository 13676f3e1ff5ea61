//! Image saving utilities.

use std::path::Path;

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};

use crate::error::{Error, Result};

use super::{ImageTensor, RGB_CHANNELS};

/// Save a single-image tensor as an image file.
///
/// The tensor must have shape `(1, C, H, W)` with `C` equal to 1 (grayscale)
/// or 3 (RGB) and values in [-1, 1]; out-of-range values are clamped. The
/// format is inferred from the extension.
///
/// # Arguments
///
/// * `tensor` - NCHW tensor with a batch dimension of 1
/// * `path` - Output file path
/// * `quality` - JPEG quality (1-100), ignored for other formats
///
/// # Errors
///
/// Returns an error if the tensor shape is unsupported or the image cannot be saved.
pub fn save_image<P: AsRef<Path>>(tensor: &ImageTensor, path: P, quality: u8) -> Result<()> {
    let path = path.as_ref();

    if !(1..=100).contains(&quality) {
        return Err(Error::InvalidParameter {
            name: "quality".to_string(),
            reason: "must be between 1 and 100".to_string(),
        });
    }

    let img = tensor_to_image(tensor)?;

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("png")
        .to_lowercase();

    tracing::info!("Saving image: {}", path.display());

    match extension.as_str() {
        "jpg" | "jpeg" => {
            let mut output = std::fs::File::create(path)?;
            let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut output, quality);
            img.write_with_encoder(encoder)
                .map_err(|source| Error::ImageSave {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        _ => {
            img.save(path).map_err(|source| Error::ImageSave {
                path: path.to_path_buf(),
                source,
            })?;
        }
    }

    Ok(())
}

/// Convert a normalized `(1, C, H, W)` tensor to an image.
#[allow(clippy::cast_possible_truncation)]
fn tensor_to_image(tensor: &ImageTensor) -> Result<DynamicImage> {
    let (batch, channels, height, width) = tensor.dim();
    let too_large = u32::try_from(width).is_err() || u32::try_from(height).is_err();

    if batch != 1 || !(channels == 1 || channels == RGB_CHANNELS) || too_large {
        return Err(Error::UnsupportedShape {
            shape: tensor.shape().to_vec(),
        });
    }

    // Safe: both dimensions were checked to fit in u32 above
    let (w, h) = (width as u32, height as u32);

    let img = if channels == 1 {
        DynamicImage::ImageLuma8(GrayImage::from_fn(w, h, |x, y| {
            Luma([denormalize(tensor[[0, 0, y as usize, x as usize]])])
        }))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |x, y| {
            let (x, y) = (x as usize, y as usize);
            Rgb([
                denormalize(tensor[[0, 0, y, x]]),
                denormalize(tensor[[0, 1, y, x]]),
                denormalize(tensor[[0, 2, y, x]]),
            ])
        }))
    };

    Ok(img)
}

/// Denormalize a value from [-1, 1] to [0, 255] with clamping.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn denormalize(value: f32) -> u8 {
    // Safe: clamped to [0, 255] range before casting
    let scaled = (value + 1.0) * 127.5;
    scaled.clamp(0.0, 255.0) as u8
}
