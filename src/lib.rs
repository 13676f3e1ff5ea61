//! # tensorbatch
//!
//! Normalizes image tensors of mixed rank into a uniform list of NCHW entries.
//!
//! Inputs may be a single CHW tensor, a single NCHW batch, or a sequence of
//! either. A batch is split into `(1, C, H, W)` entries, a CHW image gains a
//! leading batch axis, and tensors in a sequence are brought to rank 4 in
//! order.
//!
//! ## Example
//!
//! ```
//! use ndarray::{Array3, Array4};
//! use tensorbatch::normalize;
//!
//! # fn main() -> tensorbatch::Result<()> {
//! let batch = Array4::<f32>::zeros((2, 3, 8, 8));
//! let entries = normalize(batch)?;
//! assert_eq!(entries.len(), 2);
//! assert_eq!(entries[0].shape(), &[1, 3, 8, 8]);
//!
//! let images = vec![Array3::<f32>::zeros((3, 4, 4)); 2];
//! let entries = normalize(images)?;
//! assert!(entries.iter().all(|e| e.shape() == [1, 3, 4, 4]));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod normalize;

pub use error::{Error, Result};
pub use normalize::{batch_len, normalize, stack, Config, ImageInput, InputItem, Normalizer};
