//! Normalization of mixed-rank image tensors into NCHW batch entries.

mod input;
mod normalizer;

pub use input::{ImageInput, InputItem};
pub use normalizer::{batch_len, normalize, stack, Config, Normalizer};
