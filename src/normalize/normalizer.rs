//! Shape normalization of image tensors into NCHW batch entries.

use ndarray::{concatenate, Array4, ArrayD, Axis, Ix3, Ix4};

use crate::error::{Error, Result};

use super::input::{ImageInput, InputItem};

/// Configuration for the shape normalizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Split rank-4 tensors found inside a sequence along the batch axis.
    /// When false they pass through unchanged.
    pub split_sequence_batches: bool,

    /// Required channel count for every output entry. None accepts any.
    pub expected_channels: Option<usize>,

    /// Whether an input that yields no entries is accepted.
    pub allow_empty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            split_sequence_batches: false,
            expected_channels: None,
            allow_empty: true,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.expected_channels == Some(0) {
            return Err(Error::InvalidParameter {
                name: "expected_channels".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Converts [`ImageInput`] values into a list of rank-4 tensors.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    config: Config,
}

impl Normalizer {
    /// Create a normalizer with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Normalize an input into NCHW entries.
    ///
    /// * A rank-4 tensor is split into one `(1, C, H, W)` entry per batch item.
    /// * A rank-3 tensor becomes a single `(1, C, H, W)` entry.
    /// * In a sequence, rank-3 tensors gain a leading axis and rank-4 tensors
    ///   are kept as they are (or split, see [`Config::split_sequence_batches`]).
    ///
    /// Output order follows input order. The first offending element aborts
    /// the call and nothing produced so far is returned.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidShape`] for tensors whose rank is not 3 or 4.
    /// * [`Error::InvalidElementType`] for non-tensor sequence elements.
    /// * [`Error::ChannelMismatch`] and [`Error::EmptyInput`] per configuration.
    pub fn normalize<A, I>(&self, images: I) -> Result<Vec<Array4<A>>>
    where
        A: Clone,
        I: Into<ImageInput<A>>,
    {
        let images = images.into();
        let kind = images.type_name();

        let entries = match images {
            ImageInput::Tensor(tensor) => split_or_wrap(tensor, None)?,
            ImageInput::Sequence(items) => self.normalize_sequence(items)?,
        };

        tracing::debug!("Normalized {kind} input into {} entries", entries.len());

        self.check(&entries)?;
        Ok(entries)
    }

    fn normalize_sequence<A: Clone>(&self, items: Vec<InputItem<A>>) -> Result<Vec<Array4<A>>> {
        let mut entries = Vec::with_capacity(items.len());

        for (index, item) in items.into_iter().enumerate() {
            let tensor = match item {
                InputItem::Tensor(tensor) => tensor,
                other => {
                    return Err(Error::InvalidElementType {
                        type_name: other.type_name(),
                        index,
                    })
                }
            };

            match tensor.ndim() {
                3 => entries.push(add_batch_axis(tensor, Some(index))?),
                4 if self.config.split_sequence_batches => {
                    entries.extend(split_or_wrap(tensor, Some(index))?);
                }
                4 => entries.push(into_nchw(tensor, Some(index))?),
                rank => {
                    return Err(Error::InvalidShape {
                        rank,
                        index: Some(index),
                    })
                }
            }
        }

        Ok(entries)
    }

    fn check<A>(&self, entries: &[Array4<A>]) -> Result<()> {
        if !self.config.allow_empty && batch_len(entries) == 0 {
            return Err(Error::EmptyInput);
        }

        if let Some(expected) = self.config.expected_channels {
            for (index, entry) in entries.iter().enumerate() {
                let actual = entry.dim().1;
                if actual != expected {
                    return Err(Error::ChannelMismatch {
                        expected,
                        actual,
                        index,
                    });
                }
            }
        }

        Ok(())
    }
}

/// Normalize an input with the default configuration.
///
/// # Errors
///
/// See [`Normalizer::normalize`].
pub fn normalize<A, I>(images: I) -> Result<Vec<Array4<A>>>
where
    A: Clone,
    I: Into<ImageInput<A>>,
{
    Normalizer::default().normalize(images)
}

/// Total number of images across entries (sum of the batch dimensions).
#[must_use]
pub fn batch_len<A>(entries: &[Array4<A>]) -> usize {
    entries.iter().map(|e| e.dim().0).sum()
}

/// Concatenate normalized entries along the batch axis.
///
/// # Errors
///
/// Returns [`Error::EmptyInput`] for an empty slice and
/// [`Error::ShapeMismatch`] if the entries disagree on `(C, H, W)`.
pub fn stack<A: Clone>(entries: &[Array4<A>]) -> Result<Array4<A>> {
    let first = entries.first().ok_or(Error::EmptyInput)?;
    let (_, c, h, w) = first.dim();

    if let Some(bad) = entries.iter().find(|e| {
        let (_, ec, eh, ew) = e.dim();
        (ec, eh, ew) != (c, h, w)
    }) {
        return Err(Error::ShapeMismatch {
            expected: format!("(_, {c}, {h}, {w})"),
            actual: format!("{:?}", bad.shape()),
        });
    }

    let views: Vec<_> = entries.iter().map(Array4::view).collect();
    concatenate(Axis(0), &views).map_err(|_| Error::ShapeMismatch {
        expected: format!("(_, {c}, {h}, {w})"),
        actual: "concatenation failed".to_string(),
    })
}

/// Split a single tensor into `(1, C, H, W)` entries.
fn split_or_wrap<A: Clone>(tensor: ArrayD<A>, index: Option<usize>) -> Result<Vec<Array4<A>>> {
    match tensor.ndim() {
        4 => {
            let batch = into_nchw(tensor, index)?;
            Ok(batch
                .axis_iter(Axis(0))
                .map(|image| image.insert_axis(Axis(0)).to_owned())
                .collect())
        }
        3 => Ok(vec![add_batch_axis(tensor, index)?]),
        rank => Err(Error::InvalidShape { rank, index }),
    }
}

fn add_batch_axis<A>(tensor: ArrayD<A>, index: Option<usize>) -> Result<Array4<A>> {
    let rank = tensor.ndim();
    tensor
        .into_dimensionality::<Ix3>()
        .map(|chw| chw.insert_axis(Axis(0)))
        .map_err(|_| Error::InvalidShape { rank, index })
}

fn into_nchw<A>(tensor: ArrayD<A>, index: Option<usize>) -> Result<Array4<A>> {
    let rank = tensor.ndim();
    tensor
        .into_dimensionality::<Ix4>()
        .map_err(|_| Error::InvalidShape { rank, index })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{s, Array, Array3, IxDyn};

    fn ramp(shape: &[usize]) -> ArrayD<f32> {
        #[allow(clippy::cast_precision_loss)]
        let n = shape.iter().product::<usize>() as f32;
        Array::linspace(0.0, n - 1.0, shape.iter().product())
            .into_shape_with_order(IxDyn(shape))
            .unwrap()
    }

    #[test]
    fn test_batched_tensor_is_split() {
        let input = ramp(&[2, 3, 8, 8]);
        let out = normalize(input.clone()).unwrap();
        let input = input.into_dimensionality::<Ix4>().unwrap();

        assert_eq!(out.len(), 2);
        for (i, entry) in out.iter().enumerate() {
            assert_eq!(entry.shape(), &[1, 3, 8, 8]);
            assert_eq!(entry.view(), input.slice(s![i..=i, .., .., ..]));
        }
    }

    #[test]
    fn test_single_image_gets_batch_axis() {
        let input = ramp(&[3, 8, 8]);
        let out = normalize(input.clone()).unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].shape(), &[1, 3, 8, 8]);
        assert_eq!(out[0].index_axis(Axis(0), 0).into_dyn(), input.view());
    }

    #[test]
    fn test_bad_rank_single_tensor() {
        for shape in [&[][..], &[4][..], &[4, 4][..], &[1, 1, 3, 4, 4][..]] {
            let err = normalize(ArrayD::<f32>::zeros(IxDyn(shape))).unwrap_err();
            match err {
                Error::InvalidShape { rank, index } => {
                    assert_eq!(rank, shape.len());
                    assert_eq!(index, None);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_sequence_of_chw() {
        let input = vec![
            Array3::<f32>::zeros((3, 4, 4)),
            Array3::<f32>::ones((3, 4, 4)),
        ];
        let out = normalize(input).unwrap();

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|e| e.shape() == [1, 3, 4, 4]));
        assert!(out[0].iter().all(|&v| v == 0.0));
        assert!(out[1].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_mixed_sequence_keeps_order_and_batches() {
        let items: Vec<InputItem<f32>> = vec![
            Array3::<f32>::zeros((3, 4, 4)).into(),
            Array4::<f32>::ones((2, 3, 4, 4)).into(),
            Array3::<f32>::from_elem((1, 5, 5), 2.0).into(),
        ];
        let out = normalize(items).unwrap();

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].shape(), &[1, 3, 4, 4]);
        assert_eq!(out[1].shape(), &[2, 3, 4, 4]);
        assert_eq!(out[2].shape(), &[1, 1, 5, 5]);
        assert!(out[1].iter().all(|&v| v == 1.0));
        assert!(out[2].iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_sequence_bad_rank_reports_index() {
        let items: Vec<InputItem<f32>> = vec![
            Array3::<f32>::zeros((3, 4, 4)).into(),
            ArrayD::<f32>::zeros(IxDyn(&[4, 4])).into(),
        ];
        let err = normalize(items).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidShape {
                rank: 2,
                index: Some(1)
            }
        ));
    }

    #[test]
    fn test_non_tensor_element_after_tensors() {
        let items: Vec<InputItem<f32>> = vec![
            Array3::<f32>::zeros((3, 4, 4)).into(),
            Array3::<f32>::zeros((3, 4, 4)).into(),
            InputItem::Scalar(7.0),
        ];
        let err = normalize(items).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidElementType {
                type_name: "scalar",
                index: 2
            }
        ));
    }

    #[test]
    fn test_first_bad_element_wins() {
        let items: Vec<InputItem<f32>> = vec![
            InputItem::Text("cat.png".to_string()),
            ArrayD::<f32>::zeros(IxDyn(&[2])).into(),
        ];
        let err = normalize(items).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidElementType {
                type_name: "text",
                index: 0
            }
        ));
    }

    #[test]
    fn test_empty_sequence() {
        let out = normalize(Vec::<InputItem<f32>>::new()).unwrap();
        assert!(out.is_empty());

        let strict = Normalizer::new(Config {
            allow_empty: false,
            ..Config::default()
        })
        .unwrap();
        let err = strict.normalize(Vec::<InputItem<f32>>::new()).unwrap_err();
        assert!(matches!(err, Error::EmptyInput));
    }

    #[test]
    fn test_split_sequence_batches() {
        let normalizer = Normalizer::new(Config {
            split_sequence_batches: true,
            ..Config::default()
        })
        .unwrap();

        let items: Vec<InputItem<f32>> = vec![
            Array4::<f32>::zeros((3, 3, 4, 4)).into(),
            Array3::<f32>::zeros((3, 4, 4)).into(),
        ];
        let out = normalizer.normalize(items).unwrap();

        assert_eq!(out.len(), 4);
        assert!(out.iter().all(|e| e.shape() == [1, 3, 4, 4]));
    }

    #[test]
    fn test_expected_channels() {
        let normalizer = Normalizer::new(Config {
            expected_channels: Some(3),
            ..Config::default()
        })
        .unwrap();

        let items: Vec<InputItem<f32>> = vec![
            Array3::<f32>::zeros((3, 4, 4)).into(),
            Array3::<f32>::zeros((1, 4, 4)).into(),
        ];
        let err = normalizer.normalize(items).unwrap_err();
        assert!(matches!(
            err,
            Error::ChannelMismatch {
                expected: 3,
                actual: 1,
                index: 1
            }
        ));
    }

    #[test]
    fn test_config_validation() {
        let err = Normalizer::new(Config {
            expected_channels: Some(0),
            ..Config::default()
        })
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));
    }

    #[test]
    fn test_stack_and_batch_len() {
        let entries = vec![
            Array4::<f32>::zeros((1, 3, 4, 4)),
            Array4::<f32>::ones((2, 3, 4, 4)),
        ];
        assert_eq!(batch_len(&entries), 3);

        let stacked = stack(&entries).unwrap();
        assert_eq!(stacked.shape(), &[3, 3, 4, 4]);
        assert!(stacked.slice(s![0, .., .., ..]).iter().all(|&v| v == 0.0));
        assert!(stacked.slice(s![1.., .., .., ..]).iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_stack_rejects_mismatch() {
        let entries = vec![
            Array4::<f32>::zeros((1, 3, 4, 4)),
            Array4::<f32>::zeros((1, 3, 8, 8)),
        ];
        assert!(matches!(
            stack(&entries).unwrap_err(),
            Error::ShapeMismatch { .. }
        ));
        assert!(matches!(
            stack::<f32>(&[]).unwrap_err(),
            Error::EmptyInput
        ));
    }
}
