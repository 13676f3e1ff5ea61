//! Tagged input types accepted by the normalizer.

use ndarray::{Array3, Array4, ArrayD};

use crate::error::{Error, Result};

/// An image input resolved at the call boundary.
///
/// A single tensor may be CHW (rank 3) or NCHW (rank 4); the rank is only
/// checked during normalization. A sequence holds items that are expected to
/// be tensors of either rank.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageInput<A> {
    /// A single tensor of any rank.
    Tensor(ArrayD<A>),
    /// An ordered collection of items.
    Sequence(Vec<InputItem<A>>),
}

/// One element of an [`ImageInput::Sequence`].
///
/// Callers that decode inputs from loosely typed sources (manifests, scripting
/// bridges) can represent non-tensor values here; the normalizer rejects them
/// with [`Error::InvalidElementType`].
#[derive(Debug, Clone, PartialEq)]
pub enum InputItem<A> {
    /// A tensor of any rank.
    Tensor(ArrayD<A>),
    /// A plain number.
    Scalar(f64),
    /// A string value.
    Text(String),
    /// A nested collection.
    Sequence(Vec<InputItem<A>>),
    /// An absent value.
    None,
}

impl<A> InputItem<A> {
    /// Name of the item's kind, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Tensor(_) => "tensor",
            Self::Scalar(_) => "scalar",
            Self::Text(_) => "text",
            Self::Sequence(_) => "sequence",
            Self::None => "none",
        }
    }
}

impl<A> ImageInput<A> {
    /// Name of the input's kind.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Tensor(_) => "tensor",
            Self::Sequence(_) => "sequence",
        }
    }
}

impl<A> From<ArrayD<A>> for ImageInput<A> {
    fn from(tensor: ArrayD<A>) -> Self {
        Self::Tensor(tensor)
    }
}

impl<A> From<Array3<A>> for ImageInput<A> {
    fn from(tensor: Array3<A>) -> Self {
        Self::Tensor(tensor.into_dyn())
    }
}

impl<A> From<Array4<A>> for ImageInput<A> {
    fn from(tensor: Array4<A>) -> Self {
        Self::Tensor(tensor.into_dyn())
    }
}

impl<A> From<Vec<ArrayD<A>>> for ImageInput<A> {
    fn from(tensors: Vec<ArrayD<A>>) -> Self {
        Self::Sequence(tensors.into_iter().map(InputItem::Tensor).collect())
    }
}

impl<A> From<Vec<Array3<A>>> for ImageInput<A> {
    fn from(tensors: Vec<Array3<A>>) -> Self {
        Self::Sequence(
            tensors
                .into_iter()
                .map(|t| InputItem::Tensor(t.into_dyn()))
                .collect(),
        )
    }
}

impl<A> From<Vec<InputItem<A>>> for ImageInput<A> {
    fn from(items: Vec<InputItem<A>>) -> Self {
        Self::Sequence(items)
    }
}

impl<A> From<ArrayD<A>> for InputItem<A> {
    fn from(tensor: ArrayD<A>) -> Self {
        Self::Tensor(tensor)
    }
}

impl<A> From<Array3<A>> for InputItem<A> {
    fn from(tensor: Array3<A>) -> Self {
        Self::Tensor(tensor.into_dyn())
    }
}

impl<A> From<Array4<A>> for InputItem<A> {
    fn from(tensor: Array4<A>) -> Self {
        Self::Tensor(tensor.into_dyn())
    }
}

impl<A> From<f64> for InputItem<A> {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl<A> From<String> for InputItem<A> {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl<A> TryFrom<InputItem<A>> for ImageInput<A> {
    type Error = Error;

    /// Lift a loosely typed value to a top-level input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInputType`] for scalars, text and absent values.
    fn try_from(item: InputItem<A>) -> Result<Self> {
        match item {
            InputItem::Tensor(tensor) => Ok(Self::Tensor(tensor)),
            InputItem::Sequence(items) => Ok(Self::Sequence(items)),
            other => Err(Error::InvalidInputType {
                type_name: other.type_name(),
            }),
        }
    }
}
