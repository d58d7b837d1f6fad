use derive_more::{Display, From};
use itertools::Itertools;

use crate::shape::{num_elements, ArrayIndices, ArrayShape};

use super::{RegionReference, Selection, SelectionError};

/// A slice of an axis with optional start, stop and step.
///
/// Bounds follow the usual conventions: negative values count back from the end of the axis, bounds are clamped to the axis and an absent bound spans to the corresponding end.
/// The step must be at least 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Slice {
    start: Option<i64>,
    stop: Option<i64>,
    step: Option<i64>,
}

impl Slice {
    /// Create a new slice.
    #[must_use]
    pub const fn new(start: Option<i64>, stop: Option<i64>, step: Option<i64>) -> Self {
        Self { start, stop, step }
    }

    /// Create a slice spanning a full axis.
    #[must_use]
    pub const fn full() -> Self {
        Self::new(None, None, None)
    }

    /// Return the slice with its step set to `step`.
    #[must_use]
    pub const fn with_step(self, step: i64) -> Self {
        Self {
            step: Some(step),
            ..self
        }
    }

    /// Resolve the slice against an axis of length `len`.
    ///
    /// Returns the `(start, count, step)` of the elements addressed on the axis.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidStep`] if the step is less than 1.
    pub fn resolve(&self, len: u64) -> Result<(u64, u64, u64), SelectionError> {
        let step = self.step.unwrap_or(1);
        let step = u64::try_from(step)
            .ok()
            .filter(|&step| step >= 1)
            .ok_or(SelectionError::InvalidStep(step))?;
        let clamp = |bound: i64| -> u64 {
            let len_i = i128::from(len);
            let bound = i128::from(bound);
            let bound = if bound < 0 { bound + len_i } else { bound };
            u64::try_from(bound.clamp(0, len_i)).unwrap_or(len)
        };
        let start = self.start.map_or(0, clamp);
        let stop = self.stop.map_or(len, clamp);
        let count = if stop > start {
            (stop - start).div_ceil(step)
        } else {
            0
        };
        Ok((start, count, step))
    }
}

impl core::fmt::Display for Slice {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let bound = |bound: Option<i64>| bound.map(|b| b.to_string()).unwrap_or_default();
        write!(f, "{}:{}", bound(self.start), bound(self.stop))?;
        if let Some(step) = self.step {
            write!(f, ":{step}")?;
        }
        Ok(())
    }
}

impl From<core::ops::Range<i64>> for Slice {
    fn from(range: core::ops::Range<i64>) -> Self {
        Self::new(Some(range.start), Some(range.end), None)
    }
}

impl From<core::ops::RangeFrom<i64>> for Slice {
    fn from(range: core::ops::RangeFrom<i64>) -> Self {
        Self::new(Some(range.start), None, None)
    }
}

impl From<core::ops::RangeTo<i64>> for Slice {
    fn from(range: core::ops::RangeTo<i64>) -> Self {
        Self::new(None, Some(range.end), None)
    }
}

impl From<core::ops::RangeFull> for Slice {
    fn from(_: core::ops::RangeFull) -> Self {
        Self::full()
    }
}

/// A component of an index tuple, addressing one axis (or, for [`Index::Ellipsis`], any number of axes).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Display, From)]
pub enum Index {
    /// A single element, collapsing the axis.
    #[display("{_0}")]
    #[from]
    Integer(i64),
    /// A regular slice.
    #[display("{_0}")]
    #[from]
    Slice(Slice),
    /// Full slices for all axes not otherwise indexed.
    #[display("...")]
    Ellipsis,
    /// A list of element indices on the axis.
    #[display("{_0:?}")]
    #[from]
    Array(Vec<i64>),
    /// A boolean mask over the axis, selecting the elements where it is `true`.
    #[display("{_0:?}")]
    #[from]
    Mask(Vec<bool>),
}

impl Index {
    /// Returns true if the index is array-valued (an integer array or a boolean mask).
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Mask(_))
    }
}

impl From<core::ops::Range<i64>> for Index {
    fn from(range: core::ops::Range<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<core::ops::RangeFrom<i64>> for Index {
    fn from(range: core::ops::RangeFrom<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<core::ops::RangeTo<i64>> for Index {
    fn from(range: core::ops::RangeTo<i64>) -> Self {
        Self::Slice(range.into())
    }
}

impl From<core::ops::RangeFull> for Index {
    fn from(range: core::ops::RangeFull) -> Self {
        Self::Slice(range.into())
    }
}

impl From<&[i64]> for Index {
    fn from(indices: &[i64]) -> Self {
        Self::Array(indices.to_vec())
    }
}

#[cfg(feature = "ndarray")]
impl From<ndarray::Array1<i64>> for Index {
    fn from(indices: ndarray::Array1<i64>) -> Self {
        Self::Array(indices.into_iter().collect())
    }
}

#[cfg(feature = "ndarray")]
impl From<ndarray::Array1<bool>> for Index {
    fn from(mask: ndarray::Array1<bool>) -> Self {
        Self::Mask(mask.into_iter().collect())
    }
}

/// A boolean mask with the shape of the whole array, selecting the elements where it is `true`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BooleanMask {
    shape: ArrayShape,
    values: Vec<bool>,
}

impl BooleanMask {
    /// Create a new boolean mask from `values` in C order.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::MaskShapeMismatch`] if the number of values does not match `shape`.
    pub fn new(shape: ArrayShape, values: Vec<bool>) -> Result<Self, SelectionError> {
        if values.len() as u64 == num_elements(&shape) {
            Ok(Self { shape, values })
        } else {
            Err(SelectionError::MaskShapeMismatch(
                vec![values.len() as u64],
                shape,
            ))
        }
    }

    /// Return the shape of the mask.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the mask values in C order.
    #[must_use]
    pub fn values(&self) -> &[bool] {
        &self.values
    }

    /// Return the number of `true` values.
    #[must_use]
    pub fn count(&self) -> usize {
        self.values.iter().filter(|&&value| value).count()
    }
}

#[cfg(feature = "ndarray")]
impl<D: ndarray::Dimension> From<ndarray::Array<bool, D>> for BooleanMask {
    fn from(mask: ndarray::Array<bool, D>) -> Self {
        Self {
            shape: mask.shape().iter().map(|&dim| dim as u64).collect(),
            values: mask.iter().copied().collect(),
        }
    }
}

/// An index expression, as supplied to [`select`](super::select).
#[derive(Clone, Debug, From)]
pub enum IndexExpression {
    /// A tuple of index components.
    #[from]
    Tuple(Vec<Index>),
    /// A region reference.
    #[from]
    RegionReference(RegionReference),
    /// An existing selection.
    Selection(Box<Selection>),
    /// A boolean mask over the whole array.
    #[from]
    Mask(BooleanMask),
    /// An explicit list of element coordinates.
    #[from]
    Points(Vec<ArrayIndices>),
}

impl IndexExpression {
    /// Create an empty index tuple.
    #[must_use]
    pub fn empty() -> Self {
        Self::Tuple(Vec::new())
    }
}

impl From<Index> for IndexExpression {
    fn from(index: Index) -> Self {
        Self::Tuple(vec![index])
    }
}

impl From<i64> for IndexExpression {
    fn from(index: i64) -> Self {
        Index::Integer(index).into()
    }
}

impl From<Slice> for IndexExpression {
    fn from(slice: Slice) -> Self {
        Index::Slice(slice).into()
    }
}

impl From<Vec<i64>> for IndexExpression {
    fn from(indices: Vec<i64>) -> Self {
        Index::Array(indices).into()
    }
}

impl From<Selection> for IndexExpression {
    fn from(selection: Selection) -> Self {
        Self::Selection(Box::new(selection))
    }
}

impl From<&Selection> for IndexExpression {
    fn from(selection: &Selection) -> Self {
        Self::Selection(Box::new(selection.clone()))
    }
}

impl From<&RegionReference> for IndexExpression {
    fn from(region_reference: &RegionReference) -> Self {
        Self::RegionReference(region_reference.clone())
    }
}

impl core::fmt::Display for IndexExpression {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Tuple(indices) => write!(f, "({})", indices.iter().join(", ")),
            Self::RegionReference(region_reference) => write!(f, "{region_reference}"),
            Self::Selection(selection) => write!(f, "{selection}"),
            Self::Mask(mask) => write!(f, "boolean mask of shape {:?}", mask.shape()),
            Self::Points(points) => write!(f, "points {points:?}"),
        }
    }
}
