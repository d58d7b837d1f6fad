//! Selections.
//!
//! A [`Selection`] describes which elements of an array of a given shape are addressed by one read or write, in both storage and memory terms.
//! Selections are built from an [`IndexExpression`] with [`select`], or with [`resolve_scalar`] for rank 0 datasets.
//!
//! Every selection reports:
//!  - [`shape`](Selection::shape): the storage shape it was built against,
//!  - [`mshape`](Selection::mshape): the shape of the memory buffer of a transfer,
//!  - [`array_shape`](Selection::array_shape): the shape presented to a caller as a plain array, and
//!  - [`npoints`](Selection::npoints): the number of storage elements addressed.
//!
//! The variant of a selection depends on the index expression:
//!
//! | Index expression                                      | Variant                       |
//! |-------------------------------------------------------|-------------------------------|
//! | integers, slices, ellipsis                            | [`SimpleSelection`]           |
//! | any integer array or per-axis boolean mask            | [`FancySelection`]            |
//! | an existing selection                                 | [`FancySelection`] (derived)  |
//! | a whole-array boolean mask or a point list            | [`PointSelection`]            |
//! | a rank 0 array                                        | [`ScalarSelection`]           |
//! | a [`RegionReference`]                                 | the referenced selection      |
//!
//! A selection can be [broadcast](Selection::broadcast) against a smaller memory buffer, which is then repeated over the [tiles](Selection::tiles) of the selection.

mod fancy;
mod index;
mod point;
mod region_reference;
mod resolver;
mod scalar;
mod simple;
mod storage;

pub use fancy::FancySelection;
pub use index::{BooleanMask, Index, IndexExpression, Slice};
pub use point::PointSelection;
pub use region_reference::RegionReference;
pub use resolver::select;
pub use scalar::{resolve_scalar, ScalarSelection};
pub use simple::SimpleSelection;
pub use storage::{AxisSelection, Hyperslab, StorageIndicesIterator, StorageSelection};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    shape::{num_elements, unravel_index, ArrayIndices, ArrayShape},
    ErrorKind,
};

/// The variant specific part of a [`Selection`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionVariant {
    /// A regular hyperslab of integers and slices.
    Simple(SimpleSelection),
    /// An orthogonal selection with coordinate lists, or a derived selection.
    Fancy(FancySelection),
    /// An explicit point list.
    Point(PointSelection),
    /// The single element of a rank 0 array.
    Scalar(ScalarSelection),
}

/// A selection of the elements of an array.
///
/// See the [module documentation](self).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SelectionParts")]
pub struct Selection {
    shape: ArrayShape,
    mshape: ArrayShape,
    array_shape: ArrayShape,
    broadcast: Option<ArrayShape>,
    variant: SelectionVariant,
}

/// The fields of a deserialized [`Selection`], before validation.
#[derive(Deserialize)]
struct SelectionParts {
    shape: ArrayShape,
    mshape: ArrayShape,
    array_shape: ArrayShape,
    broadcast: Option<ArrayShape>,
    variant: SelectionVariant,
}

impl TryFrom<SelectionParts> for Selection {
    type Error = SelectionError;

    fn try_from(parts: SelectionParts) -> Result<Self, Self::Error> {
        let selection = Self {
            shape: parts.shape,
            mshape: parts.mshape,
            array_shape: parts.array_shape,
            broadcast: parts.broadcast,
            variant: parts.variant,
        };
        selection.validate()?;
        Ok(selection)
    }
}

/// A selection error.
#[derive(Clone, Debug, Error)]
pub enum SelectionError {
    /// An index expression other than `()` or `(...)` was applied to a rank 0 array.
    #[error("illegal index {_0} for scalar data")]
    IllegalScalarIndex(String),
    /// Scalar selection rules were applied to an array that is not rank 0.
    #[error("scalar selection rules applied to an array of shape {_0:?}")]
    NotScalar(ArrayShape),
    /// A region reference was applied without a dataset.
    #[error("cannot apply a region reference without a dataset")]
    MissingDataset,
    /// A region reference was applied to an array of a different shape.
    #[error("region reference shape {_0:?} does not match shape {_1:?}")]
    RegionReferenceShapeMismatch(ArrayShape, ArrayShape),
    /// A selection was applied to an array of a different shape.
    #[error("selection shape {_0:?} does not match shape {_1:?}")]
    SelectionShapeMismatch(ArrayShape, ArrayShape),
    /// A shape cannot be broadcast to the selection.
    #[error("can't broadcast {_0:?} -> {_1:?}")]
    IncompatibleBroadcast(ArrayShape, ArrayShape),
    /// A boolean mask does not match the shape it is applied to.
    #[error("boolean mask of shape {_0:?} does not match shape {_1:?}")]
    MaskShapeMismatch(ArrayShape, ArrayShape),
    /// An index is out of bounds.
    #[error("index {index} is out of bounds for axis {axis} with size {size}")]
    IndexOutOfBounds {
        /// The index.
        index: i64,
        /// The axis.
        axis: usize,
        /// The axis size.
        size: u64,
    },
    /// A point has the wrong number of coordinates.
    #[error("point {_0:?} has {} coordinates, expected {_1}", _0.len())]
    InvalidPoint(Vec<u64>, usize),
    /// A slice step is less than 1.
    #[error("slice step {_0} must be at least 1")]
    InvalidStep(i64),
    /// An index tuple has more components than the array has axes.
    #[error("too many indices: got {_0} for an array with {_1} dimensions")]
    TooManyIndices(usize, usize),
    /// An index tuple has more than one ellipsis.
    #[error("an index can only have a single ellipsis")]
    MultipleEllipsis,
    /// An integer index array is not strictly increasing.
    #[error("index array {_0:?} is not strictly increasing")]
    IndicesNotIncreasing(Vec<i64>),
    /// An index tuple has more array-valued components than permitted.
    #[error("{_0} index arrays exceeds the limit of {_1}")]
    TooManyIndexArrays(usize, usize),
    /// A selection addresses elements outside of its shape.
    #[error("selection addresses elements outside of shape {_0:?}")]
    SelectionOutOfBounds(ArrayShape),
    /// The memory shape of a selection does not agree with its variant.
    #[error("memory shape {_0:?} is inconsistent with the {_1} selection")]
    InconsistentSelection(ArrayShape, &'static str),
}

impl SelectionError {
    /// Return the [`ErrorKind`] of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::IllegalScalarIndex(_)
            | Self::IndexOutOfBounds { .. }
            | Self::InvalidPoint(..)
            | Self::InvalidStep(_)
            | Self::TooManyIndices(..)
            | Self::MultipleEllipsis
            | Self::SelectionOutOfBounds(_)
            | Self::InconsistentSelection(..) => ErrorKind::Value,
            Self::MissingDataset
            | Self::RegionReferenceShapeMismatch(..)
            | Self::SelectionShapeMismatch(..)
            | Self::IncompatibleBroadcast(..)
            | Self::MaskShapeMismatch(..)
            | Self::IndicesNotIncreasing(_)
            | Self::TooManyIndexArrays(..) => ErrorKind::Type,
            Self::NotScalar(_) => ErrorKind::Runtime,
        }
    }
}

impl Selection {
    /// Create a selection of every element of an array with `shape`.
    ///
    /// Rank 0 shapes produce a [`ScalarSelection`], otherwise a [`SimpleSelection`].
    #[must_use]
    pub fn new_all(shape: &[u64]) -> Self {
        if shape.is_empty() {
            Self::new_scalar()
        } else {
            Self::new_simple(shape.to_vec(), SimpleSelection::new_all(shape))
        }
    }

    /// Create a selection of the single element of a rank 0 array.
    #[must_use]
    pub fn new_scalar() -> Self {
        Self {
            shape: vec![],
            mshape: vec![],
            array_shape: vec![],
            broadcast: None,
            variant: SelectionVariant::Scalar(ScalarSelection),
        }
    }

    /// Create a simple selection.
    pub(crate) fn new_simple(shape: ArrayShape, simple: SimpleSelection) -> Self {
        let mshape = simple.count();
        let array_shape = std::iter::zip(&mshape, simple.scalar())
            .filter(|(_, scalar)| !scalar)
            .map(|(&count, _)| count)
            .collect();
        Self {
            shape,
            mshape,
            array_shape,
            broadcast: None,
            variant: SelectionVariant::Simple(simple),
        }
    }

    /// Create a fancy selection.
    pub(crate) fn new_fancy(shape: ArrayShape, fancy: FancySelection) -> Self {
        let mshape = fancy.mshape();
        Self {
            shape,
            array_shape: mshape.clone(),
            mshape,
            broadcast: None,
            variant: SelectionVariant::Fancy(fancy),
        }
    }

    /// Create a selection of `points` in an array with `shape`.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::InvalidPoint`] if a point does not have one coordinate per axis, or [`SelectionError::IndexOutOfBounds`] if a coordinate is out of bounds.
    pub fn new_points(
        shape: ArrayShape,
        points: Vec<ArrayIndices>,
    ) -> Result<Self, SelectionError> {
        for point in &points {
            if point.len() != shape.len() {
                return Err(SelectionError::InvalidPoint(point.clone(), shape.len()));
            }
            if let Some((axis, (&index, &size))) = std::iter::zip(point, &shape)
                .enumerate()
                .find(|(_, (&index, &size))| index >= size)
            {
                return Err(SelectionError::IndexOutOfBounds {
                    index: i64::try_from(index).unwrap_or(i64::MAX),
                    axis,
                    size,
                });
            }
        }
        let mshape = vec![points.len() as u64];
        Ok(Self {
            shape,
            array_shape: mshape.clone(),
            mshape,
            broadcast: None,
            variant: SelectionVariant::Point(PointSelection::new(points)),
        })
    }

    /// Derive a fancy selection from `selection`.
    ///
    /// The derived selection addresses the same storage elements, has the memory shape of a fancy selection and is not broadcast.
    #[must_use]
    pub fn derive_fancy(selection: &Self) -> Self {
        Self::new_fancy(
            selection.shape.clone(),
            FancySelection::new(selection.storage()),
        )
    }

    /// Return the storage shape the selection was built against.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the memory shape.
    ///
    /// This is the shape set by [`broadcast`](Self::broadcast) if the selection is broadcast.
    #[must_use]
    pub fn mshape(&self) -> &[u64] {
        self.broadcast.as_deref().unwrap_or(&self.mshape)
    }

    /// Return the array shape.
    #[must_use]
    pub fn array_shape(&self) -> &[u64] {
        &self.array_shape
    }

    /// Return the variant specific part of the selection.
    #[must_use]
    pub fn variant(&self) -> &SelectionVariant {
        &self.variant
    }

    /// Returns true if the selection is broadcast.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.broadcast.is_some()
    }

    /// Return the number of storage elements addressed.
    #[must_use]
    pub fn npoints(&self) -> u64 {
        match &self.variant {
            SelectionVariant::Simple(_) | SelectionVariant::Fancy(_) => num_elements(&self.mshape),
            SelectionVariant::Point(point) => point.len() as u64,
            SelectionVariant::Scalar(_) => 1,
        }
    }

    /// Return the addressed storage elements.
    #[must_use]
    pub fn storage(&self) -> StorageSelection {
        match &self.variant {
            SelectionVariant::Simple(simple) => StorageSelection::Axes(simple.axes().to_vec()),
            SelectionVariant::Fancy(fancy) => fancy.storage().clone(),
            SelectionVariant::Point(point) => StorageSelection::Points(point.points().to_vec()),
            SelectionVariant::Scalar(_) => StorageSelection::Axes(vec![]),
        }
    }

    /// Check that the selection is in bounds of its shape and that its memory shapes agree with its variant.
    ///
    /// Selections built by [`select`] always pass.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::SelectionOutOfBounds`] if any addressed element is outside of [`shape`](Self::shape), or [`SelectionError::InconsistentSelection`] if the memory shape, array shape or broadcast shape do not match the variant.
    pub fn validate(&self) -> Result<(), SelectionError> {
        let storage = self.storage();
        let repeated = match &storage {
            StorageSelection::Axes(axes) => axes.iter().any(|axis| {
                matches!(axis, AxisSelection::Range { step: 0, count, .. } if *count > 1)
            }),
            StorageSelection::Points(_) => false,
        };
        if repeated || !storage.inbounds(&self.shape) {
            return Err(SelectionError::SelectionOutOfBounds(self.shape.clone()));
        }

        let inconsistent = || {
            SelectionError::InconsistentSelection(self.mshape().to_vec(), self.variant_name())
        };
        let expected = match &self.variant {
            SelectionVariant::Simple(simple) => {
                let simple = SimpleSelection::from_axes(simple.axes().to_vec())
                    .map_err(|_| inconsistent())?;
                Self::new_simple(self.shape.clone(), simple)
            }
            SelectionVariant::Fancy(fancy) => Self::new_fancy(self.shape.clone(), fancy.clone()),
            SelectionVariant::Point(point) => {
                Self::new_points(self.shape.clone(), point.points().to_vec())?
            }
            SelectionVariant::Scalar(_) => Self::new_scalar(),
        };
        let broadcast_valid = self
            .broadcast
            .as_ref()
            .map_or(true, |eshape| expected.is_expanded_shape(eshape));
        if expected.mshape != self.mshape
            || expected.array_shape != self.array_shape
            || !broadcast_valid
        {
            return Err(inconsistent());
        }
        Ok(())
    }

    /// Returns true if `eshape` is a shape returned by [`expand_shape`](Self::expand_shape).
    fn is_expanded_shape(&self, eshape: &[u64]) -> bool {
        let scalar = match &self.variant {
            SelectionVariant::Point(_) => return num_elements(eshape) == self.npoints(),
            SelectionVariant::Simple(simple) => simple.scalar(),
            SelectionVariant::Fancy(_) | SelectionVariant::Scalar(_) => {
                vec![false; self.mshape.len()]
            }
        };
        eshape.len() == self.mshape.len()
            && itertools::izip!(&self.mshape, eshape, scalar)
                .all(|(&count, &dim, scalar)| dim == 1 || (!scalar && dim == count))
    }

    /// Match a source shape to the selection for broadcasting.
    ///
    /// Returns the shape `source_shape` takes when aligned to the memory axes of the selection.
    /// Axes are aligned from the right:
    ///  - integer indexed axes of a simple selection, and axes beyond the rank of `source_shape`, take 1,
    ///  - every other axis consumes the trailing dimension of `source_shape`, which must be 1 or equal the axis length, and
    ///  - any leading dimensions of `source_shape` left over must be 1.
    ///
    /// For example, with a dataset of shape `[10, 5, 4, 2]` selected by `(..., 0)`, the source shape `[5, 4]` expands to `[1, 5, 4, 1]`.
    ///
    /// Point selections accept any source shape with exactly [`npoints`](Self::npoints) elements, returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IncompatibleBroadcast`] if `source_shape` cannot be broadcast to the selection.
    pub fn expand_shape(&self, source_shape: &[u64]) -> Result<ArrayShape, SelectionError> {
        let incompatible =
            || SelectionError::IncompatibleBroadcast(source_shape.to_vec(), self.array_shape.clone());
        let scalar = match &self.variant {
            SelectionVariant::Point(_) => {
                return if num_elements(source_shape) == self.npoints() {
                    Ok(source_shape.to_vec())
                } else {
                    Err(incompatible())
                };
            }
            SelectionVariant::Simple(simple) => simple.scalar(),
            SelectionVariant::Fancy(_) | SelectionVariant::Scalar(_) => {
                vec![false; self.mshape.len()]
            }
        };

        let mut remaining = source_shape.to_vec();
        let mut eshape = Vec::with_capacity(self.mshape.len());
        for (&count, scalar) in std::iter::zip(&self.mshape, scalar).rev() {
            if scalar {
                eshape.push(1);
                continue;
            }
            match remaining.pop() {
                None => eshape.push(1),
                Some(dim) if dim == 1 || dim == count => eshape.push(dim),
                Some(_) => return Err(incompatible()),
            }
        }
        if remaining.iter().any(|&dim| dim != 1) {
            return Err(incompatible());
        }
        eshape.reverse();
        Ok(eshape)
    }

    /// Broadcast the selection to service a memory buffer of `source_shape`.
    ///
    /// Returns a new selection with memory shape [`expand_shape(source_shape)`](Self::expand_shape).
    /// The memory buffer is repeated over each of its [`tiles`](Self::tiles).
    /// Broadcasting always derives from the selection as built, so broadcasting a broadcast selection replaces rather than compounds the broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError::IncompatibleBroadcast`] if `source_shape` cannot be broadcast to the selection.
    pub fn broadcast(&self, source_shape: &[u64]) -> Result<Self, SelectionError> {
        let eshape = self.expand_shape(source_shape)?;
        let mut selection = self.clone();
        selection.broadcast = Some(eshape);
        tracing::debug!(
            source_shape = ?source_shape,
            mshape = ?selection.mshape(),
            "broadcast selection"
        );
        Ok(selection)
    }

    const fn variant_name(&self) -> &'static str {
        match self.variant {
            SelectionVariant::Simple(_) => "simple",
            SelectionVariant::Fancy(_) => "fancy",
            SelectionVariant::Point(_) => "point",
            SelectionVariant::Scalar(_) => "scalar",
        }
    }

    /// Return the storage tiles of the selection.
    ///
    /// Each tile addresses `product(mshape)` storage elements and receives (or supplies) the whole memory buffer.
    /// A selection that is not broadcast has a single tile: [`storage`](Self::storage).
    /// Tiles are ordered with the last memory axis varying fastest.
    #[must_use]
    pub fn tiles(&self) -> Vec<StorageSelection> {
        let storage = self.storage();
        let Some(eshape) = &self.broadcast else {
            return vec![storage];
        };
        let memory_axes = match &self.variant {
            SelectionVariant::Point(_) | SelectionVariant::Scalar(_) => return vec![storage],
            SelectionVariant::Simple(_) => (0..self.mshape.len()).collect_vec(),
            SelectionVariant::Fancy(fancy) => fancy.memory_axes(),
        };

        // Axes stretched by the broadcast are iterated element by element
        let chunks = std::iter::zip(&self.mshape, eshape)
            .map(|(&count, &dim)| if count == dim { 1 } else { count })
            .collect_vec();
        (0..num_elements(&chunks))
            .map(|tile| {
                let restrictions = std::iter::zip(&memory_axes, unravel_index(tile, &chunks))
                    .zip(&chunks)
                    .filter(|(_, &chunk)| chunk > 1)
                    .map(|((&axis, i), _)| (axis, i))
                    .collect_vec();
                storage.restrict(&restrictions)
            })
            .collect()
    }
}

impl core::fmt::Display for Selection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{} selection of {} points in shape {:?}",
            self.variant_name(),
            self.npoints(),
            self.shape
        )
    }
}
