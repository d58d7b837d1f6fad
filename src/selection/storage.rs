use std::iter::FusedIterator;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::shape::{num_elements, unravel_index, ArrayIndices, ArrayShape};

/// The elements addressed on a single storage axis.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisSelection {
    /// A single element. The axis is collapsed in the array shape of a selection.
    Index(u64),
    /// `count` elements starting at `start` with stride `step`.
    Range {
        /// The first element.
        start: u64,
        /// The stride between elements.
        step: u64,
        /// The number of elements.
        count: u64,
    },
    /// An explicit list of elements.
    Coordinates(Vec<u64>),
}

impl AxisSelection {
    /// Create an axis selection spanning a full axis of length `len`.
    #[must_use]
    pub const fn full(len: u64) -> Self {
        Self::Range {
            start: 0,
            step: 1,
            count: len,
        }
    }

    /// Return the number of elements addressed on the axis.
    #[must_use]
    pub fn len(&self) -> u64 {
        match self {
            Self::Index(_) => 1,
            Self::Range { count, .. } => *count,
            Self::Coordinates(coordinates) => coordinates.len() as u64,
        }
    }

    /// Returns true if no elements are addressed on the axis.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if the axis is indexed by a single integer.
    #[must_use]
    pub const fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }

    /// Return the storage coordinate of the `i`th addressed element, if `i` is in bounds.
    #[must_use]
    pub fn get(&self, i: u64) -> Option<u64> {
        if i >= self.len() {
            return None;
        }
        match self {
            Self::Index(index) => Some(*index),
            Self::Range { start, step, .. } => Some(start + i * step),
            Self::Coordinates(coordinates) => usize::try_from(i)
                .ok()
                .and_then(|i| coordinates.get(i).copied()),
        }
    }

    /// Return the exclusive upper bound of the addressed coordinates, or 0 if none are addressed.
    #[must_use]
    pub fn end_exc(&self) -> u64 {
        match self {
            Self::Index(index) => index.saturating_add(1),
            Self::Range { start, step, count } => {
                if *count == 0 {
                    0
                } else {
                    (count - 1)
                        .saturating_mul(*step)
                        .saturating_add(*start)
                        .saturating_add(1)
                }
            }
            Self::Coordinates(coordinates) => coordinates
                .iter()
                .max()
                .map_or(0, |max| max.saturating_add(1)),
        }
    }

    /// Restrict the axis to its `i`th addressed element.
    ///
    /// # Panics
    /// Panics if `i` is out of bounds.
    #[must_use]
    pub fn restrict(&self, i: u64) -> Self {
        let start = self.get(i).expect("restricted axis element must be in bounds");
        Self::Range {
            start,
            step: 1,
            count: 1,
        }
    }

    /// Return the regular `(start, stride, count)` description of the axis, if it has one.
    ///
    /// Coordinate lists are regular if they are evenly spaced and increasing.
    #[must_use]
    pub fn regular(&self) -> Option<(u64, u64, u64)> {
        match self {
            Self::Index(index) => Some((*index, 1, 1)),
            Self::Range { start, step, count } => Some((*start, *step, *count)),
            Self::Coordinates(coordinates) => match coordinates.as_slice() {
                [] => Some((0, 1, 0)),
                [coordinate] => Some((*coordinate, 1, 1)),
                [first, second, ..] => {
                    let step = second.checked_sub(*first).filter(|&step| step > 0)?;
                    coordinates
                        .iter()
                        .tuple_windows()
                        .all(|(a, b)| b.checked_sub(*a) == Some(step))
                        .then_some((*first, step, coordinates.len() as u64))
                }
            },
        }
    }
}

/// A regular hyperslab: per axis, `count` blocks of `block` elements spaced `stride` apart from `start`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hyperslab {
    /// The start of each axis.
    pub start: ArrayIndices,
    /// The stride of each axis.
    pub stride: ArrayShape,
    /// The block count of each axis.
    pub count: ArrayShape,
    /// The block size of each axis.
    pub block: ArrayShape,
}

/// The storage elements addressed by a selection, as consumed by a storage engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageSelection {
    /// The outer product of per-axis selections. A rank 0 selection has no axes and addresses one element.
    Axes(Vec<AxisSelection>),
    /// An explicit list of element coordinates.
    Points(Vec<ArrayIndices>),
}

impl StorageSelection {
    /// Return the number of storage elements addressed.
    #[must_use]
    pub fn npoints(&self) -> u64 {
        match self {
            Self::Axes(axes) => axes.iter().map(AxisSelection::len).product(),
            Self::Points(points) => points.len() as u64,
        }
    }

    /// Return the regular hyperslab equivalent to the selection, if there is one.
    ///
    /// Point lists and irregular coordinate lists have no hyperslab equivalent.
    #[must_use]
    pub fn hyperslab(&self) -> Option<Hyperslab> {
        let Self::Axes(axes) = self else {
            return None;
        };
        let rank = axes.len();
        let mut hyperslab = Hyperslab {
            start: Vec::with_capacity(rank),
            stride: Vec::with_capacity(rank),
            count: Vec::with_capacity(rank),
            block: vec![1; rank],
        };
        for axis in axes {
            let (start, stride, count) = axis.regular()?;
            hyperslab.start.push(start);
            hyperslab.stride.push(stride);
            hyperslab.count.push(count);
        }
        Some(hyperslab)
    }

    /// Returns true if every addressed coordinate is within `shape`.
    #[must_use]
    pub fn inbounds(&self, shape: &[u64]) -> bool {
        match self {
            Self::Axes(axes) => {
                axes.len() == shape.len()
                    && std::iter::zip(axes, shape)
                        .all(|(axis, &dim)| axis.is_empty() || axis.end_exc() <= dim)
            }
            Self::Points(points) => points.iter().all(|point| {
                point.len() == shape.len()
                    && std::iter::zip(point, shape).all(|(&index, &dim)| index < dim)
            }),
        }
    }

    /// Returns an iterator over the coordinates of the addressed elements.
    ///
    /// Axis selections iterate over the last axis fastest (i.e. C-contiguous order), point lists iterate in list order.
    #[must_use]
    pub fn iter_indices(&self) -> StorageIndicesIterator<'_> {
        StorageIndicesIterator::new(self)
    }

    /// Restrict axes to single elements.
    ///
    /// Each `(axis, i)` restricts `axis` to its `i`th addressed element.
    /// For point lists, the axis must be 0 and `i` indexes the point list.
    ///
    /// # Panics
    /// Panics if an axis or element is out of bounds.
    #[must_use]
    pub(crate) fn restrict(&self, restrictions: &[(usize, u64)]) -> Self {
        match self {
            Self::Axes(axes) => {
                let mut axes = axes.clone();
                for &(axis, i) in restrictions {
                    axes[axis] = axes[axis].restrict(i);
                }
                Self::Axes(axes)
            }
            Self::Points(points) => match restrictions {
                [] => self.clone(),
                [(0, i)] => Self::Points(vec![points[usize::try_from(*i).unwrap()].clone()]),
                _ => panic!("point lists can only be restricted on their single axis"),
            },
        }
    }
}

/// An iterator over the coordinates addressed by a [`StorageSelection`].
///
/// See [`StorageSelection::iter_indices`].
pub struct StorageIndicesIterator<'a> {
    selection: &'a StorageSelection,
    counts: ArrayShape,
    index_front: u64,
    index_back: u64,
}

impl<'a> StorageIndicesIterator<'a> {
    /// Create a new storage indices iterator.
    #[must_use]
    pub fn new(selection: &'a StorageSelection) -> Self {
        let counts = match selection {
            StorageSelection::Axes(axes) => axes.iter().map(AxisSelection::len).collect(),
            StorageSelection::Points(points) => vec![points.len() as u64],
        };
        let index_back = num_elements(&counts);
        Self {
            selection,
            counts,
            index_front: 0,
            index_back,
        }
    }

    fn indices(&self, index: u64) -> ArrayIndices {
        match self.selection {
            StorageSelection::Axes(axes) => {
                std::iter::zip(axes, unravel_index(index, &self.counts))
                    .map(|(axis, i)| axis.get(i).unwrap_or_default())
                    .collect()
            }
            StorageSelection::Points(points) => usize::try_from(index)
                .ok()
                .and_then(|i| points.get(i))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

impl Iterator for StorageIndicesIterator<'_> {
    type Item = ArrayIndices;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index_front < self.index_back {
            let indices = self.indices(self.index_front);
            self.index_front += 1;
            Some(indices)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = usize::try_from(self.index_back - self.index_front).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

impl DoubleEndedIterator for StorageIndicesIterator<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.index_back > self.index_front {
            self.index_back -= 1;
            Some(self.indices(self.index_back))
        } else {
            None
        }
    }
}

impl ExactSizeIterator for StorageIndicesIterator<'_> {}

impl FusedIterator for StorageIndicesIterator<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_selection() {
        let range = AxisSelection::Range {
            start: 2,
            step: 3,
            count: 3,
        };
        assert_eq!(range.len(), 3);
        assert_eq!(range.get(2), Some(8));
        assert_eq!(range.get(3), None);
        assert_eq!(range.end_exc(), 9);
        assert_eq!(
            range.restrict(1),
            AxisSelection::Range {
                start: 5,
                step: 1,
                count: 1
            }
        );
        assert_eq!(AxisSelection::Index(4).len(), 1);
        assert_eq!(AxisSelection::Index(4).end_exc(), 5);
        assert_eq!(AxisSelection::Coordinates(vec![1, 5, 3]).end_exc(), 6);
        assert_eq!(AxisSelection::full(0).end_exc(), 0);
    }

    #[test]
    fn axis_selection_regular() {
        assert_eq!(
            AxisSelection::Coordinates(vec![1, 3, 5]).regular(),
            Some((1, 2, 3))
        );
        assert_eq!(AxisSelection::Coordinates(vec![1, 2, 4]).regular(), None);
        assert_eq!(AxisSelection::Coordinates(vec![3, 1]).regular(), None);
        assert_eq!(AxisSelection::Coordinates(vec![7]).regular(), Some((7, 1, 1)));
    }

    #[test]
    fn storage_selection_indices() {
        let selection = StorageSelection::Axes(vec![
            AxisSelection::Coordinates(vec![1, 3]),
            AxisSelection::Index(2),
            AxisSelection::full(2),
        ]);
        assert_eq!(selection.npoints(), 4);
        assert!(selection.inbounds(&[4, 3, 2]));
        assert!(!selection.inbounds(&[3, 3, 2]));
        assert!(!selection.inbounds(&[4, 3]));
        let indices = selection.iter_indices();
        assert_eq!(indices.len(), 4);
        assert_eq!(
            indices.collect::<Vec<_>>(),
            vec![
                vec![1, 2, 0],
                vec![1, 2, 1],
                vec![3, 2, 0],
                vec![3, 2, 1]
            ]
        );
        assert_eq!(
            selection.iter_indices().rev().next(),
            Some(vec![3, 2, 1])
        );
        assert_eq!(selection.hyperslab().unwrap().stride, vec![2, 1, 1]);
    }

    #[test]
    fn storage_selection_scalar() {
        let selection = StorageSelection::Axes(vec![]);
        assert_eq!(selection.npoints(), 1);
        assert_eq!(selection.iter_indices().collect::<Vec<_>>(), vec![Vec::<u64>::new()]);
        assert!(selection.inbounds(&[]));
    }

    #[test]
    fn storage_selection_points() {
        let selection = StorageSelection::Points(vec![vec![0, 1], vec![2, 2]]);
        assert_eq!(selection.npoints(), 2);
        assert!(selection.hyperslab().is_none());
        assert!(selection.inbounds(&[3, 3]));
        assert!(!selection.inbounds(&[2, 3]));
        assert_eq!(
            selection.restrict(&[(0, 1)]),
            StorageSelection::Points(vec![vec![2, 2]])
        );
    }
}
