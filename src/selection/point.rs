use serde::{Deserialize, Serialize};

use crate::shape::{unravel_index, ArrayIndices};

use super::BooleanMask;

/// An explicit list of element coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PointSelection {
    points: Vec<ArrayIndices>,
}

impl PointSelection {
    /// Create a new point selection.
    #[must_use]
    pub fn new(points: Vec<ArrayIndices>) -> Self {
        Self { points }
    }

    /// Create a point selection of the `true` elements of `mask`, in C order.
    #[must_use]
    pub fn from_mask(mask: &BooleanMask) -> Self {
        let points = mask
            .values()
            .iter()
            .enumerate()
            .filter(|(_, &value)| value)
            .map(|(i, _)| unravel_index(i as u64, mask.shape()))
            .collect();
        Self { points }
    }

    /// Return the points.
    #[must_use]
    pub fn points(&self) -> &[ArrayIndices] {
        &self.points
    }

    /// Return the number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if there are no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn point_selection_from_mask() {
        let mask = BooleanMask::new(vec![2, 3], vec![true, false, false, false, true, true]).unwrap();
        let points = PointSelection::from_mask(&mask);
        assert_eq!(points.len(), 3);
        assert_eq!(points.points(), &[vec![0, 0], vec![1, 1], vec![1, 2]]);
    }
}
