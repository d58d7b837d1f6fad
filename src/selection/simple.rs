use serde::{Deserialize, Serialize};

use crate::shape::{ArrayIndices, ArrayShape};

use super::AxisSelection;

/// A regular hyperslab selection built from integers, slices and ellipses.
///
/// Each axis is either a single integer index (a scalar axis) or a strided range.
/// Scalar axes are length 1 in the memory shape and are dropped from the array shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SimpleSelection {
    axes: Vec<AxisSelection>,
}

impl SimpleSelection {
    /// Create a simple selection spanning the whole of `shape`.
    #[must_use]
    pub fn new_all(shape: &[u64]) -> Self {
        Self {
            axes: shape.iter().map(|&len| AxisSelection::full(len)).collect(),
        }
    }

    /// Create a simple selection from per-axis selections.
    ///
    /// # Errors
    ///
    /// Returns `axes` unchanged if any axis is a coordinate list.
    pub fn from_axes(axes: Vec<AxisSelection>) -> Result<Self, Vec<AxisSelection>> {
        if axes
            .iter()
            .any(|axis| matches!(axis, AxisSelection::Coordinates(_)))
        {
            Err(axes)
        } else {
            Ok(Self { axes })
        }
    }

    /// Return the per-axis selections.
    #[must_use]
    pub fn axes(&self) -> &[AxisSelection] {
        &self.axes
    }

    /// Return the start of each axis.
    #[must_use]
    pub fn start(&self) -> ArrayIndices {
        self.axes
            .iter()
            .map(|axis| axis.get(0).unwrap_or_default())
            .collect()
    }

    /// Return the number of elements on each axis.
    #[must_use]
    pub fn count(&self) -> ArrayShape {
        self.axes.iter().map(AxisSelection::len).collect()
    }

    /// Return the step of each axis.
    #[must_use]
    pub fn step(&self) -> ArrayShape {
        self.axes
            .iter()
            .map(|axis| match axis {
                AxisSelection::Range { step, .. } => *step,
                _ => 1,
            })
            .collect()
    }

    /// Return whether each axis is a scalar (integer indexed) axis.
    #[must_use]
    pub fn scalar(&self) -> Vec<bool> {
        self.axes.iter().map(AxisSelection::is_index).collect()
    }
}
