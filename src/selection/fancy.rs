use serde::{Deserialize, Serialize};

use crate::shape::ArrayShape;

use super::{AxisSelection, StorageSelection};

/// An orthogonal (outer product) selection with at least one coordinate list, or a selection derived from another.
///
/// Integer indexed axes are omitted from the memory shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FancySelection {
    storage: StorageSelection,
}

impl FancySelection {
    /// Create a new fancy selection addressing `storage`.
    #[must_use]
    pub fn new(storage: StorageSelection) -> Self {
        Self { storage }
    }

    /// Return the addressed storage elements.
    #[must_use]
    pub fn storage(&self) -> &StorageSelection {
        &self.storage
    }

    /// Return the memory shape: the length of every axis not indexed by an integer, or the number of points of a point list.
    #[must_use]
    pub fn mshape(&self) -> ArrayShape {
        match &self.storage {
            StorageSelection::Axes(axes) => axes
                .iter()
                .filter(|axis| !axis.is_index())
                .map(AxisSelection::len)
                .collect(),
            StorageSelection::Points(points) => vec![points.len() as u64],
        }
    }

    /// Return the storage axis corresponding to each memory axis.
    pub(crate) fn memory_axes(&self) -> Vec<usize> {
        match &self.storage {
            StorageSelection::Axes(axes) => axes
                .iter()
                .enumerate()
                .filter(|(_, axis)| !axis.is_index())
                .map(|(i, _)| i)
                .collect(),
            StorageSelection::Points(_) => vec![0],
        }
    }
}
