use serde::{Deserialize, Serialize};

use crate::{dataset::Dataset, shape::ArrayShape};

use super::{select, IndexExpression, Selection, SelectionError};

/// A reference to a selection of a dataset.
///
/// The reference owns the shape of the dataset and the selection at the time of creation.
/// It holds no reference to the dataset itself, and it is only valid as an index to a dataset of the same shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RegionReferenceParts")]
pub struct RegionReference {
    shape: ArrayShape,
    selection: Selection,
}

#[derive(Deserialize)]
struct RegionReferenceParts {
    shape: ArrayShape,
    selection: Selection,
}

impl TryFrom<RegionReferenceParts> for RegionReference {
    type Error = SelectionError;

    fn try_from(parts: RegionReferenceParts) -> Result<Self, Self::Error> {
        if parts.shape != parts.selection.shape() {
            return Err(SelectionError::RegionReferenceShapeMismatch(
                parts.shape,
                parts.selection.shape().to_vec(),
            ));
        }
        Ok(Self::from_selection(parts.selection))
    }
}

impl RegionReference {
    /// Create a region reference to the elements of `dataset` addressed by `expression`.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] if `expression` cannot be resolved against `dataset`.
    pub fn new(
        dataset: &dyn Dataset,
        expression: impl Into<IndexExpression>,
    ) -> Result<Self, SelectionError> {
        let selection = select(dataset.shape(), expression, Some(dataset))?;
        Ok(Self::from_selection(selection))
    }

    /// Create a region reference to `selection`.
    #[must_use]
    pub fn from_selection(selection: Selection) -> Self {
        Self {
            shape: selection.shape().to_vec(),
            selection,
        }
    }

    /// Return the shape of the referenced dataset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the referenced selection.
    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Serialize the region reference as a pretty-printed String of JSON.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn to_string_pretty(&self) -> String {
        serde_json::to_string_pretty(self).expect("region reference is valid JSON")
    }

    /// Deserialize a region reference from JSON.
    ///
    /// # Errors
    ///
    /// Returns a [`serde_json::Error`] if `json` is not a region reference, or if the referenced selection fails [`Selection::validate`] or does not have the shape of the reference.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl core::fmt::Display for RegionReference {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "region reference to {}", self.selection)
    }
}
