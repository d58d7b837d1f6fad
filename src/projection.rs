//! Compound field projection.
//!
//! A read or write may name a subset of the fields of a compound data type.
//! [`project`] resolves those names against the data type and produces the pair of data types used for the transfer:
//!  - the **storage** data type describes the fields as they are laid out in storage (the compound restricted to the named fields), and
//!  - the **memory** data type describes the elements of the caller's buffer.
//!
//! Naming exactly one field collapses the memory data type to that field's own data type, so a single field reads as a plain array.

use itertools::Itertools;
use thiserror::Error;

use crate::{data_type::DataType, ErrorKind};

/// The memory and storage data types of a transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataTypeProjection {
    memory: DataType,
    storage: DataType,
}

impl DataTypeProjection {
    /// Create an identity projection of `data_type`.
    #[must_use]
    pub fn identity(data_type: DataType) -> Self {
        Self {
            memory: data_type.clone(),
            storage: data_type,
        }
    }

    /// Return the memory data type.
    #[must_use]
    pub fn memory(&self) -> &DataType {
        &self.memory
    }

    /// Return the storage data type.
    #[must_use]
    pub fn storage(&self) -> &DataType {
        &self.storage
    }

    /// Returns true if the memory and storage data types are identical.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.memory == self.storage
    }

    /// Consume the projection and return the (memory, storage) data types.
    #[must_use]
    pub fn into_parts(self) -> (DataType, DataType) {
        (self.memory, self.storage)
    }
}

/// A field projection error.
#[derive(Clone, Debug, Error)]
pub enum ProjectionError {
    /// Field names were requested on a data type without fields.
    #[error("field names {_1:?} requested on data type {_0} which has no fields")]
    FieldsOnNonCompound(DataType, Vec<String>),
    /// One or more requested fields are not in the compound data type.
    #[error("fields {_0:?} not found in compound data type")]
    UnknownFields(Vec<String>),
    /// A field was requested more than once.
    #[error("fields {_0:?} requested more than once")]
    DuplicateFields(Vec<String>),
}

impl ProjectionError {
    /// Return the [`ErrorKind`] of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::Value
    }
}

/// Project `data_type` onto the fields named in `field_names`.
///
/// If `field_names` is empty, both data types are `data_type` unchanged.
/// Otherwise `data_type` must be compound, and the storage data type is the compound restricted to the named fields in the order they appear in `data_type`, with offsets and element size preserved.
/// The memory data type equals the storage data type unless exactly one field is named, in which case it is that field's data type.
///
/// # Errors
///
/// Returns a [`ProjectionError`] if
///  - fields are requested on a non-compound data type,
///  - any requested field is not in the compound data type, or
///  - a field is requested more than once.
pub fn project<S: AsRef<str>>(
    data_type: &DataType,
    field_names: &[S],
) -> Result<DataTypeProjection, ProjectionError> {
    if field_names.is_empty() {
        return Ok(DataTypeProjection::identity(data_type.clone()));
    }

    let Some(compound) = data_type.as_compound() else {
        return Err(ProjectionError::FieldsOnNonCompound(
            data_type.clone(),
            field_names.iter().map(|name| name.as_ref().to_string()).collect(),
        ));
    };

    let unknown = field_names
        .iter()
        .map(AsRef::as_ref)
        .filter(|name| !compound.contains_field(name))
        .map(str::to_string)
        .collect::<Vec<_>>();
    if !unknown.is_empty() {
        return Err(ProjectionError::UnknownFields(unknown));
    }

    let duplicates = field_names
        .iter()
        .map(AsRef::as_ref)
        .duplicates()
        .map(str::to_string)
        .collect::<Vec<_>>();
    if !duplicates.is_empty() {
        return Err(ProjectionError::DuplicateFields(duplicates));
    }

    let storage = compound.retain_fields(|field| {
        field_names
            .iter()
            .any(|name| name.as_ref() == field.name())
    });
    let memory = if let [field] = storage.fields() {
        field.data_type().clone()
    } else {
        DataType::Compound(storage.clone())
    };
    tracing::trace!(fields = ?storage.field_names().collect::<Vec<_>>(), "projected compound data type");

    Ok(DataTypeProjection {
        memory,
        storage: DataType::Compound(storage),
    })
}
