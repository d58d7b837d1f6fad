//! Datasets.
//!
//! A [`Dataset`] is anything with a shape and a data type that selections can be resolved against.
//! [`MemoryDataset`] is a dataset held in a contiguous C order byte buffer which can be read and written through a [`Selection`] and a [`DataTypeProjection`].

use std::ops::Range;

use thiserror::Error;

use crate::{
    data_type::DataType,
    projection::{project, DataTypeProjection, ProjectionError},
    selection::{select, IndexExpression, Selection, SelectionError},
    shape::{ravel_indices, ArrayShape},
    ErrorKind,
};

/// A dataset: an N-dimensional array with a fixed data type.
pub trait Dataset: Send + Sync {
    /// Return the shape of the dataset.
    fn shape(&self) -> &[u64];

    /// Return the data type of the dataset.
    fn data_type(&self) -> &DataType;

    /// Resolve `expression` against the dataset.
    ///
    /// # Errors
    ///
    /// Returns a [`SelectionError`] if `expression` is invalid for the dataset.
    fn select(&self, expression: impl Into<IndexExpression>) -> Result<Selection, SelectionError>
    where
        Self: Sized,
    {
        select(self.shape(), expression, Some(self))
    }

    /// Project the data type of the dataset onto `field_names`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProjectionError`] if the field names are invalid for the data type of the dataset.
    fn project<S: AsRef<str>>(
        &self,
        field_names: &[S],
    ) -> Result<DataTypeProjection, ProjectionError>
    where
        Self: Sized,
    {
        project(self.data_type(), field_names)
    }
}

/// A dataset error.
#[derive(Clone, Debug, Error)]
pub enum DatasetError {
    /// A selection was built against a different shape.
    #[error("selection shape {_0:?} does not match dataset shape {_1:?}")]
    ShapeMismatch(ArrayShape, ArrayShape),
    /// A selection is out of bounds or has an inconsistent memory shape.
    #[error(transparent)]
    InvalidSelection(#[from] SelectionError),
    /// A byte buffer has the wrong length.
    #[error("got bytes with size {_0}, expected {_1}")]
    InvalidBytesLength(usize, usize),
    /// A projection does not apply to the data type of the dataset.
    #[error("projection with storage data type {_0} is incompatible with data type {_1}")]
    IncompatibleProjection(DataType, DataType),
}

impl DatasetError {
    /// Return the [`ErrorKind`] of the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ShapeMismatch(..) | Self::IncompatibleProjection(..) => ErrorKind::Type,
            Self::InvalidBytesLength(..) => ErrorKind::Value,
            Self::InvalidSelection(err) => err.kind(),
        }
    }
}

/// A dataset held in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryDataset {
    shape: ArrayShape,
    data_type: DataType,
    bytes: Vec<u8>,
}

/// Byte ranges copied between a memory element and a storage element.
struct FieldCopy {
    memory: Range<usize>,
    storage: Range<usize>,
}

impl MemoryDataset {
    /// Create a zero filled dataset.
    ///
    /// # Panics
    ///
    /// Panics if the size of the dataset in bytes exceeds [`usize::MAX`].
    #[must_use]
    pub fn new(shape: ArrayShape, data_type: DataType) -> Self {
        let size = Self::size_in_bytes(&shape, &data_type);
        Self {
            shape,
            data_type,
            bytes: vec![0; size],
        }
    }

    /// Create a dataset from `bytes` in C order.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::InvalidBytesLength`] if the length of `bytes` does not match `shape` and `data_type`.
    ///
    /// # Panics
    ///
    /// Panics if the size of the dataset in bytes exceeds [`usize::MAX`].
    pub fn new_with_bytes(
        shape: ArrayShape,
        data_type: DataType,
        bytes: Vec<u8>,
    ) -> Result<Self, DatasetError> {
        let size = Self::size_in_bytes(&shape, &data_type);
        if bytes.len() != size {
            return Err(DatasetError::InvalidBytesLength(bytes.len(), size));
        }
        Ok(Self {
            shape,
            data_type,
            bytes,
        })
    }

    fn size_in_bytes(shape: &[u64], data_type: &DataType) -> usize {
        shape
            .iter()
            .try_fold(data_type.size(), |size, &len| {
                usize::try_from(len).ok()?.checked_mul(size)
            })
            .expect("size in bytes exceeds usize::MAX")
    }

    /// Return the bytes of the dataset in C order.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Read the elements addressed by `selection` in memory order.
    ///
    /// Each element of the output has the size of the memory data type of `projection`.
    /// Compound fields excluded by `projection` are zero in the output.
    ///
    /// # Errors
    ///
    /// Returns a [`DatasetError`] if `selection` or `projection` is incompatible with the dataset.
    ///
    /// # Panics
    ///
    /// Panics if the size of the output in bytes exceeds [`usize::MAX`].
    pub fn read(
        &self,
        selection: &Selection,
        projection: &DataTypeProjection,
    ) -> Result<Vec<u8>, DatasetError> {
        self.validate_selection(selection)?;
        let copies = self.field_copies(projection)?;
        let element_size = self.data_type.size();
        let memory_size = projection.memory().size();
        let storage = selection.storage();
        if memory_size == 0 {
            return Ok(vec![]);
        }
        let mut output = vec![0; Self::size_in_bytes(&[storage.npoints()], projection.memory())];
        for (memory_element, indices) in output
            .chunks_exact_mut(memory_size)
            .zip(storage.iter_indices())
        {
            let offset =
                usize::try_from(ravel_indices(&indices, &self.shape)).unwrap() * element_size;
            let element = &self.bytes[offset..offset + element_size];
            for copy in &copies {
                memory_element[copy.memory.clone()].copy_from_slice(&element[copy.storage.clone()]);
            }
        }
        tracing::debug!(
            %selection,
            memory_data_type = %projection.memory(),
            "read {} bytes",
            output.len()
        );
        Ok(output)
    }

    /// Write `bytes` to the elements addressed by `selection`.
    ///
    /// `bytes` holds elements of the memory data type of `projection` with the memory shape of `selection`.
    /// If `selection` is [broadcast](Selection::broadcast), `bytes` is written to each of its tiles.
    /// Compound fields excluded by `projection` are left unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`DatasetError`] if `selection`, `projection` or the length of `bytes` is incompatible with the dataset.
    ///
    /// # Panics
    ///
    /// Panics if the size of `bytes` implied by the memory shape of `selection` exceeds [`usize::MAX`].
    pub fn write(
        &mut self,
        selection: &Selection,
        projection: &DataTypeProjection,
        bytes: &[u8],
    ) -> Result<(), DatasetError> {
        self.validate_selection(selection)?;
        let copies = self.field_copies(projection)?;
        let element_size = self.data_type.size();
        let memory_size = projection.memory().size();
        let expected = Self::size_in_bytes(selection.mshape(), projection.memory());
        if bytes.len() != expected {
            return Err(DatasetError::InvalidBytesLength(bytes.len(), expected));
        }

        if memory_size == 0 {
            return Ok(());
        }
        let tiles = selection.tiles();
        for tile in &tiles {
            for (memory_element, indices) in bytes.chunks_exact(memory_size).zip(tile.iter_indices())
            {
                let offset =
                    usize::try_from(ravel_indices(&indices, &self.shape)).unwrap() * element_size;
                let element = &mut self.bytes[offset..offset + element_size];
                for copy in &copies {
                    element[copy.storage.clone()].copy_from_slice(&memory_element[copy.memory.clone()]);
                }
            }
        }
        tracing::debug!(
            %selection,
            memory_data_type = %projection.memory(),
            tiles = tiles.len(),
            "wrote {} bytes",
            bytes.len()
        );
        Ok(())
    }

    fn validate_selection(&self, selection: &Selection) -> Result<(), DatasetError> {
        if selection.shape() != self.shape {
            return Err(DatasetError::ShapeMismatch(
                selection.shape().to_vec(),
                self.shape.clone(),
            ));
        }
        selection.validate()?;
        Ok(())
    }

    /// Return the byte ranges copied per element for `projection`.
    fn field_copies(&self, projection: &DataTypeProjection) -> Result<Vec<FieldCopy>, DatasetError> {
        let incompatible = || {
            DatasetError::IncompatibleProjection(
                projection.storage().clone(),
                self.data_type.clone(),
            )
        };
        if projection.is_identity() && projection.storage() == &self.data_type {
            let size = self.data_type.size();
            return Ok(vec![FieldCopy {
                memory: 0..size,
                storage: 0..size,
            }]);
        }

        let (Some(storage), Some(compound)) =
            (projection.storage().as_compound(), self.data_type.as_compound())
        else {
            return Err(incompatible());
        };
        if storage.size() != compound.size()
            || !storage
                .fields()
                .iter()
                .all(|field| compound.field(field.name()) == Some(field))
        {
            return Err(incompatible());
        }

        match (projection.memory(), storage.fields()) {
            (DataType::Compound(memory), _) if memory == storage => Ok(storage
                .fields()
                .iter()
                .map(|field| FieldCopy {
                    memory: field.offset()..field.end(),
                    storage: field.offset()..field.end(),
                })
                .collect()),
            (memory, [field]) if memory == field.data_type() => Ok(vec![FieldCopy {
                memory: 0..memory.size(),
                storage: field.offset()..field.end(),
            }]),
            _ => Err(incompatible()),
        }
    }
}

impl Dataset for MemoryDataset {
    fn shape(&self) -> &[u64] {
        &self.shape
    }

    fn data_type(&self) -> &DataType {
        &self.data_type
    }
}
