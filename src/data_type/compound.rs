use itertools::Itertools;
use thiserror::Error;

use super::DataType;

/// A named field of a [`CompoundDataType`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompoundField {
    name: String,
    data_type: DataType,
    offset: usize,
}

impl CompoundField {
    /// Create a new compound field.
    #[must_use]
    pub fn new(name: impl Into<String>, data_type: DataType, offset: usize) -> Self {
        Self {
            name: name.into(),
            data_type,
            offset,
        }
    }

    /// Return the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the field data type.
    #[must_use]
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Return the byte offset of the field within an element.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Return the byte offset one past the end of the field.
    #[must_use]
    pub fn end(&self) -> usize {
        self.offset + self.data_type.size()
    }
}

/// A compound (structured) data type.
///
/// An ordered list of uniquely named fields, each with a data type and a byte offset, and a total element size.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CompoundDataType {
    fields: Vec<CompoundField>,
    size: usize,
}

/// An invalid compound data type error.
#[derive(Clone, Debug, Error)]
pub enum InvalidCompoundDataTypeError {
    /// A field name appears more than once.
    #[error("duplicate compound field name {_0}")]
    DuplicateField(String),
    /// A field extends beyond the element size.
    #[error("compound field {_0} ends at byte {_1}, beyond the element size {_2}")]
    FieldOutOfBounds(String, usize, usize),
    /// Two fields overlap.
    #[error("compound fields {_0} and {_1} overlap")]
    OverlappingFields(String, String),
}

impl CompoundDataType {
    /// Create a new packed compound data type.
    ///
    /// Fields are laid out one after the other in the order given, with no padding.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCompoundDataTypeError`] if a field name is duplicated.
    pub fn new<N: Into<String>>(
        fields: impl IntoIterator<Item = (N, DataType)>,
    ) -> Result<Self, InvalidCompoundDataTypeError> {
        let mut offset = 0;
        let fields = fields
            .into_iter()
            .map(|(name, data_type)| {
                let field = CompoundField::new(name, data_type, offset);
                offset = field.end();
                field
            })
            .collect::<Vec<_>>();
        Self::new_with_offsets(fields, offset)
    }

    /// Create a new compound data type with explicit field offsets and element size.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCompoundDataTypeError`] if a field name is duplicated, a field extends beyond `size`, or fields overlap.
    pub fn new_with_offsets(
        fields: Vec<CompoundField>,
        size: usize,
    ) -> Result<Self, InvalidCompoundDataTypeError> {
        if let Some(field) = fields.iter().duplicates_by(|field| field.name()).next() {
            return Err(InvalidCompoundDataTypeError::DuplicateField(
                field.name().to_string(),
            ));
        }
        if let Some(field) = fields.iter().find(|field| field.end() > size) {
            return Err(InvalidCompoundDataTypeError::FieldOutOfBounds(
                field.name().to_string(),
                field.end(),
                size,
            ));
        }
        let overlap = fields
            .iter()
            .filter(|field| field.data_type().size() > 0)
            .sorted_by_key(|field| field.offset())
            .tuple_windows()
            .find(|(a, b)| a.end() > b.offset());
        if let Some((a, b)) = overlap {
            return Err(InvalidCompoundDataTypeError::OverlappingFields(
                a.name().to_string(),
                b.name().to_string(),
            ));
        }
        Ok(Self { fields, size })
    }

    /// Return the fields.
    #[must_use]
    pub fn fields(&self) -> &[CompoundField] {
        &self.fields
    }

    /// Return the field named `name`, if it exists.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&CompoundField> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Returns true if the compound data type has a field named `name`.
    #[must_use]
    pub fn contains_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    /// Return an iterator over the field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(CompoundField::name)
    }

    /// Return the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the compound data type has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Return the element size in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Return a compound data type with only the fields satisfying `predicate`.
    ///
    /// Field order, field offsets and the element size are preserved.
    #[must_use]
    pub fn retain_fields(&self, predicate: impl Fn(&CompoundField) -> bool) -> Self {
        Self {
            fields: self
                .fields
                .iter()
                .filter(|field| predicate(field))
                .cloned()
                .collect(),
            size: self.size,
        }
    }
}

impl core::fmt::Display for CompoundDataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let fields = self
            .fields
            .iter()
            .map(|field| format!("{}: {} @ {}", field.name, field.data_type, field.offset))
            .join(", ");
        write!(f, "{{{fields}}} ({} bytes)", self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_packed() {
        let compound = CompoundDataType::new([
            ("a", DataType::Int32),
            ("b", DataType::Float32),
            ("c", DataType::FixedString(10)),
        ])
        .unwrap();
        assert_eq!(compound.len(), 3);
        assert_eq!(compound.size(), 18);
        assert_eq!(compound.field("b").unwrap().offset(), 4);
        assert_eq!(compound.field("c").unwrap().offset(), 8);
        assert!(compound.contains_field("a"));
        assert!(!compound.contains_field("d"));
    }

    #[test]
    fn compound_invalid() {
        assert!(matches!(
            CompoundDataType::new([("a", DataType::Int32), ("a", DataType::Int8)]),
            Err(InvalidCompoundDataTypeError::DuplicateField(name)) if name == "a"
        ));
        assert!(matches!(
            CompoundDataType::new_with_offsets(vec![CompoundField::new("a", DataType::Int64, 4)], 8),
            Err(InvalidCompoundDataTypeError::FieldOutOfBounds(_, 12, 8))
        ));
        assert!(matches!(
            CompoundDataType::new_with_offsets(
                vec![
                    CompoundField::new("a", DataType::Int32, 0),
                    CompoundField::new("b", DataType::Int32, 2),
                ],
                8
            ),
            Err(InvalidCompoundDataTypeError::OverlappingFields(..))
        ));
    }

    #[test]
    fn compound_retain_fields() {
        let compound = CompoundDataType::new_with_offsets(
            vec![
                CompoundField::new("a", DataType::Int32, 0),
                CompoundField::new("b", DataType::Float32, 8),
                CompoundField::new("c", DataType::UInt8, 12),
            ],
            16,
        )
        .unwrap();
        let retained = compound.retain_fields(|field| field.name() != "b");
        assert_eq!(retained.field_names().collect::<Vec<_>>(), ["a", "c"]);
        assert_eq!(retained.field("c").unwrap().offset(), 12);
        assert_eq!(retained.size(), 16);
    }
}
