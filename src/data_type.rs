//! Element data types.
//!
//! A [`DataType`] is either elemental (integers, floats, fixed length strings, raw bits) or a [`CompoundDataType`] made of named fields at byte offsets.
//! Data types round trip through [`DataTypeMetadata`], their JSON form.

mod compound;

pub use compound::{CompoundDataType, CompoundField, InvalidCompoundDataTypeError};

use serde::{de::Error, Deserialize, Serialize};
use thiserror::Error;

/// A data type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[rustfmt::skip]
pub enum DataType {
    /// `bool` Boolean.
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    UInt64,
    /// `float16` IEEE 754 half-precision floating point.
    Float16,
    /// `float32` IEEE 754 single-precision floating point.
    Float32,
    /// `float64` IEEE 754 double-precision floating point.
    Float64,
    /// `complex64` real and complex components are each IEEE 754 single-precision floating point.
    Complex64,
    /// `complex128` real and complex components are each IEEE 754 double-precision floating point.
    Complex128,
    /// `S*` fixed length byte string, the stored usize is the length in bytes.
    FixedString(usize),
    /// `r*` raw bits, variable size given by *, limited to be a multiple of 8.
    RawBits(usize), // the stored usize is the size in bytes
    /// A compound (structured) data type.
    Compound(CompoundDataType),
}

/// An unsupported data type error.
#[derive(Debug, Error)]
#[error("unsupported data type {_0}")]
pub struct UnsupportedDataTypeError(String);

/// Data type metadata.
///
/// Elemental data types are represented by their name (e.g. `"int32"`, `"S10"`, `"r16"`).
/// Compound data types are represented by an object listing their fields and item size.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataTypeMetadata {
    /// An elemental data type name.
    Name(String),
    /// A compound data type.
    Compound(CompoundDataTypeMetadata),
}

/// Compound data type metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompoundDataTypeMetadata {
    /// The fields.
    pub fields: Vec<CompoundFieldMetadata>,
    /// The item size in bytes.
    pub size: usize,
}

/// Compound field metadata.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompoundFieldMetadata {
    /// The field name.
    pub name: String,
    /// The field data type.
    pub data_type: DataTypeMetadata,
    /// The byte offset of the field within an element.
    pub offset: usize,
}

impl DataTypeMetadata {
    /// Serialize the metadata as a pretty-printed String of JSON.
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn to_string_pretty(&self) -> String {
        serde_json::to_string_pretty(self).expect("data type metadata is valid JSON")
    }
}

impl Serialize for DataType {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        self.metadata().serialize(s)
    }
}

impl<'de> Deserialize<'de> for DataType {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let metadata = DataTypeMetadata::deserialize(d)?;
        Self::from_metadata(&metadata).map_err(|err| D::Error::custom(err.to_string()))
    }
}

impl DataType {
    /// Returns the identifier.
    #[must_use]
    pub const fn identifier(&self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::UInt64 => "uint64",
            Self::Float16 => "float16",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Complex64 => "complex64",
            Self::Complex128 => "complex128",
            Self::FixedString(_usize) => "S*",
            Self::RawBits(_usize) => "r*",
            Self::Compound(_) => "compound",
        }
    }

    /// Returns the name.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::FixedString(size) => format!("S{size}"),
            Self::RawBits(size) => format!("r{}", size * 8),
            Self::Compound(compound) => compound.to_string(),
            _ => self.identifier().to_string(),
        }
    }

    /// Returns the size of an element in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 | Self::Complex64 => 8,
            Self::Complex128 => 16,
            Self::FixedString(size) | Self::RawBits(size) => *size,
            Self::Compound(compound) => compound.size(),
        }
    }

    /// Returns true if the data type is a compound data type.
    #[must_use]
    pub const fn is_compound(&self) -> bool {
        matches!(self, Self::Compound(_))
    }

    /// Returns the compound data type, if this is a compound data type.
    #[must_use]
    pub const fn as_compound(&self) -> Option<&CompoundDataType> {
        match self {
            Self::Compound(compound) => Some(compound),
            _ => None,
        }
    }

    /// Returns the metadata.
    #[must_use]
    pub fn metadata(&self) -> DataTypeMetadata {
        match self {
            Self::Compound(compound) => DataTypeMetadata::Compound(CompoundDataTypeMetadata {
                fields: compound
                    .fields()
                    .iter()
                    .map(|field| CompoundFieldMetadata {
                        name: field.name().to_string(),
                        data_type: field.data_type().metadata(),
                        offset: field.offset(),
                    })
                    .collect(),
                size: compound.size(),
            }),
            _ => DataTypeMetadata::Name(self.name()),
        }
    }

    /// Create a data type from metadata.
    ///
    /// # Errors
    ///
    /// Returns [`UnsupportedDataTypeError`] if the metadata is invalid or names an unknown data type.
    pub fn from_metadata(metadata: &DataTypeMetadata) -> Result<Self, UnsupportedDataTypeError> {
        let name = match metadata {
            DataTypeMetadata::Name(name) => name.as_str(),
            DataTypeMetadata::Compound(compound) => {
                let fields = compound
                    .fields
                    .iter()
                    .map(|field| {
                        Ok(CompoundField::new(
                            field.name.clone(),
                            Self::from_metadata(&field.data_type)?,
                            field.offset,
                        ))
                    })
                    .collect::<Result<Vec<_>, UnsupportedDataTypeError>>()?;
                return CompoundDataType::new_with_offsets(fields, compound.size)
                    .map(Self::Compound)
                    .map_err(|err| UnsupportedDataTypeError(err.to_string()));
            }
        };

        match name {
            "bool" => return Ok(Self::Bool),
            "int8" => return Ok(Self::Int8),
            "int16" => return Ok(Self::Int16),
            "int32" => return Ok(Self::Int32),
            "int64" => return Ok(Self::Int64),
            "uint8" => return Ok(Self::UInt8),
            "uint16" => return Ok(Self::UInt16),
            "uint32" => return Ok(Self::UInt32),
            "uint64" => return Ok(Self::UInt64),
            "float16" => return Ok(Self::Float16),
            "float32" => return Ok(Self::Float32),
            "float64" => return Ok(Self::Float64),
            "complex64" => return Ok(Self::Complex64),
            "complex128" => return Ok(Self::Complex128),
            _ => {}
        };

        if let Some(size) = name.strip_prefix('S') {
            if let Ok(size) = size.parse::<usize>() {
                return Ok(Self::FixedString(size));
            }
        }

        if let Some(size_bits) = name.strip_prefix('r') {
            if let Ok(size_bits) = size_bits.parse::<usize>() {
                if size_bits % 8 == 0 {
                    return Ok(Self::RawBits(size_bits / 8));
                }
            }
        }

        Err(UnsupportedDataTypeError(name.to_string()))
    }
}

impl TryFrom<DataTypeMetadata> for DataType {
    type Error = UnsupportedDataTypeError;

    fn try_from(metadata: DataTypeMetadata) -> Result<Self, Self::Error> {
        Self::from_metadata(&metadata)
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}
