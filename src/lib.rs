//! Selection resolution and compound type projection for hierarchical N-dimensional array stores.
//!
//! Reading or writing part of a dataset starts with two questions: which elements, and which fields of each element.
//!  - [`selection::select`] turns an index expression into a [`Selection`](selection::Selection), which knows the storage elements it addresses and the shape of the memory buffer on the other side of the transfer.
//!  - [`projection::project`] turns a list of compound field names into the memory and storage [`DataType`](data_type::DataType)s of the transfer.
//!
//! [`dataset::MemoryDataset`] is an in-memory dataset that applies both to a byte buffer.
//!
//! ## Example
//! ```rust
//! # use h5select::{dataset::{Dataset, MemoryDataset}, data_type::DataType, selection::Index};
//! let dataset = MemoryDataset::new(vec![10, 100], DataType::Float32);
//! let selection = dataset.select(vec![Index::Integer(1), Index::from(..)])?;
//! assert_eq!(selection.mshape(), &[1, 100]);
//! assert_eq!(selection.array_shape(), &[100]);
//!
//! // Write a single value to every selected element
//! let broadcast = selection.broadcast(&[])?;
//! assert_eq!(broadcast.tiles().len(), 100);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! #### Default
//!  - `ndarray`: conversions from [`ndarray`] arrays to index components and boolean masks.
//!
//! ## Licence
//! `h5select` is licensed under either of
//!  - the Apache License, Version 2.0 <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod config;
pub mod data_type;
pub mod dataset;
pub mod projection;
pub mod selection;
pub mod shape;

/// The category of an error.
///
/// Every error of the crate maps to one of these, mirroring the exception type a binding would raise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A value is invalid, such as an out of bounds index or an unknown field name.
    Value,
    /// An operand has the wrong type or shape, such as a region reference applied without a dataset.
    Type,
    /// An internal precondition was violated.
    Runtime,
}
