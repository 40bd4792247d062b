//! Parsers for exported tabular field data.
//!
//! One producer of [`crate::potential::AxialSample`] values; the solver core
//! never performs I/O itself and accepts samples from any source.

mod table;

pub use table::{axial_sample_from_tables, ParsedTable, TableError};
