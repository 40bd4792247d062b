#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![warn(clippy::all, clippy::cargo, clippy::nursery, missing_docs)]
#![doc = include_str!("../README.md")]

/// Fundamental physical constants used throughout the library.
pub mod constants;
/// Shared numerical primitives and small vector utilities.
pub mod math;
/// Axial potential construction from per-electrode field samples.
pub mod potential;
/// Ion species and chain definitions.
pub mod chain;
/// Equilibrium position solver for interacting chains.
pub mod equilibrium;
/// Normal-mode frequencies and eigenvectors about equilibrium.
pub mod modes;
/// Voltage-scale sweep helpers.
pub mod sweep;
/// Parsers for exported tabular field data.
pub mod io;
/// Error types shared between submodules.
pub mod errors;

/// Common exports for downstream crates.
pub mod prelude;

pub use errors::TrapModesError;
