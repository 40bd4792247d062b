//! Axial potential construction from per-electrode unit-voltage samples.
//!
//! The control-voltage method solves the trap field once per electrode at
//! 1 V; any DC configuration follows by linear superposition. This module
//! holds the validated sample data, the per-electrode interpolants, and the
//! [`AxialPotential`] capability trait shared by the numeric and closed-form
//! variants.

mod model;
mod sample;
mod spline;

pub use model::{AxialPotential, HarmonicPotential, InterpolatedPotential, PotentialError};
pub use sample::{AxialSample, SampleError, VoltageConfiguration};
pub use spline::CubicSpline;
