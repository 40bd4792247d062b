//! Convenience re-exports for setting up trap-mode calculations.

pub use crate::chain::{Ion, IonChain};
pub use crate::constants::*;
pub use crate::equilibrium::{
    energy_gradient, energy_hessian, initial_guess, solve_equilibrium,
    solve_equilibrium_from, solve_symmetric_pair, ConvergenceCriteria, EquilibriumState,
    SolveError,
};
pub use crate::errors::TrapModesError;
pub use crate::io::{axial_sample_from_tables, ParsedTable, TableError};
pub use crate::math::{linspace, Scalar};
pub use crate::modes::{
    solve_chain_modes, solve_modes, ChainModes, ModeCriteria, ModeError, NormalModeResult,
};
pub use crate::potential::{
    AxialPotential, AxialSample, CubicSpline, HarmonicPotential, InterpolatedPotential,
    PotentialError, SampleError, VoltageConfiguration,
};
pub use crate::sweep::{sweep_map, sweep_voltage_scale};
