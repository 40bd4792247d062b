//! Normal-mode frequencies and eigenvectors about a chain equilibrium.
//!
//! The Hessian of the total potential energy at equilibrium, mass-weighted
//! as `A = M^{-1/2}·H·M^{-1/2}`, is symmetric; its eigenvalues are the
//! squared mode angular frequencies and its eigenvectors, transformed back
//! by `M^{-1/2}`, are the per-ion displacement patterns.

use crate::chain::IonChain;
use crate::equilibrium::{
    energy_hessian, solve_equilibrium, state_vector, ConvergenceCriteria, EquilibriumState,
};
use crate::errors::TrapModesError;
use crate::math::{RMat, RVec, Scalar};
use crate::potential::{AxialPotential, PotentialError};

/// Errors raised by the normal-mode solver.
#[derive(Debug, thiserror::Error)]
pub enum ModeError {
    /// A squared mode frequency is negative beyond numerical noise: the
    /// supplied configuration does not confine the chain.
    #[error("unstable equilibrium: squared mode frequency {eigenvalue:.3e} rad^2/s^2")]
    UnstableEquilibrium {
        /// The offending eigenvalue of the mass-weighted Hessian.
        eigenvalue: Scalar,
    },
    /// The Hessian's condition estimate exceeds the configured limit;
    /// equilibrium spacings are degenerate at working precision.
    #[error("ill-conditioned Hessian: condition estimate {estimate:.3e} exceeds limit {limit:.3e}")]
    IllConditioned {
        /// Ratio of largest to smallest absolute eigenvalue.
        estimate: Scalar,
        /// Configured limit.
        limit: Scalar,
    },
    /// Potential evaluation failed while assembling the Hessian.
    #[error(transparent)]
    Potential(#[from] PotentialError),
}

/// Noise and conditioning thresholds for the eigenproblem.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeCriteria {
    /// Eigenvalues within this fraction of the largest magnitude are
    /// treated as zero (soft modes); more negative ones are unstable.
    pub stability_tolerance: Scalar,
    /// Maximum accepted ratio of largest to smallest absolute eigenvalue.
    pub condition_limit: Scalar,
}

impl Default for ModeCriteria {
    fn default() -> Self {
        Self {
            stability_tolerance: 1e-9,
            condition_limit: 1e14,
        }
    }
}

/// Mode angular frequencies (ascending) and displacement patterns.
///
/// Column k of the eigenvector matrix is the displacement pattern of mode
/// k, scaled to unit norm under the mass-weighted inner product
/// `⟨u, v⟩ = Σᵢ mᵢ·uᵢ·vᵢ`, which makes the columns mutually orthonormal
/// under that product.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NormalModeResult {
    frequencies: RVec,
    eigenvectors: RMat,
}

impl NormalModeResult {
    /// Mode angular frequencies in rad/s, non-decreasing.
    #[must_use]
    pub fn angular_frequencies(&self) -> &[Scalar] {
        self.frequencies.as_slice()
    }

    /// Mode frequencies in hertz, non-decreasing.
    #[must_use]
    pub fn frequencies_hz(&self) -> Vec<Scalar> {
        self.frequencies
            .iter()
            .map(|w| crate::constants::ordinary_frequency(*w))
            .collect()
    }

    /// Displacement patterns, one column per mode.
    #[must_use]
    pub fn eigenvectors(&self) -> &RMat {
        &self.eigenvectors
    }

    /// Number of modes (equals the chain length).
    #[must_use]
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Always false; there is one mode per ion.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Diagonalizes the mass-weighted Hessian at `state`.
///
/// # Panics
/// Panics if the state length does not match the chain.
pub fn solve_modes<P: AxialPotential + ?Sized>(
    potential: &P,
    chain: &IonChain,
    state: &EquilibriumState,
    criteria: &ModeCriteria,
) -> Result<NormalModeResult, ModeError> {
    assert_eq!(state.len(), chain.len(), "state length must match chain");
    let charges = chain.charges();
    let masses = chain.masses();
    let n = chain.len();
    let hessian = energy_hessian(potential, &charges, state_vector(state))?;

    // A = M^{-1/2} H M^{-1/2}
    let inv_sqrt_m: Vec<Scalar> = masses.iter().map(|m| 1.0 / m.sqrt()).collect();
    let mut weighted = hessian;
    for i in 0..n {
        for j in 0..n {
            weighted[(i, j)] *= inv_sqrt_m[i] * inv_sqrt_m[j];
        }
    }

    let eigen = weighted.symmetric_eigen();
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[a]
            .partial_cmp(&eigen.eigenvalues[b])
            .expect("eigenvalues are finite")
    });

    let magnitude = order
        .iter()
        .map(|&k| eigen.eigenvalues[k].abs())
        .fold(0.0_f64, Scalar::max);
    let noise_floor = criteria.stability_tolerance * magnitude;

    let smallest = eigen.eigenvalues[order[0]];
    if smallest < -noise_floor {
        return Err(ModeError::UnstableEquilibrium {
            eigenvalue: smallest,
        });
    }

    let smallest_magnitude = order
        .iter()
        .map(|&k| eigen.eigenvalues[k].abs())
        .fold(Scalar::INFINITY, Scalar::min);
    let estimate = if smallest_magnitude > 0.0 {
        magnitude / smallest_magnitude
    } else {
        Scalar::INFINITY
    };
    if estimate > criteria.condition_limit {
        return Err(ModeError::IllConditioned {
            estimate,
            limit: criteria.condition_limit,
        });
    }

    let mut frequencies = RVec::zeros(n);
    let mut eigenvectors = RMat::zeros(n, n);
    for (col, &k) in order.iter().enumerate() {
        // Values inside the noise floor are soft modes, clamped to zero.
        let lambda = eigen.eigenvalues[k].max(0.0);
        frequencies[col] = lambda.sqrt();

        // Transform back to physical displacements; the mass-weighted norm
        // of the column stays 1 because the eigenvector basis is
        // orthonormal.
        let mut column = eigen.eigenvectors.column(k).clone_owned();
        for (i, c) in column.iter_mut().enumerate() {
            *c *= inv_sqrt_m[i];
        }
        // Fix the overall sign so the largest component is positive.
        let dominant = column
            .iter()
            .cloned()
            .max_by(|a, b| a.abs().partial_cmp(&b.abs()).expect("finite"))
            .unwrap_or(1.0);
        if dominant < 0.0 {
            column.iter_mut().for_each(|c| *c = -*c);
        }
        eigenvectors.set_column(col, &column);
    }

    Ok(NormalModeResult {
        frequencies,
        eigenvectors,
    })
}

/// Equilibrium and mode spectrum from one combined solve.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainModes {
    /// Converged chain positions.
    pub equilibrium: EquilibriumState,
    /// Mode spectrum about those positions.
    pub modes: NormalModeResult,
}

/// Runs the equilibrium solve followed by the mode solve.
pub fn solve_chain_modes<P: AxialPotential + ?Sized>(
    potential: &P,
    chain: &IonChain,
    convergence: &ConvergenceCriteria,
    criteria: &ModeCriteria,
) -> Result<ChainModes, TrapModesError> {
    let equilibrium = solve_equilibrium(potential, chain, convergence)?;
    let modes = solve_modes(potential, chain, &equilibrium, criteria)?;
    Ok(ChainModes { equilibrium, modes })
}
