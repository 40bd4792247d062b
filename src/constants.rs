//! Baseline physical constants and utility functions.
//!
//! ## Accuracy
//!
//! Constants marked "exact" have zero uncertainty by SI definition (2019
//! revision). Measured constants (ε₀, u) are provided with 11-12 significant
//! figures, sufficient for trap-frequency work at the hertz level.
//!
//! ## References
//!
//! Physical constants are based on CODATA recommended values:
//! - NIST Reference on Constants, Units, and Uncertainty: <https://physics.nist.gov/cuu/Constants/>
//! - Mohr, P. J., Newell, D. B., Taylor, B. N., & Tiesinga, E. (2019). CODATA Recommended Values of the Fundamental Physical Constants: 2018.

use std::f64::consts::PI;

/// Vacuum permittivity ε₀ in farads per meter (F/m).
/// Approximate value: 8.8541878128 × 10⁻¹² F/m (11 significant figures).
pub const VACUUM_PERMITTIVITY: f64 = 8.854_187_812_8e-12;
/// Elementary charge _e_ in coulombs (C).
/// Exact value by 2019 SI definition: 1.602176634 × 10⁻¹⁹ C.
pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
/// Atomic mass constant _u_ in kilograms (kg).
/// CODATA 2018: 1.66053906660 × 10⁻²⁷ kg.
pub const ATOMIC_MASS: f64 = 1.660_539_066_60e-27;

/// Returns the Coulomb constant k = 1/(4πε₀) in N·m²/C².
#[inline]
#[must_use]
pub fn coulomb_constant() -> f64 {
    1.0 / (4.0 * PI * VACUUM_PERMITTIVITY)
}

/// Returns the angular frequency corresponding to a linear frequency `hz`.
#[inline]
#[must_use]
pub fn angular_frequency(hz: f64) -> f64 {
    2.0 * PI * hz
}

/// Returns the ordinary frequency in hertz for an angular frequency in rad/s.
#[inline]
#[must_use]
pub fn ordinary_frequency(omega: f64) -> f64 {
    omega / (2.0 * PI)
}
