//! Equilibrium positions of an interacting ion chain under axial confinement.
//!
//! The total potential energy of N charges in an external potential V is
//! `U = Σᵢ qᵢ·V(xᵢ) + Σ_{i<j} k·qᵢqⱼ/|xᵢ−xⱼ|`. The solver finds the
//! stationary point of U by damped Newton–Raphson on the gradient with the
//! analytic Jacobian; the Jacobian is the same Hessian the mode solver
//! diagonalizes, so both stages share [`energy_hessian`].

use crate::chain::IonChain;
use crate::constants::coulomb_constant;
use crate::math::{linspace, max_norm, strictly_increasing, RMat, RVec, Scalar};
use crate::potential::{AxialPotential, PotentialError};

/// Errors raised by the equilibrium solver.
#[derive(Debug, thiserror::Error)]
pub enum SolveError {
    /// The iteration hit its cap without satisfying any convergence test.
    #[error("equilibrium iteration failed to converge after {iterations} iterations (gradient max-norm {gradient_norm:.3e} N)")]
    Diverged {
        /// Iterations completed before giving up.
        iterations: usize,
        /// Gradient max-norm at termination.
        gradient_norm: Scalar,
    },
    /// Adjacent ions closed below the configured minimum separation; the
    /// ordering invariant would be violated.
    #[error("adjacent ions at separation {separation:.3e} m, below the minimum {min_separation:.3e} m")]
    Collision {
        /// Offending adjacent separation.
        separation: Scalar,
        /// Configured minimum separation.
        min_separation: Scalar,
    },
    /// An iterate left the sampled axial range.
    #[error(transparent)]
    OutOfDomain(#[from] PotentialError),
}

/// Convergence thresholds and iteration caps for the Newton solve.
///
/// The gradient test is relative to the initial gradient max-norm and the
/// step test relative to the position max-norm, so the defaults work at any
/// length or charge scale; `absolute_tolerance` (in newtons) is an opt-in
/// absolute cutoff.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConvergenceCriteria {
    /// Maximum number of Newton iterations.
    pub max_iterations: usize,
    /// Relative gradient tolerance: converged when the gradient max-norm
    /// falls below this fraction of its initial value.
    pub gradient_tolerance: Scalar,
    /// Absolute gradient tolerance in newtons; 0 disables the test except
    /// for an exactly vanishing gradient.
    pub absolute_tolerance: Scalar,
    /// Relative step tolerance: converged when the damped Newton step
    /// max-norm falls below this fraction of the position max-norm.
    pub step_tolerance: Scalar,
    /// Minimum allowed separation between adjacent ions in meters.
    pub min_separation: Scalar,
}

impl Default for ConvergenceCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            gradient_tolerance: 1e-10,
            absolute_tolerance: 0.0,
            step_tolerance: 1e-12,
            min_separation: 0.0,
        }
    }
}

impl ConvergenceCriteria {
    /// Checks whether the current iterate satisfies any convergence test.
    fn is_converged(
        &self,
        gradient_norm: Scalar,
        initial_norm: Scalar,
        step_norm: Scalar,
        position_scale: Scalar,
    ) -> bool {
        gradient_norm <= self.absolute_tolerance
            || gradient_norm < self.gradient_tolerance * initial_norm
            || step_norm < self.step_tolerance * position_scale
    }
}

/// Converged chain positions, strictly increasing, inside the potential
/// domain, with the energy gradient below the configured tolerance.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EquilibriumState {
    positions: RVec,
}

impl EquilibriumState {
    /// Wraps externally obtained positions (e.g. imported from another
    /// tool). Positions must be strictly increasing; stationarity is the
    /// caller's responsibility — use [`solve_equilibrium`] for verified
    /// states.
    ///
    /// # Panics
    /// Panics on an empty position list.
    pub fn from_positions(positions: Vec<Scalar>) -> Result<Self, SolveError> {
        assert!(!positions.is_empty(), "a state holds at least one position");
        if !strictly_increasing(&positions) {
            let separation = positions
                .windows(2)
                .map(|w| w[1] - w[0])
                .fold(Scalar::INFINITY, Scalar::min);
            return Err(SolveError::Collision {
                separation,
                min_separation: 0.0,
            });
        }
        Ok(Self {
            positions: RVec::from_vec(positions),
        })
    }

    /// Positions in meters, ascending.
    #[must_use]
    pub fn positions(&self) -> &[Scalar] {
        self.positions.as_slice()
    }

    /// Number of ions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false; a state holds at least one position.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    fn as_vector(&self) -> &RVec {
        &self.positions
    }
}

/// Gradient ∂U/∂xᵢ of the total potential energy in newtons.
pub fn energy_gradient<P: AxialPotential + ?Sized>(
    potential: &P,
    charges: &RVec,
    positions: &RVec,
) -> Result<RVec, PotentialError> {
    let k = coulomb_constant();
    let n = positions.len();
    let mut g = RVec::zeros(n);
    for i in 0..n {
        let mut gi = charges[i] * potential.derivative(positions[i])?;
        for j in 0..n {
            if j == i {
                continue;
            }
            let d = positions[i] - positions[j];
            gi -= k * charges[i] * charges[j] * d.signum() / (d * d);
        }
        g[i] = gi;
    }
    Ok(g)
}

/// Hessian ∂²U/∂xᵢ∂xⱼ of the total potential energy.
///
/// Doubles as the Newton Jacobian of [`energy_gradient`] and as the input
/// to the normal-mode eigenproblem.
pub fn energy_hessian<P: AxialPotential + ?Sized>(
    potential: &P,
    charges: &RVec,
    positions: &RVec,
) -> Result<RMat, PotentialError> {
    let k = coulomb_constant();
    let n = positions.len();
    let mut h = RMat::zeros(n, n);
    for i in 0..n {
        let mut hii = charges[i] * potential.second_derivative(positions[i])?;
        for j in 0..n {
            if j == i {
                continue;
            }
            let d = (positions[i] - positions[j]).abs();
            let coupling = 2.0 * k * charges[i] * charges[j] / (d * d * d);
            hii += coupling;
            h[(i, j)] = -coupling;
        }
        h[(i, i)] = hii;
    }
    Ok(h)
}

/// Location minimizing the confinement energy `charge·V(x)`.
///
/// Finite domains are grid-scanned and the best knot polished by Newton on
/// the derivative; unbounded (closed-form) potentials start the polish from
/// the origin.
pub fn confinement_minimum<P: AxialPotential + ?Sized>(
    potential: &P,
    charge: Scalar,
) -> Result<Scalar, SolveError> {
    let (lo, hi) = potential.domain();
    let mut best = if lo.is_finite() && hi.is_finite() {
        let xs = linspace(lo, hi, 513);
        let mut best_x = xs[0];
        let mut best_u = Scalar::INFINITY;
        for &x in &xs {
            // linspace endpoints can overshoot by an ulp; stay inside.
            let x = x.clamp(lo, hi);
            let u = charge * potential.evaluate(x)?;
            if u < best_u {
                best_u = u;
                best_x = x;
            }
        }
        best_x
    } else {
        0.0
    };

    for _ in 0..16 {
        let d1 = charge * potential.derivative(best)?;
        let d2 = charge * potential.second_derivative(best)?;
        if d2 <= 0.0 {
            break;
        }
        let next = best - d1 / d2;
        if next < lo || next > hi {
            break;
        }
        let done = (next - best).abs() <= Scalar::EPSILON * next.abs();
        best = next;
        if done {
            break;
        }
    }
    Ok(best)
}

/// Evenly spaced starting positions about the confinement minimum.
///
/// The spacing is the harmonic-approximation length `(2k·q̄²/κ)^{1/3}` with
/// `κ = q̄·V''` at the minimum; when the curvature is not confining, a fixed
/// fraction of a finite domain is used instead, and an unbounded
/// anti-confining well cannot be seeded at all.
pub fn initial_guess<P: AxialPotential + ?Sized>(
    potential: &P,
    chain: &IonChain,
) -> Result<Vec<Scalar>, SolveError> {
    let n = chain.len();
    let sign = chain.ions()[0].charge_c.signum();
    let q = chain.mean_abs_charge();
    let center = confinement_minimum(potential, sign * q)?;
    let curvature = sign * q * potential.second_derivative(center)?;
    let (lo, hi) = potential.domain();

    let mut spacing = if curvature > 0.0 {
        (2.0 * coulomb_constant() * q * q / curvature).cbrt()
    } else if lo.is_finite() && hi.is_finite() {
        (hi - lo) / (4.0 * n as Scalar)
    } else {
        return Err(SolveError::Diverged {
            iterations: 0,
            gradient_norm: Scalar::INFINITY,
        });
    };

    if n > 1 && lo.is_finite() && hi.is_finite() {
        let max_extent = 0.8 * (hi - lo);
        if spacing * (n - 1) as Scalar > max_extent {
            spacing = max_extent / (n - 1) as Scalar;
        }
    }

    let offset = 0.5 * (n - 1) as Scalar;
    let mut guess: Vec<Scalar> = (0..n)
        .map(|i| center + spacing * (i as Scalar - offset))
        .collect();

    // Shift a guess that spills over a finite domain edge back inside.
    if lo.is_finite() && hi.is_finite() {
        let margin = 0.01 * (hi - lo);
        let low_excess = (lo + margin) - guess[0];
        if low_excess > 0.0 {
            guess.iter_mut().for_each(|x| *x += low_excess);
        }
        let high_excess = guess[n - 1] - (hi - margin);
        if high_excess > 0.0 {
            guess.iter_mut().for_each(|x| *x -= high_excess);
        }
    }
    Ok(guess)
}

/// Finds the chain equilibrium starting from the automatic initial guess.
pub fn solve_equilibrium<P: AxialPotential + ?Sized>(
    potential: &P,
    chain: &IonChain,
    criteria: &ConvergenceCriteria,
) -> Result<EquilibriumState, SolveError> {
    let guess = initial_guess(potential, chain)?;
    solve_equilibrium_from(potential, chain, &guess, criteria)
}

/// Finds the chain equilibrium starting from caller-supplied positions.
///
/// # Panics
/// Panics if the guess length does not match the chain or the guess is not
/// strictly increasing.
pub fn solve_equilibrium_from<P: AxialPotential + ?Sized>(
    potential: &P,
    chain: &IonChain,
    initial: &[Scalar],
    criteria: &ConvergenceCriteria,
) -> Result<EquilibriumState, SolveError> {
    assert_eq!(initial.len(), chain.len(), "guess length must match chain");
    assert!(
        strictly_increasing(initial),
        "initial positions must be strictly increasing"
    );

    let charges = chain.charges();
    let mut x = RVec::from_column_slice(initial);
    for &xi in x.iter() {
        potential.check_domain(xi)?;
    }
    check_separations(&x, criteria.min_separation)?;

    let mut gradient = energy_gradient(potential, &charges, &x)?;
    let initial_norm = max_norm(&gradient);
    if initial_norm == 0.0 {
        return Ok(EquilibriumState { positions: x });
    }

    for iteration in 0..criteria.max_iterations {
        let jacobian = energy_hessian(potential, &charges, &x)?;
        let rhs = gradient.scale(-1.0);
        let step = jacobian.lu().solve(&rhs).ok_or(SolveError::Diverged {
            iterations: iteration,
            gradient_norm: max_norm(&gradient),
        })?;

        let t = ordering_step_limit(&x, &step);
        let x_next = &x + &step * t;
        for &xi in x_next.iter() {
            potential.check_domain(xi)?;
        }
        check_separations(&x_next, criteria.min_separation)?;

        let step_norm = t * max_norm(&step);
        x = x_next;
        gradient = energy_gradient(potential, &charges, &x)?;

        if criteria.is_converged(max_norm(&gradient), initial_norm, step_norm, max_norm(&x)) {
            return Ok(EquilibriumState { positions: x });
        }
    }

    Err(SolveError::Diverged {
        iterations: criteria.max_iterations,
        gradient_norm: max_norm(&gradient),
    })
}

/// Symmetric fast path for two identical ions.
///
/// Assumes the confinement is reflection-symmetric about its minimum and
/// solves the scalar force balance on the half-separation by bracketing and
/// bisection. The general Newton solver remains the reference; this path
/// rejects any chain that is not two identical ions.
///
/// # Panics
/// Panics unless the chain holds exactly two identical ions.
pub fn solve_symmetric_pair<P: AxialPotential + ?Sized>(
    potential: &P,
    chain: &IonChain,
    criteria: &ConvergenceCriteria,
) -> Result<EquilibriumState, SolveError> {
    assert!(
        chain.len() == 2 && chain.is_uniform(),
        "symmetric path requires two identical ions"
    );
    let ion = chain.ions()[0];
    let q = ion.charge_c;
    let k = coulomb_constant();
    let center = confinement_minimum(potential, q)?;
    let curvature = q * potential.second_derivative(center)?;
    if curvature <= 0.0 {
        return Err(SolveError::Diverged {
            iterations: 0,
            gradient_norm: Scalar::INFINITY,
        });
    }

    // Residual axial force on the ion at center + d; the partner at
    // center - d mirrors it by symmetry.
    let force = |d: Scalar| -> Result<Scalar, SolveError> {
        Ok(q * potential.derivative(center + d)? - k * q * q / (4.0 * d * d))
    };

    let scale = (2.0 * k * q * q / curvature).cbrt();
    let mut a = 0.25 * scale;
    let mut ga = force(a)?;
    let mut shrink = 0;
    while ga > 0.0 && shrink < 64 {
        a *= 0.5;
        ga = force(a)?;
        shrink += 1;
    }

    let step = 0.25 * scale;
    let mut b = a + step;
    let mut gb = force(b)?;
    let mut expand = 0;
    while ga * gb > 0.0 {
        expand += 1;
        if expand > criteria.max_iterations {
            return Err(SolveError::Diverged {
                iterations: expand,
                gradient_norm: gb.abs(),
            });
        }
        a = b;
        ga = gb;
        b += step;
        gb = force(b)?;
    }

    for _ in 0..criteria.max_iterations {
        let mid = 0.5 * (a + b);
        let gm = force(mid)?;
        if gm == 0.0 || (b - a) < criteria.step_tolerance * mid {
            let positions = RVec::from_vec(vec![center - mid, center + mid]);
            check_separations(&positions, criteria.min_separation)?;
            return Ok(EquilibriumState { positions });
        }
        if ga * gm < 0.0 {
            b = mid;
        } else {
            a = mid;
            ga = gm;
        }
    }
    Err(SolveError::Diverged {
        iterations: criteria.max_iterations,
        gradient_norm: ga.abs(),
    })
}

/// Largest fraction of a Newton step that keeps every adjacent gap above
/// 10% of its current size; a crossing is an infinite-energy singularity
/// and must never be produced.
fn ordering_step_limit(x: &RVec, step: &RVec) -> Scalar {
    let mut t: Scalar = 1.0;
    for i in 0..x.len().saturating_sub(1) {
        let gap = x[i + 1] - x[i];
        let shrinkage = step[i] - step[i + 1];
        if shrinkage > 0.0 {
            t = t.min(0.9 * gap / shrinkage);
        }
    }
    t
}

fn check_separations(x: &RVec, min_separation: Scalar) -> Result<(), SolveError> {
    for i in 0..x.len().saturating_sub(1) {
        let gap = x[i + 1] - x[i];
        if gap <= min_separation {
            return Err(SolveError::Collision {
                separation: gap,
                min_separation,
            });
        }
    }
    Ok(())
}

pub(crate) fn state_vector(state: &EquilibriumState) -> &RVec {
    state.as_vector()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;

    use super::*;
    use crate::chain::{Ion, IonChain};
    use crate::constants::angular_frequency;
    use crate::potential::{
        AxialSample, HarmonicPotential, InterpolatedPotential, VoltageConfiguration,
    };

    fn mhz_trap(ion: Ion, hz: Scalar) -> HarmonicPotential {
        let omega = angular_frequency(hz);
        HarmonicPotential::new(0.0, ion.mass_kg * omega * omega / ion.charge_c)
    }

    /// Equilibrium half-spacing scale l = (k q^2 / kappa)^{1/3}.
    fn length_scale(ion: Ion, well: &HarmonicPotential) -> Scalar {
        let kappa = ion.charge_c * well.curvature;
        (coulomb_constant() * ion.charge_c * ion.charge_c / kappa).cbrt()
    }

    #[test]
    fn two_ion_separation_matches_closed_form() {
        let ion = Ion::singly_ionized(40.078);
        let well = mhz_trap(ion, 1.0e6);
        let chain = IonChain::uniform(2, ion);

        let state =
            solve_equilibrium(&well, &chain, &ConvergenceCriteria::default()).unwrap();
        let l = length_scale(ion, &well);
        let expected_half = 0.5 * 2.0_f64.cbrt() * l;
        assert_relative_eq!(state.positions()[0], -expected_half, max_relative = 1e-9);
        assert_relative_eq!(state.positions()[1], expected_half, max_relative = 1e-9);
    }

    #[test]
    fn three_ion_positions_match_closed_form() {
        let ion = Ion::singly_ionized(40.078);
        let well = mhz_trap(ion, 1.0e6);
        let chain = IonChain::uniform(3, ion);

        let state =
            solve_equilibrium(&well, &chain, &ConvergenceCriteria::default()).unwrap();
        let l = length_scale(ion, &well);
        let expected_outer = (5.0_f64 / 4.0).cbrt() * l;
        assert_relative_eq!(state.positions()[0], -expected_outer, max_relative = 1e-9);
        assert!(state.positions()[1].abs() < 1e-12 * expected_outer.abs() + 1e-18);
        assert_relative_eq!(state.positions()[2], expected_outer, max_relative = 1e-9);
    }

    #[test]
    fn converged_state_has_small_gradient() {
        let ion = Ion::singly_ionized(40.078);
        let well = mhz_trap(ion, 0.7e6);
        let chain = IonChain::uniform(4, ion);

        let state =
            solve_equilibrium(&well, &chain, &ConvergenceCriteria::default()).unwrap();
        let gradient =
            energy_gradient(&well, &chain.charges(), state_vector(&state)).unwrap();
        // Compare against the characteristic confinement force on the
        // outermost ion.
        let reference = (ion.charge_c * well.curvature * state.positions()[3]).abs();
        assert!(max_norm(&gradient) < 1e-9 * reference);
    }

    #[test]
    fn interpolated_well_reproduces_analytic_equilibrium() {
        let ion = Ion::singly_ionized(40.078);
        let well = mhz_trap(ion, 1.0e6);
        let chain = IonChain::uniform(2, ion);

        let positions = linspace(-60.0e-6, 60.0e-6, 241);
        let values: Vec<Scalar> = positions
            .iter()
            .map(|x| 0.5 * well.curvature * x * x)
            .collect();
        let mut electrodes = BTreeMap::new();
        electrodes.insert("DC1".to_string(), values);
        let sample = AxialSample::new(positions, electrodes).unwrap();
        let config = VoltageConfiguration::new().with("DC1", 1.0);
        let numeric = InterpolatedPotential::build(&sample, &config).unwrap();

        let criteria = ConvergenceCriteria::default();
        let from_numeric = solve_equilibrium(&numeric, &chain, &criteria).unwrap();
        let from_analytic = solve_equilibrium(&well, &chain, &criteria).unwrap();
        for (a, b) in from_numeric
            .positions()
            .iter()
            .zip(from_analytic.positions())
        {
            assert_relative_eq!(*a, *b, max_relative = 1e-5);
        }
    }

    #[test]
    fn symmetric_pair_agrees_with_general_solver() {
        let ion = Ion::singly_ionized(40.078);
        let well = mhz_trap(ion, 1.2e6);
        let chain = IonChain::uniform(2, ion);
        let criteria = ConvergenceCriteria::default();

        let general = solve_equilibrium(&well, &chain, &criteria).unwrap();
        let symmetric = solve_symmetric_pair(&well, &chain, &criteria).unwrap();
        for (a, b) in general.positions().iter().zip(symmetric.positions()) {
            assert_relative_eq!(*a, *b, max_relative = 1e-8);
        }
    }

    #[test]
    fn sub_minimum_separation_is_a_collision() {
        let ion = Ion::singly_ionized(40.078);
        let well = mhz_trap(ion, 1.0e6);
        let chain = IonChain::uniform(2, ion);

        // Equilibrium spacing is a few micrometers; demand ten times more.
        let criteria = ConvergenceCriteria {
            min_separation: 50.0e-6,
            ..ConvergenceCriteria::default()
        };
        let err = solve_equilibrium(&well, &chain, &criteria).unwrap_err();
        assert!(matches!(err, SolveError::Collision { .. }));
    }

    #[test]
    fn iterate_escaping_the_samples_is_out_of_domain() {
        let ion = Ion::singly_ionized(40.078);
        // Confinement so weak the pair wants ~20 um separation, sampled
        // only over +-2 um.
        let curvature = 3.6e5;
        let positions = linspace(-2.0e-6, 2.0e-6, 81);
        let values: Vec<Scalar> = positions.iter().map(|x| 0.5 * curvature * x * x).collect();
        let mut electrodes = BTreeMap::new();
        electrodes.insert("DC1".to_string(), values);
        let sample = AxialSample::new(positions, electrodes).unwrap();
        let config = VoltageConfiguration::new().with("DC1", 1.0);
        let pot = InterpolatedPotential::build(&sample, &config).unwrap();

        let chain = IonChain::uniform(2, ion);
        let err = solve_equilibrium(&pot, &chain, &ConvergenceCriteria::default()).unwrap_err();
        assert!(matches!(err, SolveError::OutOfDomain(_)));
    }

    #[test]
    fn iteration_cap_reports_divergence() {
        let ion = Ion::singly_ionized(40.078);
        let well = mhz_trap(ion, 1.0e6);
        let chain = IonChain::uniform(2, ion);

        let criteria = ConvergenceCriteria {
            max_iterations: 2,
            gradient_tolerance: 0.0,
            absolute_tolerance: 0.0,
            step_tolerance: 0.0,
            ..ConvergenceCriteria::default()
        };
        // A guess far from equilibrium cannot satisfy zero tolerances in
        // two iterations.
        let guess = [-40.0e-6, 40.0e-6];
        let err =
            solve_equilibrium_from(&well, &chain, &guess, &criteria).unwrap_err();
        assert!(matches!(err, SolveError::Diverged { iterations: 2, .. }));
    }

    #[test]
    fn single_ion_settles_at_the_well_center() {
        let ion = Ion::singly_ionized(9.012);
        let well = HarmonicPotential::new(12.0e-6, 2.0e7);
        let chain = IonChain::uniform(1, ion);

        let state =
            solve_equilibrium(&well, &chain, &ConvergenceCriteria::default()).unwrap();
        assert_relative_eq!(state.positions()[0], 12.0e-6, max_relative = 1e-9);
    }

    #[test]
    fn imported_positions_must_be_ordered() {
        assert!(EquilibriumState::from_positions(vec![0.0, -1.0e-6]).is_err());
        assert!(EquilibriumState::from_positions(vec![-1.0e-6, 1.0e-6]).is_ok());
    }
}
