//! Voltage-scale sweep helpers.
//!
//! Scanning a DC configuration while watching the mode spectrum is the
//! everyday use of the solver: the electrode pattern stays fixed and an
//! overall scale factor (or a single electrode) is ramped. Each scan point
//! is an independent pure solve, so failures at individual points are
//! reported per point instead of aborting the scan.

use crate::chain::IonChain;
use crate::equilibrium::ConvergenceCriteria;
use crate::errors::TrapModesError;
use crate::modes::{solve_chain_modes, ChainModes, ModeCriteria};
use crate::potential::{AxialSample, InterpolatedPotential, VoltageConfiguration};
use crate::math::Scalar;

/// Applies `f` to each scan value and collects results.
#[must_use]
pub fn sweep_map<I, F, T>(values: I, mut f: F) -> Vec<T>
where
    I: IntoIterator<Item = Scalar>,
    F: FnMut(Scalar) -> T,
{
    values.into_iter().map(|v| f(v)).collect()
}

/// Solves the chain spectrum for each overall voltage scale factor.
///
/// The potential is rebuilt per point from `base` scaled by the factor;
/// each entry of the returned vector is that point's outcome.
pub fn sweep_voltage_scale<I>(
    sample: &AxialSample,
    base: &VoltageConfiguration,
    chain: &IonChain,
    scales: I,
    convergence: &ConvergenceCriteria,
    criteria: &ModeCriteria,
) -> Vec<Result<ChainModes, TrapModesError>>
where
    I: IntoIterator<Item = Scalar>,
{
    sweep_map(scales, |scale| {
        let potential = InterpolatedPotential::build(sample, &base.scaled(scale))?;
        solve_chain_modes(&potential, chain, convergence, criteria)
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::chain::Ion;
    use crate::constants::angular_frequency;
    use crate::math::linspace;

    #[test]
    fn sweep_map_runs_function() {
        let out = sweep_map(vec![1.0, 2.0, 3.0], |v| v * 2.0);
        assert_eq!(out, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn stiffer_wells_raise_every_mode() {
        let ion = Ion::singly_ionized(40.078);
        let omega = angular_frequency(1.0e6);
        let curvature = ion.mass_kg * omega * omega / ion.charge_c;

        let positions = linspace(-60.0e-6, 60.0e-6, 241);
        let values: Vec<f64> = positions
            .iter()
            .map(|x| 0.5 * curvature * x * x)
            .collect();
        let mut electrodes = BTreeMap::new();
        electrodes.insert("DC1".to_string(), values);
        let sample = AxialSample::new(positions, electrodes).unwrap();
        let base = VoltageConfiguration::new().with("DC1", 1.0);
        let chain = IonChain::uniform(2, ion);

        let results = sweep_voltage_scale(
            &sample,
            &base,
            &chain,
            vec![1.0, 2.0, 4.0],
            &ConvergenceCriteria::default(),
            &ModeCriteria::default(),
        );

        let spectra: Vec<Vec<f64>> = results
            .into_iter()
            .map(|r| r.unwrap().modes.angular_frequencies().to_vec())
            .collect();
        for pair in spectra.windows(2) {
            for (lo, hi) in pair[0].iter().zip(&pair[1]) {
                assert!(hi > lo, "scaling up the well must raise each mode");
            }
        }
    }
}
