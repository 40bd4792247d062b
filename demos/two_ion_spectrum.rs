//! Solve the axial spectrum of a two-ion crystal in a 1 MHz well, once
//! through the closed-form path and once through sampled data.

use std::collections::BTreeMap;

use trap_modes::prelude::*;

fn main() -> Result<(), TrapModesError> {
    let ion = Ion::singly_ionized(40.078); // Ca-40+
    let chain = IonChain::uniform(2, ion);

    let omega = angular_frequency(1.0e6);
    let curvature = ion.mass_kg * omega * omega / ion.charge_c;
    let well = HarmonicPotential::new(0.0, curvature);

    let analytic = solve_chain_modes(
        &well,
        &chain,
        &ConvergenceCriteria::default(),
        &ModeCriteria::default(),
    )?;

    // The same well, but sampled the way a field export would deliver it.
    let positions = linspace(-60.0e-6, 60.0e-6, 241);
    let values: Vec<Scalar> = positions
        .iter()
        .map(|x| 0.5 * curvature * x * x)
        .collect();
    let mut electrodes = BTreeMap::new();
    electrodes.insert("DC1".to_string(), values);
    let sample = AxialSample::new(positions, electrodes)?;
    let config = VoltageConfiguration::new().with("DC1", 1.0);
    let interpolated = InterpolatedPotential::build(&sample, &config)?;

    let numeric = solve_chain_modes(
        &interpolated,
        &chain,
        &ConvergenceCriteria::default(),
        &ModeCriteria::default(),
    )?;

    println!("equilibrium positions (um):");
    for (a, n) in analytic
        .equilibrium
        .positions()
        .iter()
        .zip(numeric.equilibrium.positions())
    {
        println!("  analytic {:+.4}   sampled {:+.4}", a * 1e6, n * 1e6);
    }

    println!("mode frequencies (kHz):");
    for (a, n) in analytic
        .modes
        .frequencies_hz()
        .iter()
        .zip(numeric.modes.frequencies_hz())
    {
        println!("  analytic {:9.3}   sampled {:9.3}", a / 1e3, n / 1e3);
    }

    Ok(())
}
