//! Ramp the endcap voltage scale and print the two-ion spectrum per point.

use std::collections::BTreeMap;

use trap_modes::prelude::*;

fn main() -> Result<(), TrapModesError> {
    let ion = Ion::singly_ionized(40.078);
    let chain = IonChain::uniform(2, ion);

    let omega = angular_frequency(0.5e6);
    let curvature = ion.mass_kg * omega * omega / ion.charge_c;

    let positions = linspace(-80.0e-6, 80.0e-6, 321);
    let values: Vec<Scalar> = positions
        .iter()
        .map(|x| 0.5 * curvature * x * x)
        .collect();
    let mut electrodes = BTreeMap::new();
    electrodes.insert("DC1".to_string(), values);
    let sample = AxialSample::new(positions, electrodes)?;
    let base = VoltageConfiguration::new().with("DC1", 1.0);

    let scales = linspace(1.0, 5.0, 9);
    let results = sweep_voltage_scale(
        &sample,
        &base,
        &chain,
        scales.iter().copied(),
        &ConvergenceCriteria::default(),
        &ModeCriteria::default(),
    );

    println!("scale    com (kHz)   breathing (kHz)");
    for (scale, outcome) in scales.iter().zip(results) {
        match outcome {
            Ok(point) => {
                let hz = point.modes.frequencies_hz();
                println!("{scale:5.2}  {:10.2}  {:14.2}", hz[0] / 1e3, hz[1] / 1e3);
            }
            Err(err) => println!("{scale:5.2}  failed: {err}"),
        }
    }

    Ok(())
}
