//! Continuous axial potential models with first and second derivatives.

use std::collections::BTreeMap;

use crate::math::Scalar;

use super::sample::{AxialSample, VoltageConfiguration};
use super::spline::CubicSpline;

/// Errors raised while building or evaluating an axial potential.
#[derive(Debug, thiserror::Error)]
pub enum PotentialError {
    /// Evaluation outside the sampled axial range; extrapolated potentials
    /// are physically meaningless and never produced.
    #[error("position {x:.6e} m outside sampled range [{min:.6e}, {max:.6e}] m")]
    OutOfDomain {
        /// Requested position.
        x: Scalar,
        /// Lower end of the sampled range.
        min: Scalar,
        /// Upper end of the sampled range.
        max: Scalar,
    },
    /// A voltage configuration references an electrode the sample set does
    /// not contain.
    #[error("voltage configuration references unknown electrode {0:?}")]
    UnknownElectrode(String),
}

/// A smooth scalar potential of axial position with analytic derivatives.
///
/// Two variants exist: numeric interpolation over arbitrary electrode
/// geometry ([`InterpolatedPotential`]) and closed-form wells
/// ([`HarmonicPotential`]). Callers select the implementation explicitly;
/// both must agree in the overlap region to within solver tolerance.
pub trait AxialPotential {
    /// Valid evaluation range as (min, max). Closed-form potentials report
    /// an infinite range.
    fn domain(&self) -> (Scalar, Scalar);

    /// Potential V(x) in volts.
    fn evaluate(&self, x: Scalar) -> Result<Scalar, PotentialError>;

    /// First derivative V'(x) in V/m.
    fn derivative(&self, x: Scalar) -> Result<Scalar, PotentialError>;

    /// Second derivative V''(x) in V/m².
    fn second_derivative(&self, x: Scalar) -> Result<Scalar, PotentialError>;

    /// Checks `x` against [`AxialPotential::domain`].
    fn check_domain(&self, x: Scalar) -> Result<(), PotentialError> {
        let (min, max) = self.domain();
        if x < min || x > max {
            Err(PotentialError::OutOfDomain { x, min, max })
        } else {
            Ok(())
        }
    }
}

/// Voltage-weighted sum of per-electrode cubic splines.
///
/// One spline is fitted per electrode carrying a nonzero voltage, so
/// construction cost scales with the active electrode count rather than the
/// full electrode set. Derivatives come from the spline polynomials, never
/// from finite differences of the combined sum.
#[derive(Debug, Clone)]
pub struct InterpolatedPotential {
    /// Applied voltage and unit-voltage interpolant per active electrode.
    terms: BTreeMap<String, (Scalar, CubicSpline)>,
    domain: (Scalar, Scalar),
}

impl InterpolatedPotential {
    /// Fits per-electrode interpolants for every nonzero entry of `config`.
    ///
    /// Fails with [`PotentialError::UnknownElectrode`] if the configuration
    /// references a label absent from `sample`.
    pub fn build(
        sample: &AxialSample,
        config: &VoltageConfiguration,
    ) -> Result<Self, PotentialError> {
        let mut terms = BTreeMap::new();
        for (label, volts) in config.nonzero() {
            let values = sample
                .electrode(label)
                .ok_or_else(|| PotentialError::UnknownElectrode(label.to_string()))?;
            let spline = CubicSpline::new(sample.positions().to_vec(), values.to_vec());
            terms.insert(label.to_string(), (volts, spline));
        }
        Ok(Self {
            terms,
            domain: sample.domain(),
        })
    }

    /// Number of electrodes contributing to the sum.
    #[must_use]
    pub fn active_electrodes(&self) -> usize {
        self.terms.len()
    }
}

impl AxialPotential for InterpolatedPotential {
    fn domain(&self) -> (Scalar, Scalar) {
        self.domain
    }

    fn evaluate(&self, x: Scalar) -> Result<Scalar, PotentialError> {
        self.check_domain(x)?;
        Ok(self
            .terms
            .values()
            .map(|(volts, spline)| volts * spline.value(x))
            .sum())
    }

    fn derivative(&self, x: Scalar) -> Result<Scalar, PotentialError> {
        self.check_domain(x)?;
        Ok(self
            .terms
            .values()
            .map(|(volts, spline)| volts * spline.derivative(x))
            .sum())
    }

    fn second_derivative(&self, x: Scalar) -> Result<Scalar, PotentialError> {
        self.check_domain(x)?;
        Ok(self
            .terms
            .values()
            .map(|(volts, spline)| volts * spline.second_derivative(x))
            .sum())
    }
}

/// Ideal quadratic well V(x) = ½·c·(x − center)² in closed form.
///
/// `curvature` is c in V/m²; a single ion of charge q and mass m oscillates
/// at ω = √(q·c/m). Negative curvature models an anti-confining saddle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HarmonicPotential {
    /// Well center in meters.
    pub center: Scalar,
    /// Curvature c in V/m².
    pub curvature: Scalar,
}

impl HarmonicPotential {
    /// Creates a quadratic well centered at `center` with curvature `c`.
    #[must_use]
    pub const fn new(center: Scalar, curvature: Scalar) -> Self {
        Self { center, curvature }
    }
}

impl AxialPotential for HarmonicPotential {
    fn domain(&self) -> (Scalar, Scalar) {
        (Scalar::NEG_INFINITY, Scalar::INFINITY)
    }

    fn evaluate(&self, x: Scalar) -> Result<Scalar, PotentialError> {
        let d = x - self.center;
        Ok(0.5 * self.curvature * d * d)
    }

    fn derivative(&self, x: Scalar) -> Result<Scalar, PotentialError> {
        Ok(self.curvature * (x - self.center))
    }

    fn second_derivative(&self, _x: Scalar) -> Result<Scalar, PotentialError> {
        Ok(self.curvature)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::math::linspace;

    fn quadratic_sample(curvature: Scalar) -> AxialSample {
        let positions = linspace(-100.0e-6, 100.0e-6, 201);
        let values: Vec<Scalar> = positions.iter().map(|x| 0.5 * curvature * x * x).collect();
        let mut electrodes = BTreeMap::new();
        electrodes.insert("DC1".to_string(), values);
        AxialSample::new(positions, electrodes).unwrap()
    }

    #[test]
    fn unit_voltage_round_trips_sampled_values() {
        let sample = quadratic_sample(2.0e7);
        let config = VoltageConfiguration::new().with("DC1", 1.0);
        let pot = InterpolatedPotential::build(&sample, &config).unwrap();
        for (&x, &v) in sample
            .positions()
            .iter()
            .zip(sample.electrode("DC1").unwrap())
        {
            assert_relative_eq!(pot.evaluate(x).unwrap(), v, epsilon = 1e-12);
        }
    }

    #[test]
    fn combined_potential_is_voltage_weighted_sum() {
        let positions = linspace(-1.0, 1.0, 51);
        let a: Vec<Scalar> = positions.iter().map(|x| x * x).collect();
        let b: Vec<Scalar> = positions.iter().map(|x| x + 2.0).collect();
        let mut electrodes = BTreeMap::new();
        electrodes.insert("DC1".to_string(), a);
        electrodes.insert("DC2".to_string(), b);
        let sample = AxialSample::new(positions, electrodes).unwrap();

        let config = VoltageConfiguration::new().with("DC1", 2.0).with("DC2", -0.5);
        let pot = InterpolatedPotential::build(&sample, &config).unwrap();
        let x = 0.25;
        assert_relative_eq!(
            pot.evaluate(x).unwrap(),
            2.0 * x * x - 0.5 * (x + 2.0),
            epsilon = 1e-6
        );
        assert_eq!(pot.active_electrodes(), 2);
    }

    #[test]
    fn numeric_path_agrees_with_analytic_well() {
        let curvature = 2.0e7;
        let sample = quadratic_sample(curvature);
        let config = VoltageConfiguration::new().with("DC1", 1.0);
        let numeric = InterpolatedPotential::build(&sample, &config).unwrap();
        let analytic = HarmonicPotential::new(0.0, curvature);

        for &x in &[-80.0e-6, -20.0e-6, 0.0, 35.0e-6, 90.0e-6] {
            assert_relative_eq!(
                numeric.evaluate(x).unwrap(),
                analytic.evaluate(x).unwrap(),
                epsilon = 1e-8,
                max_relative = 1e-6,
            );
            assert_relative_eq!(
                numeric.derivative(x).unwrap(),
                analytic.derivative(x).unwrap(),
                epsilon = 1e-3,
                max_relative = 1e-4,
            );
            assert_relative_eq!(
                numeric.second_derivative(x).unwrap(),
                analytic.second_derivative(x).unwrap(),
                max_relative = 1e-3,
            );
        }
    }

    #[test]
    fn evaluation_outside_samples_is_rejected() {
        let sample = quadratic_sample(1.0e7);
        let config = VoltageConfiguration::new().with("DC1", 1.0);
        let pot = InterpolatedPotential::build(&sample, &config).unwrap();
        assert!(matches!(
            pot.evaluate(200.0e-6),
            Err(PotentialError::OutOfDomain { .. })
        ));
        assert!(matches!(
            pot.derivative(-200.0e-6),
            Err(PotentialError::OutOfDomain { .. })
        ));
    }

    #[test]
    fn unknown_electrode_is_rejected() {
        let sample = quadratic_sample(1.0e7);
        let config = VoltageConfiguration::new().with("DC9", 1.0);
        assert!(matches!(
            InterpolatedPotential::build(&sample, &config),
            Err(PotentialError::UnknownElectrode(_))
        ));
    }

    #[test]
    fn zero_voltage_electrodes_are_skipped() {
        let sample = quadratic_sample(1.0e7);
        let config = VoltageConfiguration::new().with("DC1", 0.0);
        let pot = InterpolatedPotential::build(&sample, &config).unwrap();
        assert_eq!(pot.active_electrodes(), 0);
        assert_relative_eq!(pot.evaluate(0.0).unwrap(), 0.0);
    }
}
