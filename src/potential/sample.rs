//! Validated per-electrode field samples and voltage configurations.

use std::collections::BTreeMap;

use crate::math::Scalar;

/// Errors raised while validating axial sample data.
#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    /// No positions or no electrodes were supplied.
    #[error("axial sample is empty")]
    Empty,
    /// An electrode array does not match the coordinate array length.
    #[error("electrode {label:?} has {found} samples, expected {expected}")]
    LengthMismatch {
        /// Offending electrode label.
        label: String,
        /// Number of samples supplied for the electrode.
        found: usize,
        /// Number of axial coordinates.
        expected: usize,
    },
    /// Positions are not strictly increasing (duplicates included).
    #[error("axial positions must be strictly increasing")]
    NonMonotonic,
}

/// Immutable per-electrode unit-voltage samples along the trap axis.
///
/// Each electrode's array holds the potential that electrode produces at
/// 1 V applied, aligned index-for-index with `positions`. Any voltage
/// configuration's potential follows by linear superposition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AxialSample {
    positions: Vec<Scalar>,
    electrodes: BTreeMap<String, Vec<Scalar>>,
}

impl AxialSample {
    /// Validates and wraps raw sample data.
    ///
    /// Positions must be strictly increasing and every electrode array must
    /// match them in length; at least two positions and one electrode are
    /// required.
    pub fn new(
        positions: Vec<Scalar>,
        electrodes: BTreeMap<String, Vec<Scalar>>,
    ) -> Result<Self, SampleError> {
        if positions.len() < 2 || electrodes.is_empty() {
            return Err(SampleError::Empty);
        }
        if !crate::math::strictly_increasing(&positions) {
            return Err(SampleError::NonMonotonic);
        }
        for (label, values) in &electrodes {
            if values.len() != positions.len() {
                return Err(SampleError::LengthMismatch {
                    label: label.clone(),
                    found: values.len(),
                    expected: positions.len(),
                });
            }
        }
        Ok(Self { positions, electrodes })
    }

    /// Axial coordinates in meters.
    #[must_use]
    pub fn positions(&self) -> &[Scalar] {
        &self.positions
    }

    /// Unit-voltage samples for one electrode, if present.
    #[must_use]
    pub fn electrode(&self, label: &str) -> Option<&[Scalar]> {
        self.electrodes.get(label).map(Vec::as_slice)
    }

    /// True if the sample set contains the electrode.
    #[must_use]
    pub fn has_electrode(&self, label: &str) -> bool {
        self.electrodes.contains_key(label)
    }

    /// Iterator over electrode labels in sorted order.
    pub fn electrode_labels(&self) -> impl Iterator<Item = &str> {
        self.electrodes.keys().map(String::as_str)
    }

    /// Sampled axial range as (min, max).
    #[must_use]
    pub fn domain(&self) -> (Scalar, Scalar) {
        (self.positions[0], self.positions[self.positions.len() - 1])
    }

    /// Number of axial sample points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// Always false; construction rejects empty data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Applied voltage per electrode label. Electrodes absent from the map are
/// held at 0 V and contribute nothing to the combined potential.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VoltageConfiguration {
    voltages: BTreeMap<String, Scalar>,
}

impl VoltageConfiguration {
    /// Creates an empty configuration (all electrodes grounded).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one electrode's voltage, returning `self` for chaining.
    #[must_use]
    pub fn with(mut self, label: impl Into<String>, volts: Scalar) -> Self {
        self.voltages.insert(label.into(), volts);
        self
    }

    /// Sets one electrode's voltage in place.
    pub fn set(&mut self, label: impl Into<String>, volts: Scalar) {
        self.voltages.insert(label.into(), volts);
    }

    /// The applied voltage for a label, 0 V when unspecified.
    #[must_use]
    pub fn voltage(&self, label: &str) -> Scalar {
        self.voltages.get(label).copied().unwrap_or(0.0)
    }

    /// Iterator over entries with nonzero voltage.
    pub fn nonzero(&self) -> impl Iterator<Item = (&str, Scalar)> {
        self.voltages
            .iter()
            .filter(|(_, v)| **v != 0.0)
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns a copy with every voltage multiplied by `scale`.
    #[must_use]
    pub fn scaled(&self, scale: Scalar) -> Self {
        Self {
            voltages: self
                .voltages
                .iter()
                .map(|(k, v)| (k.clone(), v * scale))
                .collect(),
        }
    }
}

impl FromIterator<(String, Scalar)> for VoltageConfiguration {
    fn from_iter<I: IntoIterator<Item = (String, Scalar)>>(iter: I) -> Self {
        Self {
            voltages: iter.into_iter().collect(),
        }
    }
}
