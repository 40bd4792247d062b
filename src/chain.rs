//! Ion species and chain definitions.

use crate::constants::{ATOMIC_MASS, ELEMENTARY_CHARGE};
use crate::math::{RVec, Scalar};

/// A single trapped point charge.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Ion {
    /// Charge in coulombs.
    pub charge_c: Scalar,
    /// Mass in kilograms.
    pub mass_kg: Scalar,
}

impl Ion {
    /// Creates an ion from charge and mass.
    ///
    /// # Panics
    /// Panics if the mass is not positive or the charge is zero.
    #[must_use]
    pub fn new(charge_c: Scalar, mass_kg: Scalar) -> Self {
        assert!(mass_kg > 0.0, "ion mass must be positive");
        assert!(charge_c != 0.0, "ion charge must be nonzero");
        Self { charge_c, mass_kg }
    }

    /// Singly ionized atom of the given mass in atomic mass units,
    /// e.g. `Ion::singly_ionized(40.078)` for ⁴⁰Ca⁺.
    #[must_use]
    pub fn singly_ionized(mass_u: Scalar) -> Self {
        Self::new(ELEMENTARY_CHARGE, mass_u * ATOMIC_MASS)
    }
}

/// Ordered chain of trapped ions.
///
/// The order fixes indexing only; the solver assigns positions in ascending
/// order along the axis. All charges must share a sign so the mutual Coulomb
/// interaction is repulsive and the chain cannot collapse.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IonChain {
    ions: Vec<Ion>,
}

impl IonChain {
    /// Creates a chain from explicit ions.
    ///
    /// # Panics
    /// Panics if the chain is empty or the charges do not all share a sign.
    #[must_use]
    pub fn new(ions: Vec<Ion>) -> Self {
        assert!(!ions.is_empty(), "chain must hold at least one ion");
        let sign = ions[0].charge_c.signum();
        assert!(
            ions.iter().all(|ion| ion.charge_c.signum() == sign),
            "all charges in a chain must share a sign"
        );
        Self { ions }
    }

    /// Chain of `n` identical ions.
    #[must_use]
    pub fn uniform(n: usize, ion: Ion) -> Self {
        Self::new(vec![ion; n])
    }

    /// Number of ions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ions.len()
    }

    /// Always false; construction rejects empty chains.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The ions in index order.
    #[must_use]
    pub fn ions(&self) -> &[Ion] {
        &self.ions
    }

    /// Charges in coulombs as a vector.
    #[must_use]
    pub fn charges(&self) -> RVec {
        RVec::from_iterator(self.ions.len(), self.ions.iter().map(|i| i.charge_c))
    }

    /// Masses in kilograms as a vector.
    #[must_use]
    pub fn masses(&self) -> RVec {
        RVec::from_iterator(self.ions.len(), self.ions.iter().map(|i| i.mass_kg))
    }

    /// Mean absolute charge, used to seed initial spacings.
    #[must_use]
    pub fn mean_abs_charge(&self) -> Scalar {
        self.ions.iter().map(|i| i.charge_c.abs()).sum::<Scalar>() / self.ions.len() as Scalar
    }

    /// True if every ion is identical to the first.
    #[must_use]
    pub fn is_uniform(&self) -> bool {
        self.ions.iter().all(|ion| *ion == self.ions[0])
    }
}
