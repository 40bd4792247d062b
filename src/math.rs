//! Shared numerical primitives anchored on `nalgebra`.

use nalgebra::{DMatrix, DVector};

/// Primary scalar type used across the crate.
pub type Scalar = f64;
/// Dynamically sized real vector.
pub type RVec = DVector<Scalar>;
/// Dynamically sized real matrix.
pub type RMat = DMatrix<Scalar>;

/// Generates `n` linearly spaced samples in [start, stop].
#[must_use]
pub fn linspace(start: Scalar, stop: Scalar, n: usize) -> Vec<Scalar> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (stop - start) / (n as Scalar - 1.0);
            (0..n).map(|i| start + step * i as Scalar).collect()
        }
    }
}

/// Max-norm (largest absolute component) of a vector.
#[must_use]
pub fn max_norm(v: &RVec) -> Scalar {
    v.iter().fold(0.0, |acc, x| acc.max(x.abs()))
}

/// True if `values` is strictly increasing.
#[must_use]
pub fn strictly_increasing(values: &[Scalar]) -> bool {
    values.windows(2).all(|w| w[0] < w[1])
}
