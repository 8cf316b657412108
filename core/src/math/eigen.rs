//! Hermitian eigendecomposition by power iteration with deflation.
//!
//! Eigenpairs come out in extraction order, largest magnitude first. Each
//! iterate is re-orthogonalized against the vectors already extracted, so a
//! rank-deficient matrix (the single-snapshot covariance is rank one) still
//! yields a full orthonormal basis: once the deflated matrix vanishes on the
//! remaining subspace, the orthogonalized start vector is taken as the
//! eigenvector with a zero eigenvalue.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::math::matrix::MatrixHelper;
use crate::prelude::RadarConfig;

/// `‖A·v‖` below this fraction of `‖A‖_F` counts as the null space.
const NULL_SPACE_RATIO: f64 = 1e-12;
/// Start candidates whose orthogonal remainder is shorter than this are skipped.
const MIN_REMAINDER: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq)]
pub struct EigenPair {
    pub value: f64,
    pub vector: Array1<Complex64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerIteration {
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl PowerIteration {
    pub fn new(tolerance: f64, max_iterations: usize) -> Self {
        Self {
            tolerance,
            max_iterations,
        }
    }

    pub fn from_config(config: &RadarConfig) -> Self {
        Self::new(config.eigen_tolerance, config.eigen_max_iterations)
    }

    /// Extracts one eigenpair per row of `matrix`, dominant first.
    pub fn decompose(&self, matrix: &Array2<Complex64>) -> Vec<EigenPair> {
        let n = matrix.nrows();
        let floor = NULL_SPACE_RATIO * MatrixHelper::frobenius(matrix.view());
        let mut deflated = matrix.clone();
        let mut pairs: Vec<EigenPair> = Vec::with_capacity(n);

        for _ in 0..n {
            let pair = self.dominant(&deflated, &pairs, floor);
            let projector = MatrixHelper::outer(pair.vector.view(), pair.vector.view());
            deflated.scaled_add(Complex64::new(-pair.value, 0.0), &projector);
            pairs.push(pair);
        }

        pairs
    }

    fn dominant(&self, matrix: &Array2<Complex64>, found: &[EigenPair], floor: f64) -> EigenPair {
        let n = matrix.nrows();
        let mut fallback = None;

        for start in start_candidates(n) {
            let Some(start) = orthonormal_remainder(start, found) else {
                continue;
            };
            let mut image = MatrixHelper::multiply(matrix.view(), start.view());
            project_out(&mut image, found);
            if MatrixHelper::norm(image.view()) > floor {
                return self.iterate(matrix, found, start, floor);
            }
            fallback.get_or_insert(start);
        }

        // The deflated matrix vanishes on everything left.
        EigenPair {
            value: 0.0,
            vector: fallback.unwrap_or_else(|| Array1::zeros(n)),
        }
    }

    fn iterate(
        &self,
        matrix: &Array2<Complex64>,
        found: &[EigenPair],
        start: Array1<Complex64>,
        floor: f64,
    ) -> EigenPair {
        let mut vector = start;
        let mut value: Option<f64> = None;

        for _ in 0..self.max_iterations.max(1) {
            let mut next = MatrixHelper::multiply(matrix.view(), vector.view());
            project_out(&mut next, found);
            let estimate = MatrixHelper::inner(vector.view(), next.view()).re;
            let norm = MatrixHelper::norm(next.view());
            let delta = value.map(|previous| (estimate - previous).abs());
            value = Some(estimate);

            if norm <= floor {
                break;
            }
            next.mapv_inplace(|v| v / norm);
            vector = next;

            if delta.map_or(false, |delta| delta < self.tolerance) {
                break;
            }
        }

        EigenPair {
            value: value.unwrap_or(0.0),
            vector,
        }
    }
}

/// Deterministic trial vectors: a ramp, then each canonical basis vector.
fn start_candidates(n: usize) -> impl Iterator<Item = Array1<Complex64>> {
    let ramp = Array1::from_shape_fn(n, |i| Complex64::new(1.0 + i as f64, 0.0));
    let basis = (0..n).map(move |k| {
        let mut unit = Array1::zeros(n);
        unit[k] = Complex64::new(1.0, 0.0);
        unit
    });
    std::iter::once(ramp).chain(basis)
}

/// Removes the components along `found`, twice for numerical stability.
fn project_out(vector: &mut Array1<Complex64>, found: &[EigenPair]) {
    for _ in 0..2 {
        for pair in found {
            let coefficient = MatrixHelper::inner(pair.vector.view(), vector.view());
            vector.scaled_add(-coefficient, &pair.vector);
        }
    }
}

fn orthonormal_remainder(
    mut vector: Array1<Complex64>,
    found: &[EigenPair],
) -> Option<Array1<Complex64>> {
    let length = MatrixHelper::norm(vector.view());
    project_out(&mut vector, found);
    let remainder = MatrixHelper::norm(vector.view());
    if length == 0.0 || remainder < MIN_REMAINDER * length {
        return None;
    }
    vector.mapv_inplace(|v| v / remainder);
    Some(vector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn solver() -> PowerIteration {
        PowerIteration::new(1e-12, 500)
    }

    fn assert_orthonormal(pairs: &[EigenPair]) {
        for (i, lhs) in pairs.iter().enumerate() {
            for (j, rhs) in pairs.iter().enumerate() {
                let dot = MatrixHelper::inner(lhs.vector.view(), rhs.vector.view());
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((dot - c(expected, 0.0)).norm() < 1e-9, "pair {} vs {}", i, j);
            }
        }
    }

    #[test]
    fn real_symmetric_matrix_yields_descending_eigenvalues() {
        let matrix = array![
            [c(2.0, 0.0), c(1.0, 0.0)],
            [c(1.0, 0.0), c(2.0, 0.0)]
        ];
        let pairs = solver().decompose(&matrix);
        assert_eq!(pairs.len(), 2);
        assert!((pairs[0].value - 3.0).abs() < 1e-9);
        assert!((pairs[1].value - 1.0).abs() < 1e-6);
        assert_orthonormal(&pairs);
    }

    #[test]
    fn hermitian_matrix_eigenvectors_satisfy_definition() {
        let matrix = array![
            [c(4.0, 0.0), c(1.0, -1.0), c(0.0, 0.5)],
            [c(1.0, 1.0), c(3.0, 0.0), c(0.2, 0.0)],
            [c(0.0, -0.5), c(0.2, 0.0), c(1.0, 0.0)]
        ];
        let pairs = solver().decompose(&matrix);
        assert_eq!(pairs.len(), 3);
        assert!(pairs[0].value >= pairs[1].value && pairs[1].value >= pairs[2].value);
        let dominant = &pairs[0];
        let image = MatrixHelper::multiply(matrix.view(), dominant.vector.view());
        let expected = dominant.vector.mapv(|v| v * dominant.value);
        for (lhs, rhs) in image.iter().zip(expected.iter()) {
            assert!((lhs - rhs).norm() < 1e-4);
        }
    }

    #[test]
    fn rank_one_covariance_has_single_nonzero_eigenvalue() {
        let snapshot = [c(1.0, 0.0), c(0.0, 1.0), c(-1.0, 0.0), c(0.0, -1.0)];
        let matrix = MatrixHelper::covariance(&snapshot);
        let pairs = solver().decompose(&matrix);
        assert_eq!(pairs.len(), 4);
        assert!((pairs[0].value - 4.0).abs() < 1e-9);
        assert!(pairs[1..].iter().all(|pair| pair.value.abs() < 1e-9));
        assert_orthonormal(&pairs);

        let signal = &pairs[0].vector;
        let alignment = MatrixHelper::inner(signal.view(), ndarray::ArrayView1::from(&snapshot[..]));
        assert!((alignment.norm() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn start_orthogonal_to_signal_still_finds_it() {
        // The ramp start vector is orthogonal to this snapshot.
        let snapshot = [c(1.0, 0.0), c(-2.0, 0.0), c(1.0, 0.0)];
        let matrix = MatrixHelper::covariance(&snapshot);
        let pairs = solver().decompose(&matrix);
        assert!((pairs[0].value - 6.0).abs() < 1e-9);
    }

    #[test]
    fn zero_matrix_yields_orthonormal_null_basis() {
        let matrix = Array2::<Complex64>::zeros((3, 3));
        let pairs = solver().decompose(&matrix);
        assert_eq!(pairs.len(), 3);
        assert!(pairs.iter().all(|pair| pair.value == 0.0));
        assert_orthonormal(&pairs);
    }

    #[test]
    fn empty_matrix_yields_no_pairs() {
        let matrix = Array2::<Complex64>::zeros((0, 0));
        assert!(solver().decompose(&matrix).is_empty());
    }
}
