use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use num_complex::Complex64;

/// Dense complex helpers used by the covariance and eigen routines.
pub struct MatrixHelper;

impl MatrixHelper {
    /// Outer product `lhs · rhsᴴ`.
    pub fn outer(lhs: ArrayView1<Complex64>, rhs: ArrayView1<Complex64>) -> Array2<Complex64> {
        Array2::from_shape_fn((lhs.len(), rhs.len()), |(i, j)| lhs[i] * rhs[j].conj())
    }

    /// Single-snapshot spatial covariance, `R[i][j] = x[i]·conj(x[j])`.
    pub fn covariance(snapshot: &[Complex64]) -> Array2<Complex64> {
        let view = ArrayView1::from(snapshot);
        Self::outer(view, view)
    }

    pub fn multiply(matrix: ArrayView2<Complex64>, vector: ArrayView1<Complex64>) -> Array1<Complex64> {
        matrix.dot(&vector)
    }

    /// Inner product `⟨lhs, rhs⟩ = Σ conj(lhs[i])·rhs[i]`.
    pub fn inner(lhs: ArrayView1<Complex64>, rhs: ArrayView1<Complex64>) -> Complex64 {
        lhs.iter().zip(rhs.iter()).map(|(l, r)| l.conj() * r).sum()
    }

    pub fn norm(vector: ArrayView1<Complex64>) -> f64 {
        vector.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt()
    }

    pub fn frobenius(matrix: ArrayView2<Complex64>) -> f64 {
        matrix.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt()
    }

    pub fn is_hermitian(matrix: ArrayView2<Complex64>, tolerance: f64) -> bool {
        let (rows, cols) = matrix.dim();
        rows == cols
            && (0..rows).all(|i| {
                (0..cols).all(|j| (matrix[[i, j]] - matrix[[j, i]].conj()).norm() <= tolerance)
            })
    }
}
