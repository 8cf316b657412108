use std::f64::consts::PI;

use num_complex::Complex64;

/// In-place radix-2 transforms and the windowing helpers built on them.
///
/// Every routine operates on a caller-owned slice. Lengths of zero or one
/// are left untouched, and so are lengths that are not a power of two;
/// callers pad or reject those before invoking a transform.
pub struct SpectralTransform;

impl SpectralTransform {
    /// Discrete Fourier transform of `data` in place.
    ///
    /// The forward kernel is `exp(-2πi·nk/N)`; the inverse divides by `N`.
    pub fn transform(data: &mut [Complex64], inverse: bool) {
        let n = data.len();
        if n <= 1 || !n.is_power_of_two() {
            return;
        }

        let mut j = 0usize;
        for i in 1..n {
            let mut bit = n >> 1;
            while j & bit != 0 {
                j ^= bit;
                bit >>= 1;
            }
            j |= bit;
            if i < j {
                data.swap(i, j);
            }
        }

        let sign = if inverse { 1.0 } else { -1.0 };
        let mut len = 2;
        while len <= n {
            let step = Complex64::from_polar(1.0, sign * 2.0 * PI / len as f64);
            let half = len / 2;
            for start in (0..n).step_by(len) {
                let mut twiddle = Complex64::new(1.0, 0.0);
                for k in start..start + half {
                    let even = data[k];
                    let odd = twiddle * data[k + half];
                    data[k] = even + odd;
                    data[k + half] = even - odd;
                    twiddle *= step;
                }
            }
            len <<= 1;
        }

        if inverse {
            Self::normalize(data, n);
        }
    }

    /// Symmetric Hann window, zero at both ends.
    pub fn hanning_window(data: &mut [Complex64]) {
        let n = data.len();
        if n <= 1 {
            return;
        }
        let span = (n - 1) as f64;
        for (idx, value) in data.iter_mut().enumerate() {
            *value *= 0.5 * (1.0 - (2.0 * PI * idx as f64 / span).cos());
        }
    }

    pub fn normalize(data: &mut [Complex64], length: usize) {
        if length == 0 {
            return;
        }
        let scale = length as f64;
        for value in data.iter_mut() {
            *value /= scale;
        }
    }

    /// Replaces a real sequence with its analytic signal.
    ///
    /// Bins `1..N/2` are doubled, bin 0 is kept and `N/2..N` is zeroed.
    pub fn hilbert(data: &mut [Complex64]) {
        let n = data.len();
        if n <= 1 || !n.is_power_of_two() {
            return;
        }
        Self::transform(data, false);
        let half = n / 2;
        for value in &mut data[1..half] {
            *value *= 2.0;
        }
        for value in &mut data[half..] {
            *value = Complex64::new(0.0, 0.0);
        }
        Self::transform(data, true);
    }
}
