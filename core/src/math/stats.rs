use num_complex::Complex64;

pub struct StatsHelper;

impl StatsHelper {
    /// RMS of the magnitudes of a complex sequence.
    pub fn rms_magnitude<'a, I>(samples: I) -> f64
    where
        I: IntoIterator<Item = &'a Complex64>,
    {
        let (sum_sq, count) = samples
            .into_iter()
            .fold((0.0, 0usize), |(sum, count), v| (sum + v.norm_sqr(), count + 1));
        if count == 0 {
            return 0.0;
        }
        (sum_sq / count as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rms_magnitude_of_zero_sequence_is_zero() {
        let samples = [Complex64::new(0.0, 0.0); 4];
        assert_eq!(StatsHelper::rms_magnitude(&samples), 0.0);
    }

    #[test]
    fn rms_magnitude_uses_complex_modulus() {
        let samples = [Complex64::new(3.0, 4.0), Complex64::new(0.0, 5.0)];
        assert_eq!(StatsHelper::rms_magnitude(&samples), 5.0);
        assert_eq!(StatsHelper::rms_magnitude(&[] as &[Complex64]), 0.0);
    }
}
