use std::ops::{Index, IndexMut};

use ndarray::{Array2, Array3, Axis};
use num_complex::Complex64;

use crate::interface::PeakCoordinate;
use crate::prelude::{StageError, StageResult};

/// Real-valued `[chirp][sample]` map produced by the detector.
pub type ScalarMap = Array2<f64>;

/// Complex samples indexed `[receiver][chirp][sample]`.
///
/// Rectangular by construction; stages mutate it in place.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleCube {
    data: Array3<Complex64>,
}

impl SampleCube {
    pub fn zeros(receivers: usize, chirps: usize, samples: usize) -> Self {
        Self {
            data: Array3::zeros((receivers, chirps, samples)),
        }
    }

    /// Builds a cube from nested receiver/chirp/sample vectors, rejecting
    /// jagged input.
    pub fn from_nested(rows: Vec<Vec<Vec<Complex64>>>) -> StageResult<Self> {
        let receivers = rows.len();
        let chirps = rows.first().map_or(0, Vec::len);
        let samples = rows
            .first()
            .and_then(|receiver| receiver.first())
            .map_or(0, Vec::len);

        let mut flat = Vec::with_capacity(receivers * chirps * samples);
        for (r, receiver) in rows.into_iter().enumerate() {
            if receiver.len() != chirps {
                return Err(StageError::InvalidInput(format!(
                    "receiver {} has {} chirps, expected {}",
                    r,
                    receiver.len(),
                    chirps
                )));
            }
            for (c, chirp) in receiver.into_iter().enumerate() {
                if chirp.len() != samples {
                    return Err(StageError::InvalidInput(format!(
                        "receiver {} chirp {} has {} samples, expected {}",
                        r,
                        c,
                        chirp.len(),
                        samples
                    )));
                }
                flat.extend(chirp);
            }
        }

        let data = Array3::from_shape_vec((receivers, chirps, samples), flat)
            .map_err(|err| StageError::InvalidInput(err.to_string()))?;
        Ok(Self { data })
    }

    /// Builds a cube of real samples laid out receiver-major.
    pub fn from_real(shape: (usize, usize, usize), values: &[f64]) -> StageResult<Self> {
        let expected = shape.0 * shape.1 * shape.2;
        if values.len() != expected {
            return Err(StageError::InvalidInput(format!(
                "expected {} samples for a {}x{}x{} cube, got {}",
                expected,
                shape.0,
                shape.1,
                shape.2,
                values.len()
            )));
        }
        let complex = values.iter().map(|&v| Complex64::new(v, 0.0)).collect();
        let data = Array3::from_shape_vec(shape, complex)
            .map_err(|err| StageError::InvalidInput(err.to_string()))?;
        Ok(Self { data })
    }

    pub fn receivers(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn chirps(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn samples(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn dims(&self) -> (usize, usize, usize) {
        self.data.dim()
    }

    /// True when any axis has zero length.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn contains(&self, peak: &PeakCoordinate) -> bool {
        peak.receiver < self.receivers() && peak.chirp < self.chirps() && peak.sample < self.samples()
    }

    pub fn get(&self, receiver: usize, chirp: usize, sample: usize) -> Option<Complex64> {
        self.data.get((receiver, chirp, sample)).copied()
    }

    /// Values at one (chirp, sample) cell across every receiver.
    pub fn receiver_column(&self, chirp: usize, sample: usize) -> Option<Vec<Complex64>> {
        if chirp >= self.chirps() || sample >= self.samples() {
            return None;
        }
        Some(
            self.data
                .index_axis(Axis(2), sample)
                .index_axis(Axis(1), chirp)
                .to_vec(),
        )
    }

    pub fn data(&self) -> &Array3<Complex64> {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut Array3<Complex64> {
        &mut self.data
    }
}

impl Index<(usize, usize, usize)> for SampleCube {
    type Output = Complex64;

    fn index(&self, index: (usize, usize, usize)) -> &Complex64 {
        &self.data[index]
    }
}

impl IndexMut<(usize, usize, usize)> for SampleCube {
    fn index_mut(&mut self, index: (usize, usize, usize)) -> &mut Complex64 {
        &mut self.data[index]
    }
}
