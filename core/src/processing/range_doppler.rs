use std::time::Instant;

use ndarray::{ArrayView1, Axis};
use num_complex::Complex64;

use crate::interface::SampleCube;
use crate::math::fft::SpectralTransform;
use crate::math::stats::StatsHelper;
use crate::prelude::{
    Condition, ProcessingStage, RadarConfig, StageError, StageMetadata, StageOutput, StageResult,
};
use crate::processing::buffer_pool::BufferPool;
use crate::telemetry::log::LogManager;

/// Range then Doppler compression of a raw cube, in place.
///
/// Every receiver×chirp row is Hilbert-transformed and forward-transformed
/// along the sample axis; every receiver×sample column is then windowed,
/// forward-transformed and normalized along the chirp axis.
pub fn compress(cube: &mut SampleCube) -> Vec<Condition> {
    let mut row = Vec::with_capacity(cube.samples());
    let mut column = Vec::with_capacity(cube.chirps());
    compress_with(cube, &mut row, &mut column)
}

fn compress_with(
    cube: &mut SampleCube,
    row: &mut Vec<Complex64>,
    column: &mut Vec<Complex64>,
) -> Vec<Condition> {
    let (receivers, chirps, samples) = cube.dims();
    if cube.is_empty() {
        return vec![Condition::EmptyCube {
            receivers,
            chirps,
            samples,
        }];
    }

    let mut conditions = Vec::new();
    for (axis, length) in [("sample", samples), ("chirp", chirps)] {
        if !length.is_power_of_two() {
            conditions.push(Condition::NonPowerOfTwo {
                axis: axis.to_string(),
                length,
            });
        }
    }

    let data = cube.data_mut();

    // An irregular axis is left exactly as it arrived.
    if samples.is_power_of_two() {
        for mut lane in data.lanes_mut(Axis(2)) {
            row.clear();
            row.extend(lane.iter().copied());
            SpectralTransform::hilbert(row);
            SpectralTransform::transform(row, false);
            lane.assign(&ArrayView1::from(row.as_slice()));
        }
    }

    if chirps.is_power_of_two() {
        for mut lane in data.lanes_mut(Axis(1)) {
            column.clear();
            column.extend(lane.iter().copied());
            SpectralTransform::hanning_window(column);
            SpectralTransform::transform(column, false);
            SpectralTransform::normalize(column, chirps);
            lane.assign(&ArrayView1::from(column.as_slice()));
        }
    }

    conditions
}

/// Stage wrapper owning the scratch rows for [`compress`].
pub struct RangeDopplerStage {
    pool: BufferPool,
    config: Option<RadarConfig>,
    logger: LogManager,
}

impl RangeDopplerStage {
    pub fn new() -> Self {
        Self {
            pool: BufferPool::with_capacity(2),
            config: None,
            logger: LogManager::new("range-doppler"),
        }
    }
}

impl Default for RangeDopplerStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for RangeDopplerStage {
    type Input<'a> = &'a mut SampleCube;
    type Output = ();

    fn initialize(&mut self, config: &RadarConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, cube: &mut SampleCube) -> StageResult<StageOutput<()>> {
        if self.config.is_none() {
            return Err(StageError::Internal("stage not initialized".into()));
        }

        let started = Instant::now();
        let mut row = self.pool.checkout(cube.samples())?;
        let mut column = self.pool.checkout(cube.chirps())?;
        let conditions = compress_with(cube, &mut row, &mut column);
        self.pool.release(row);
        self.pool.release(column);

        self.logger.report_all(&conditions);
        let rms = StatsHelper::rms_magnitude(cube.data().iter());
        self.logger.record(&format!("spectrum RMS {:.4}", rms));
        self.logger.timing(started.elapsed());

        Ok(StageOutput {
            data: (),
            metadata: StageMetadata {
                conditions,
                notes: vec![format!("range-doppler RMS {:.4}", rms)],
                ..Default::default()
            },
        })
    }

    fn cleanup(&mut self) {
        self.pool.reset();
        self.config = None;
    }
}
