use std::time::Instant;

use ndarray::{Array2, Axis};

use crate::interface::{PeakCoordinate, SampleCube, ScalarMap};
use crate::prelude::{
    Condition, ProcessingStage, RadarConfig, StageError, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Diagnostic maps of the last receiver scanned.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionMaps {
    /// Raw sum of the training-cell magnitudes.
    pub nci: ScalarMap,
    pub folded_nci: ScalarMap,
    pub noise_estimate: ScalarMap,
    pub threshold: ScalarMap,
}

impl DetectionMaps {
    pub fn zeros(chirps: usize, samples: usize) -> Self {
        Self {
            nci: Array2::zeros((chirps, samples)),
            folded_nci: Array2::zeros((chirps, samples)),
            noise_estimate: Array2::zeros((chirps, samples)),
            threshold: Array2::zeros((chirps, samples)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Detection {
    pub maps: DetectionMaps,
    /// Receiver-major, then chirp, then sample.
    pub peaks: Vec<PeakCoordinate>,
    pub conditions: Vec<Condition>,
}

/// Two-dimensional cell-averaging CFAR over every receiver plane.
///
/// The training window is the square `(2T+1)²` chirp×sample neighbourhood
/// minus the `(2G+1)²` guard block around the cell under test, clipped at
/// the cube edges. The noise estimate is the mean magnitude over the cells
/// actually summed; a cell with none is never flagged.
pub fn detect(cube: &SampleCube, config: &RadarConfig) -> Detection {
    let (receivers, chirps, samples) = cube.dims();
    let mut maps = DetectionMaps::zeros(chirps, samples);
    let mut peaks = Vec::new();
    let mut conditions = Vec::new();

    let alpha = config.cfar_alpha();
    if alpha.is_none() {
        conditions.push(Condition::ThresholdUndefined {
            training_cells: config.training_cells,
            false_alarm_rate: config.false_alarm_rate,
        });
    }

    let mut starved = 0usize;
    for r in 0..receivers {
        let magnitude = cube.data().index_axis(Axis(0), r).mapv(|v| v.norm());
        for c in 0..chirps {
            for s in 0..samples {
                let (sum, count) =
                    training_sum(&magnitude, c, s, config.training_cells, config.guard_cells);
                maps.nci[[c, s]] = sum;
                maps.folded_nci[[c, s]] = sum;

                if count == 0 {
                    starved += 1;
                    maps.noise_estimate[[c, s]] = 0.0;
                    maps.threshold[[c, s]] = 0.0;
                    continue;
                }

                let noise = sum / count as f64;
                maps.noise_estimate[[c, s]] = noise;
                let Some(alpha) = alpha else {
                    maps.threshold[[c, s]] = 0.0;
                    continue;
                };

                let threshold = alpha * noise;
                maps.threshold[[c, s]] = threshold;
                if magnitude[[c, s]] > threshold {
                    peaks.push(PeakCoordinate::new(r, c, s));
                }
            }
        }
    }

    if starved > 0 {
        conditions.push(Condition::NoTrainingCells { cells: starved });
    }

    Detection {
        maps,
        peaks,
        conditions,
    }
}

fn training_sum(
    magnitude: &Array2<f64>,
    chirp: usize,
    sample: usize,
    training: usize,
    guard: usize,
) -> (f64, usize) {
    let (chirps, samples) = magnitude.dim();
    let chirp_end = (chirp + training).min(chirps - 1);
    let sample_end = (sample + training).min(samples - 1);

    let mut sum = 0.0;
    let mut count = 0;
    for c in chirp.saturating_sub(training)..=chirp_end {
        for s in sample.saturating_sub(training)..=sample_end {
            if c.abs_diff(chirp) <= guard && s.abs_diff(sample) <= guard {
                continue;
            }
            sum += magnitude[[c, s]];
            count += 1;
        }
    }
    (sum, count)
}

/// Detection stage over the range-Doppler cube.
pub struct CfarStage {
    config: Option<RadarConfig>,
    logger: LogManager,
}

impl CfarStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("cfar"),
        }
    }
}

impl Default for CfarStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for CfarStage {
    type Input<'a> = &'a SampleCube;
    type Output = Detection;

    fn initialize(&mut self, config: &RadarConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, cube: &SampleCube) -> StageResult<StageOutput<Detection>> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let started = Instant::now();
        let detection = detect(cube, config);
        self.logger.report_all(&detection.conditions);
        self.logger
            .record(&format!("detections {}", detection.peaks.len()));
        self.logger.timing(started.elapsed());

        let metadata = StageMetadata {
            detection_count: Some(detection.peaks.len()),
            conditions: detection.conditions.clone(),
            notes: vec![format!(
                "alpha {:.3}",
                config.cfar_alpha().unwrap_or_default()
            )],
        };

        Ok(StageOutput {
            data: detection,
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn config(training: usize, guard: usize, pfa: f64) -> RadarConfig {
        RadarConfig {
            training_cells: training,
            guard_cells: guard,
            false_alarm_rate: pfa,
            ..Default::default()
        }
    }

    fn noisy_cube(receivers: usize, chirps: usize, samples: usize, seed: u64) -> SampleCube {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut cube = SampleCube::zeros(receivers, chirps, samples);
        for value in cube.data_mut().iter_mut() {
            let magnitude = rng.gen_range(0.005..0.01);
            let phase = rng.gen_range(0.0..std::f64::consts::TAU);
            *value = Complex64::from_polar(magnitude, phase);
        }
        cube
    }

    fn constant_cube(levels: &[f64], chirps: usize, samples: usize) -> SampleCube {
        let mut cube = SampleCube::zeros(levels.len(), chirps, samples);
        for (r, &level) in levels.iter().enumerate() {
            cube.data_mut()
                .index_axis_mut(Axis(0), r)
                .fill(Complex64::new(level, 0.0));
        }
        cube
    }

    #[test]
    fn impulse_in_flat_noise_is_the_only_detection() {
        let mut cube = noisy_cube(2, 16, 16, 7);
        cube[(1, 7, 9)] = Complex64::new(0.0, 50.0);
        let detection = detect(&cube, &config(4, 1, 1e-6));
        assert_eq!(detection.peaks, vec![PeakCoordinate::new(1, 7, 9)]);
        assert!(detection.conditions.is_empty());
    }

    #[test]
    fn zero_cube_yields_nothing() {
        let cube = SampleCube::zeros(3, 8, 8);
        let detection = detect(&cube, &config(2, 1, 1e-3));
        assert!(detection.peaks.is_empty());
        assert_eq!(detection.maps, DetectionMaps::zeros(8, 8));
    }

    #[test]
    fn maps_hold_sum_average_and_threshold() {
        let cfg = config(4, 1, 1e-4);
        let cube = constant_cube(&[1.0], 16, 16);
        let maps = detect(&cube, &cfg).maps;
        let alpha = cfg.cfar_alpha().unwrap();

        // Interior: 9x9 window minus 3x3 guard.
        assert_eq!(maps.nci[[8, 8]], 72.0);
        assert_eq!(maps.folded_nci[[8, 8]], 72.0);
        assert!((maps.noise_estimate[[8, 8]] - 1.0).abs() < 1e-12);
        assert!((maps.threshold[[8, 8]] - alpha).abs() < 1e-9);

        // Corner: window clipped to 5x5, guard clipped to 2x2.
        assert_eq!(maps.nci[[0, 0]], 21.0);
        assert!((maps.noise_estimate[[0, 0]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn maps_keep_only_the_last_receiver() {
        let cube = constant_cube(&[1.0, 2.0], 8, 8);
        let maps = detect(&cube, &config(2, 0, 1e-3)).maps;
        assert!(maps
            .noise_estimate
            .iter()
            .all(|&noise| (noise - 2.0).abs() < 1e-12));
    }

    #[test]
    fn peaks_follow_receiver_major_scan_order() {
        let mut cube = noisy_cube(3, 16, 16, 11);
        cube[(2, 1, 1)] = Complex64::new(40.0, 0.0);
        cube[(0, 12, 3)] = Complex64::new(40.0, 0.0);
        cube[(0, 4, 14)] = Complex64::new(40.0, 0.0);
        let detection = detect(&cube, &config(3, 1, 1e-6));
        assert_eq!(
            detection.peaks,
            vec![
                PeakCoordinate::new(0, 4, 14),
                PeakCoordinate::new(0, 12, 3),
                PeakCoordinate::new(2, 1, 1),
            ]
        );
    }

    #[test]
    fn guard_covering_training_window_never_flags() {
        let mut cube = SampleCube::zeros(1, 4, 4);
        cube[(0, 2, 2)] = Complex64::new(100.0, 0.0);
        let detection = detect(&cube, &config(1, 1, 1e-3));
        assert!(detection.peaks.is_empty());
        assert_eq!(
            detection.conditions,
            vec![Condition::NoTrainingCells { cells: 16 }]
        );
        assert!(detection.maps.threshold.iter().all(|t| t.is_finite()));
    }

    #[test]
    fn zero_training_cells_reports_undefined_threshold() {
        let cube = constant_cube(&[1.0], 4, 4);
        let detection = detect(&cube, &config(0, 0, 1e-3));
        assert!(detection.peaks.is_empty());
        assert!(detection
            .conditions
            .iter()
            .any(|c| matches!(c, Condition::ThresholdUndefined { .. })));
        assert!(detection
            .maps
            .noise_estimate
            .iter()
            .all(|n| n.is_finite()));
    }

    #[test]
    fn cfar_stage_counts_detections() {
        let mut stage = CfarStage::new();
        let mut cube = noisy_cube(1, 16, 16, 3);
        cube[(0, 8, 8)] = Complex64::new(25.0, 0.0);
        assert!(stage.execute(&cube).is_err());

        stage.initialize(&config(4, 1, 1e-6)).unwrap();
        let output = stage.execute(&cube).unwrap();
        assert_eq!(output.metadata.detection_count, Some(1));
        assert!(output.metadata.notes[0].starts_with("alpha"));
        stage.cleanup();
    }
}
