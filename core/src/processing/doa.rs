//! MUSIC direction-of-arrival search over a uniform linear array.
//!
//! Each snapshot gets its own rank-one covariance. The eigenvectors past the
//! first `num_sources` span the noise subspace, and the azimuth/elevation
//! grid cell whose steering vector is most nearly orthogonal to that subspace
//! wins.
//!
//! Cells are ranked by how many noise vectors the steering vector is
//! numerically orthogonal to, then by the pseudospectrum `Σ 1/|⟨e, a⟩|²`
//! over the rest.
//!
//! A linear array only resolves the direction cosine `sin(az)·cos(el)`, so
//! the best cell fixes a direction cosine rather than an angle pair. Every
//! cell whose direction cosine lies within [`AMBIGUITY_HALF_WIDTH_DEG`] of
//! in-plane azimuth of that value is the same arrival; the one closest to
//! boresight is reported, then the one scanned first.

use std::cmp::Ordering;
use std::f64::consts::PI;
use std::time::Instant;

use ndarray::Array1;
use num_complex::Complex64;

use crate::interface::{DoaBatch, DoaEstimate, Snapshot};
use crate::math::eigen::PowerIteration;
use crate::math::matrix::MatrixHelper;
use crate::prelude::{
    Condition, ProcessingStage, RadarConfig, StageError, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Grid bound in whole degrees, both axes.
pub const ANGLE_LIMIT_DEG: i32 = 90;
/// `|⟨e, a⟩|²` below this counts as orthogonal.
const ORTHOGONAL_PROJECTION: f64 = 1e-12;
/// Half-width, in degrees of in-plane azimuth, of the direction-cosine band
/// treated as one arrival. Just over half a grid step.
pub const AMBIGUITY_HALF_WIDTH_DEG: f64 = 0.6;

/// `sin(az)·cos(el)`, the only direction a linear array observes.
pub fn direction_cosine(azimuth_deg: f64, elevation_deg: f64) -> f64 {
    azimuth_deg.to_radians().sin() * elevation_deg.to_radians().cos()
}

/// Steering vector of the `receivers`-element array toward (azimuth, elevation).
pub fn steering_vector(
    receivers: usize,
    azimuth_deg: f64,
    elevation_deg: f64,
    config: &RadarConfig,
) -> Array1<Complex64> {
    let direction = direction_cosine(azimuth_deg, elevation_deg);
    let spacing = config.spacing_wavelengths();
    Array1::from_shape_fn(receivers, |i| {
        Complex64::from_polar(1.0, 2.0 * PI * spacing * i as f64 * direction)
    })
}

/// Eigenvectors of the snapshot covariance past the first `num_sources`.
pub fn noise_subspace(
    snapshot: &Snapshot,
    num_sources: usize,
    solver: &PowerIteration,
) -> Vec<Array1<Complex64>> {
    let covariance = MatrixHelper::covariance(snapshot.values());
    solver
        .decompose(&covariance)
        .into_iter()
        .skip(num_sources)
        .map(|pair| pair.vector)
        .collect()
}

/// One estimate per usable snapshot; the rest are reported and skipped.
pub fn estimate(snapshots: &[Snapshot], num_sources: usize, config: &RadarConfig) -> DoaBatch {
    let solver = PowerIteration::from_config(config);
    let mut batch = DoaBatch::default();

    for (index, snapshot) in snapshots.iter().enumerate() {
        let receivers = snapshot.receivers();
        if receivers == 0 || receivers < num_sources {
            batch.conditions.push(Condition::InsufficientReceivers {
                snapshot: index,
                receivers,
                num_sources,
            });
            continue;
        }

        let noise = noise_subspace(snapshot, num_sources, &solver);
        let (azimuth_deg, elevation_deg) = search_grid(&noise, receivers, config);
        batch.estimates.push(DoaEstimate {
            snapshot: index,
            azimuth_deg,
            elevation_deg,
        });
    }

    batch
}

#[derive(Debug, Clone, Copy)]
struct CellScore {
    orthogonal: usize,
    objective: f64,
}

impl CellScore {
    fn evaluate(noise: &[Array1<Complex64>], steering: &Array1<Complex64>) -> Self {
        let mut orthogonal = 0;
        let mut objective = 0.0;
        for vector in noise {
            let projection = MatrixHelper::inner(vector.view(), steering.view()).norm_sqr();
            if projection < ORTHOGONAL_PROJECTION {
                orthogonal += 1;
            } else {
                objective += 1.0 / projection;
            }
        }
        Self {
            orthogonal,
            objective,
        }
    }

    fn beats(&self, other: &CellScore) -> bool {
        match self.orthogonal.cmp(&other.orthogonal) {
            Ordering::Greater => true,
            Ordering::Less => false,
            Ordering::Equal => self.orthogonal == 0 && self.objective > other.objective,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct GridCell {
    azimuth: i32,
    elevation: i32,
    direction: f64,
    score: CellScore,
}

impl GridCell {
    fn offset(&self) -> i32 {
        self.azimuth.abs() + self.elevation.abs()
    }
}

/// Direction-cosine band around `direction`, widened by the ambiguity half-width.
fn ambiguity_band(direction: f64) -> (f64, f64) {
    let limit = ANGLE_LIMIT_DEG as f64;
    let azimuth = direction.clamp(-1.0, 1.0).asin().to_degrees();
    let lower = (azimuth - AMBIGUITY_HALF_WIDTH_DEG).max(-limit);
    let upper = (azimuth + AMBIGUITY_HALF_WIDTH_DEG).min(limit);
    (lower.to_radians().sin(), upper.to_radians().sin())
}

fn search_grid(noise: &[Array1<Complex64>], receivers: usize, config: &RadarConfig) -> (f64, f64) {
    let span = (2 * ANGLE_LIMIT_DEG + 1) as usize;
    let mut cells: Vec<GridCell> = Vec::with_capacity(span * span);
    let mut best: Option<usize> = None;

    for azimuth in -ANGLE_LIMIT_DEG..=ANGLE_LIMIT_DEG {
        for elevation in -ANGLE_LIMIT_DEG..=ANGLE_LIMIT_DEG {
            let steering = steering_vector(receivers, azimuth as f64, elevation as f64, config);
            let cell = GridCell {
                azimuth,
                elevation,
                direction: direction_cosine(azimuth as f64, elevation as f64),
                score: CellScore::evaluate(noise, &steering),
            };
            if best.map_or(true, |index: usize| cell.score.beats(&cells[index].score)) {
                best = Some(cells.len());
            }
            cells.push(cell);
        }
    }

    let Some(best) = best else {
        return (0.0, 0.0);
    };
    let (lower, upper) = ambiguity_band(cells[best].direction);
    let chosen = cells
        .iter()
        .filter(|cell| cell.direction >= lower && cell.direction <= upper)
        .min_by_key(|cell| cell.offset())
        .unwrap_or(&cells[best]);

    (chosen.azimuth as f64, chosen.elevation as f64)
}

pub struct MusicStage {
    config: Option<RadarConfig>,
    logger: LogManager,
}

impl MusicStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("doa"),
        }
    }
}

impl Default for MusicStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for MusicStage {
    type Input<'a> = &'a [Snapshot];
    type Output = DoaBatch;

    fn initialize(&mut self, config: &RadarConfig) -> StageResult<()> {
        if config.num_sources == 0 {
            return Err(StageError::InvalidInput(
                "num_sources must be at least one".into(),
            ));
        }
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute(&mut self, snapshots: &[Snapshot]) -> StageResult<StageOutput<DoaBatch>> {
        let config = self
            .config
            .as_ref()
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;

        let started = Instant::now();
        let batch = estimate(snapshots, config.num_sources, config);
        self.logger.report_all(&batch.conditions);
        for estimate in &batch.estimates {
            self.logger.record(&format!(
                "snapshot {} az {:.1} el {:.1}",
                estimate.snapshot, estimate.azimuth_deg, estimate.elevation_deg
            ));
        }
        self.logger.timing(started.elapsed());

        let metadata = StageMetadata {
            conditions: batch.conditions.clone(),
            notes: vec![format!(
                "{} of {} snapshots resolved",
                batch.estimates.len(),
                snapshots.len()
            )],
            ..Default::default()
        };
        Ok(StageOutput {
            data: batch,
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
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::f64::consts::TAU;

    fn arrival(receivers: usize, azimuth: f64, elevation: f64) -> Snapshot {
        let config = RadarConfig::default();
        Snapshot::new(steering_vector(receivers, azimuth, elevation, &config).to_vec())
    }

    fn assert_in_plane(found: &DoaEstimate, azimuth: f64) {
        assert!(
            (found.azimuth_deg - azimuth).abs() <= 1.0 && found.elevation_deg.abs() <= 1.0,
            "expected ({}, 0) got ({}, {})",
            azimuth,
            found.azimuth_deg,
            found.elevation_deg
        );
    }

    #[test]
    fn steering_vector_starts_at_zero_phase() {
        let config = RadarConfig::default();
        let steering = steering_vector(6, 25.0, 10.0, &config);
        assert_eq!(steering.len(), 6);
        assert!((steering[0] - Complex64::new(1.0, 0.0)).norm() < 1e-15);
        assert!(steering.iter().all(|v| (v.norm() - 1.0).abs() < 1e-12));

        let broadside = steering_vector(4, 0.0, 0.0, &config);
        assert!(broadside.iter().all(|v| *v == Complex64::new(1.0, 0.0)));
    }

    #[test]
    fn noise_subspace_is_orthogonal_to_the_snapshot() {
        let snapshot = arrival(8, 20.0, 0.0);
        let solver = PowerIteration::from_config(&RadarConfig::default());
        let noise = noise_subspace(&snapshot, 1, &solver);
        assert_eq!(noise.len(), 7);
        let signal = ndarray::ArrayView1::from(snapshot.values());
        for vector in &noise {
            assert!(MatrixHelper::inner(vector.view(), signal).norm() < 1e-6);
        }
    }

    #[test]
    fn broadside_source_resolves_to_boresight() {
        let batch = estimate(&[arrival(8, 0.0, 0.0)], 1, &RadarConfig::default());
        assert!(batch.conditions.is_empty());
        assert_eq!(batch.estimates.len(), 1);
        assert_eq!(batch.estimates[0].azimuth_deg, 0.0);
        assert_eq!(batch.estimates[0].elevation_deg, 0.0);
    }

    #[test]
    fn in_plane_sources_resolve_to_their_azimuth() {
        for azimuth in [20.0, -35.0, 57.0] {
            let batch = estimate(&[arrival(8, azimuth, 0.0)], 1, &RadarConfig::default());
            assert_in_plane(&batch.estimates[0], azimuth);
        }
    }

    #[test]
    fn sources_between_grid_points_stay_in_plane() {
        for azimuth in [20.4, 20.5, -35.3, 10.2, 0.3, 70.4, -89.6] {
            let batch = estimate(&[arrival(8, azimuth, 0.0)], 1, &RadarConfig::default());
            assert_in_plane(&batch.estimates[0], azimuth);
        }
    }

    #[test]
    fn noisy_snapshot_still_resolves_in_plane() {
        let mut rng = StdRng::seed_from_u64(17);
        for azimuth in [20.4, -35.3, 0.3] {
            let noisy: Vec<Complex64> = arrival(8, azimuth, 0.0)
                .values()
                .iter()
                .map(|v| {
                    v + Complex64::from_polar(rng.gen_range(0.0..2e-3), rng.gen_range(0.0..TAU))
                })
                .collect();
            let batch = estimate(&[Snapshot::new(noisy)], 1, &RadarConfig::default());
            assert_in_plane(&batch.estimates[0], azimuth);
        }
    }

    #[test]
    fn off_plane_source_resolves_to_its_in_plane_equivalent() {
        let batch = estimate(&[arrival(8, 30.0, 40.0)], 1, &RadarConfig::default());
        let equivalent = direction_cosine(30.0, 40.0).asin().to_degrees();
        assert_in_plane(&batch.estimates[0], equivalent);
    }

    #[test]
    fn ambiguity_band_spans_the_half_width() {
        let (lower, upper) = ambiguity_band(direction_cosine(20.0, 0.0));
        assert!((lower - 19.4f64.to_radians().sin()).abs() < 1e-12);
        assert!((upper - 20.6f64.to_radians().sin()).abs() < 1e-12);
        let (_, edge) = ambiguity_band(1.0);
        assert!((edge - 1.0).abs() < 1e-12);
    }

    #[test]
    fn complex_gain_does_not_move_the_estimate() {
        let gain = Complex64::from_polar(3.0, 0.7);
        let scaled: Vec<Complex64> = arrival(8, -35.0, 0.0)
            .values()
            .iter()
            .map(|v| v * gain)
            .collect();
        let batch = estimate(&[Snapshot::new(scaled)], 1, &RadarConfig::default());
        assert!((batch.estimates[0].azimuth_deg + 35.0).abs() <= 1.0);
    }

    #[test]
    fn short_snapshot_is_reported_and_later_ones_still_resolve() {
        let snapshots = [
            Snapshot::new(vec![Complex64::new(1.0, 0.0); 2]),
            Snapshot::new(Vec::new()),
            arrival(8, 0.0, 0.0),
        ];
        let batch = estimate(&snapshots, 3, &RadarConfig::default());
        assert_eq!(batch.estimates.len(), 1);
        assert_eq!(batch.estimates[0].snapshot, 2);
        assert_eq!(
            batch.conditions,
            vec![
                Condition::InsufficientReceivers {
                    snapshot: 0,
                    receivers: 2,
                    num_sources: 3
                },
                Condition::InsufficientReceivers {
                    snapshot: 1,
                    receivers: 0,
                    num_sources: 3
                },
            ]
        );
    }

    #[test]
    fn empty_noise_subspace_falls_back_to_boresight() {
        let batch = estimate(&[arrival(3, 40.0, 0.0)], 3, &RadarConfig::default());
        assert_eq!(batch.estimates.len(), 1);
        assert_eq!(batch.estimates[0].azimuth_deg, 0.0);
        assert_eq!(batch.estimates[0].elevation_deg, 0.0);
    }

    #[test]
    fn stage_rejects_zero_sources() {
        let mut stage = MusicStage::new();
        let config = RadarConfig {
            num_sources: 0,
            ..Default::default()
        };
        assert!(stage.initialize(&config).is_err());
        assert!(stage.execute(&[]).is_err());

        stage.initialize(&RadarConfig::default()).unwrap();
        let output = stage.execute(&[arrival(8, 0.0, 0.0)]).unwrap();
        assert_eq!(output.data.estimates.len(), 1);
        assert_eq!(output.metadata.notes[0], "1 of 1 snapshots resolved");
        stage.cleanup();
    }
}
