use std::fmt;

use serde::{Deserialize, Serialize};

use crate::interface::PeakCoordinate;

/// Radar constants shared by every processing stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadarConfig {
    pub num_receivers: usize,
    pub num_chirps: usize,
    pub num_samples: usize,
    pub wavelength_m: f64,
    pub element_spacing_m: f64,
    /// Half-width of the CFAR training window. Also the training-cell count
    /// used in the closed-form threshold factor.
    pub training_cells: usize,
    pub guard_cells: usize,
    pub false_alarm_rate: f64,
    pub num_sources: usize,
    pub eigen_tolerance: f64,
    pub eigen_max_iterations: usize,
    pub targets: TargetConfig,
}

impl Default for RadarConfig {
    fn default() -> Self {
        Self {
            num_receivers: 8,
            num_chirps: 64,
            num_samples: 256,
            wavelength_m: 3.9e-3,
            element_spacing_m: 1.95e-3,
            training_cells: 4,
            guard_cells: 2,
            false_alarm_rate: 1e-6,
            num_sources: 1,
            eigen_tolerance: 1e-9,
            eigen_max_iterations: 100,
            targets: TargetConfig::default(),
        }
    }
}

impl RadarConfig {
    /// CFAR threshold factor `T * (Pfa^(-1/T) - 1)` for exponential clutter.
    ///
    /// `None` when no training cells are configured or the false-alarm rate
    /// does not yield a finite factor.
    pub fn cfar_alpha(&self) -> Option<f64> {
        if self.training_cells == 0 {
            return None;
        }
        let cells = self.training_cells as f64;
        let alpha = cells * (self.false_alarm_rate.powf(-1.0 / cells) - 1.0);
        alpha.is_finite().then_some(alpha)
    }

    /// Element spacing expressed in wavelengths.
    pub fn spacing_wavelengths(&self) -> f64 {
        self.element_spacing_m / self.wavelength_m
    }
}

/// Constants for the downstream target construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    pub range_resolution_m: f64,
    pub velocity_resolution_mps: f64,
    /// Radial speeds at or below this magnitude do not contribute to ego motion.
    pub min_ego_speed_mps: f64,
    pub ghost_speed_threshold_mps: f64,
    pub transmit_power_w: f64,
    pub transmit_gain: f64,
    pub receive_gain: f64,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            range_resolution_m: 0.2,
            velocity_resolution_mps: 0.1,
            min_ego_speed_mps: 0.1,
            ghost_speed_threshold_mps: 5.0,
            transmit_power_w: 1.0,
            transmit_gain: 1.0,
            receive_gain: 1.0,
        }
    }
}

/// Non-fatal condition raised while processing a frame.
///
/// Stages skip the offending item, report one of these and keep going.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Condition {
    EmptyCube {
        receivers: usize,
        chirps: usize,
        samples: usize,
    },
    NonPowerOfTwo {
        axis: String,
        length: usize,
    },
    NoTrainingCells {
        cells: usize,
    },
    ThresholdUndefined {
        training_cells: usize,
        false_alarm_rate: f64,
    },
    PeakOutOfBounds {
        peak: PeakCoordinate,
    },
    InsufficientReceivers {
        snapshot: usize,
        receivers: usize,
        num_sources: usize,
    },
    InvalidRange {
        target: usize,
        range_m: f64,
    },
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::EmptyCube {
                receivers,
                chirps,
                samples,
            } => write!(
                f,
                "cube {}x{}x{} has an empty axis, nothing to process",
                receivers, chirps, samples
            ),
            Condition::NonPowerOfTwo { axis, length } => write!(
                f,
                "{} axis length {} is not a power of two, transforms skipped",
                axis, length
            ),
            Condition::NoTrainingCells { cells } => {
                write!(f, "{} cells had no training cells and were not tested", cells)
            }
            Condition::ThresholdUndefined {
                training_cells,
                false_alarm_rate,
            } => write!(
                f,
                "no finite threshold factor for {} training cells at Pfa {}",
                training_cells, false_alarm_rate
            ),
            Condition::PeakOutOfBounds { peak } => {
                write!(f, "invalid peak indices {}", peak)
            }
            Condition::InsufficientReceivers {
                snapshot,
                receivers,
                num_sources,
            } => write!(
                f,
                "snapshot {} has {} receivers, {} sources requested",
                snapshot, receivers, num_sources
            ),
            Condition::InvalidRange { target, range_m } => {
                write!(f, "target {} has invalid range {:.3} m", target, range_m)
            }
        }
    }
}

/// Output produced by each stage.
#[derive(Debug, Clone)]
pub struct StageOutput<T> {
    pub data: T,
    pub metadata: StageMetadata,
}

/// Metadata used for chaining stages and telemetry.
#[derive(Debug, Clone, Default)]
pub struct StageMetadata {
    pub detection_count: Option<usize>,
    pub conditions: Vec<Condition>,
    pub notes: Vec<String>,
}

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("buffer exhaustion: {0}")]
    BufferExhaustion(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Lifecycle shared by the frame processing stages.
pub trait ProcessingStage {
    type Input<'a>;
    type Output;

    fn initialize(&mut self, config: &RadarConfig) -> StageResult<()>;
    fn execute(&mut self, input: Self::Input<'_>) -> StageResult<StageOutput<Self::Output>>;
    fn cleanup(&mut self);
}
