use serde::{Deserialize, Serialize};

use crate::interface::{DoaEstimate, PeakCoordinate, SampleCube};
use crate::prelude::{Condition, StageResult};
use crate::processing::cfar::DetectionMaps;
use crate::targets::Target;

/// Real-valued frame as handed over by an ingestion collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FramePayload {
    pub frame_index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<f64>,
    /// `[receivers, chirps, samples]`.
    pub shape: [usize; 3],
    /// Receiver-major samples.
    pub values: Vec<f64>,
}

impl FramePayload {
    pub fn new(frame_index: usize, shape: [usize; 3], values: Vec<f64>) -> Self {
        Self {
            frame_index,
            timestamp: None,
            shape,
            values,
        }
    }

    pub fn to_cube(&self) -> StageResult<SampleCube> {
        let [receivers, chirps, samples] = self.shape;
        SampleCube::from_real((receivers, chirps, samples), &self.values)
    }
}

/// Everything the pipeline produced for one frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FrameReport {
    pub frame_index: usize,
    pub peaks: Vec<PeakCoordinate>,
    pub estimates: Vec<DoaEstimate>,
    pub targets: Vec<Target>,
    pub ghosts_removed: usize,
    pub ego_speed_mps: f64,
    pub conditions: Vec<Condition>,
    pub notes: Vec<String>,
    /// Last-receiver diagnostic maps from the detector.
    #[serde(skip)]
    pub maps: Option<DetectionMaps>,
}
