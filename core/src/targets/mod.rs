//! Physical targets built from detections and their arrival angles.

pub mod builder;
pub mod motion;
pub mod rcs;

use serde::{Deserialize, Serialize};

use crate::interface::PeakCoordinate;

pub use builder::build_targets;
pub use motion::{estimate_ego_speed, remove_ghosts};
pub use rcs::estimate_rcs;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Target {
    pub peak: PeakCoordinate,
    pub range_m: f64,
    /// Radial velocity, negative when closing.
    pub velocity_mps: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
    /// Summed snapshot magnitude across receivers.
    pub strength: f64,
    pub rcs_m2: f64,
}
