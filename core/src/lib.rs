//! Signal-processing core for the Rust MIMO radar direction-finding platform.
//!
//! A frame is a receiver×chirp×sample cube. It is compressed into the
//! range-Doppler domain, thresholded by a two-dimensional CFAR, gathered into
//! per-peak array snapshots and resolved into arrival angles with MUSIC.

pub mod interface;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod targets;
pub mod telemetry;

pub use interface::{FramePayload, FrameReport, SampleCube};
pub use prelude::{Condition, ProcessingStage, RadarConfig, StageOutput};
pub use processing::FramePipeline;
