pub mod cube;
pub mod detection;
pub mod payload;

pub use cube::{SampleCube, ScalarMap};
pub use detection::{DoaBatch, DoaEstimate, PeakCoordinate, Snapshot, SnapshotSet};
pub use payload::{FramePayload, FrameReport};
