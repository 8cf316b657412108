pub mod buffer_pool;
pub mod cfar;
pub mod doa;
pub mod pipeline;
pub mod range_doppler;
pub mod snapshot;

pub use buffer_pool::BufferPool;
pub use cfar::{CfarStage, Detection, DetectionMaps};
pub use doa::MusicStage;
pub use pipeline::FramePipeline;
pub use range_doppler::RangeDopplerStage;
pub use snapshot::SnapshotStage;
