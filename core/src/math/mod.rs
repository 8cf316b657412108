pub mod eigen;
pub mod fft;
pub mod matrix;
pub mod stats;

pub use eigen::{EigenPair, PowerIteration};
pub use fft::SpectralTransform;
pub use matrix::MatrixHelper;
pub use stats::StatsHelper;
