use anyhow::Context;
use doacore::RadarConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::generator::profile::GeneratorConfig;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    pub radar: RadarConfig,
    /// Synthetic frames to generate when no input file is given.
    pub frames: usize,
    /// Indexed CSV dump to read instead of generating frames.
    pub input: Option<PathBuf>,
    pub generator: GeneratorConfig,
    /// Where the offline run writes its JSON reports.
    pub report: Option<PathBuf>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            radar: RadarConfig {
                num_chirps: 16,
                num_samples: 32,
                ..Default::default()
            },
            frames: 1,
            input: None,
            generator: GeneratorConfig::default(),
            report: None,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(receivers: usize, chirps: usize, samples: usize, frames: usize) -> Self {
        let mut config = Self::default();
        config.radar.num_receivers = receivers;
        config.radar.num_chirps = chirps;
        config.radar.num_samples = samples;
        config.frames = frames;
        config
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (
            self.radar.num_receivers,
            self.radar.num_chirps,
            self.radar.num_samples,
        )
    }
}
