use anyhow::Context;
use doacore::interface::{FramePayload, SampleCube};
use doacore::RadarConfig;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// A point reflector seen by every receiver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyntheticTarget {
    pub range_bin: usize,
    pub doppler_bin: usize,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub amplitude: f64,
}

impl Default for SyntheticTarget {
    fn default() -> Self {
        Self {
            range_bin: 12,
            doppler_bin: 4,
            azimuth_deg: 0.0,
            elevation_deg: 0.0,
            amplitude: 1.0,
        }
    }
}

/// Configuration for generating synthetic raw frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub noise: f64,
    pub targets: Vec<SyntheticTarget>,
    pub description: Option<String>,
    pub scenario: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            noise: 0.03,
            targets: vec![SyntheticTarget::default()],
            description: None,
            scenario: None,
        }
    }
}

fn build_sample_vector(
    config: &GeneratorConfig,
    radar: &RadarConfig,
    frame_index: usize,
) -> anyhow::Result<Vec<f64>> {
    let (receivers, chirps, samples) = (radar.num_receivers, radar.num_chirps, radar.num_samples);
    let sample_count = receivers
        .checked_mul(chirps)
        .and_then(|n| n.checked_mul(samples))
        .context("overflow computing sample count for generator")?;

    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(frame_index as u64));
    let spacing = radar.spacing_wavelengths();
    let mut values = Vec::with_capacity(sample_count);

    for r in 0..receivers {
        for c in 0..chirps {
            for s in 0..samples {
                let mut value = 0.0;
                for target in &config.targets {
                    let direction = target.azimuth_deg.to_radians().sin()
                        * target.elevation_deg.to_radians().cos();
                    let phase = 2.0 * PI * (target.range_bin * s) as f64 / samples as f64
                        + 2.0 * PI * (target.doppler_bin * c) as f64 / chirps as f64
                        + 2.0 * PI * spacing * r as f64 * direction;
                    value += target.amplitude * phase.cos();
                }
                if config.noise > 0.0 {
                    value += rng.gen_range(-config.noise..config.noise);
                }
                values.push(value);
            }
        }
    }

    Ok(values)
}

pub fn build_payload(
    config: &GeneratorConfig,
    radar: &RadarConfig,
    frame_index: usize,
) -> anyhow::Result<FramePayload> {
    let values = build_sample_vector(config, radar, frame_index)?;
    Ok(FramePayload::new(
        frame_index,
        [radar.num_receivers, radar.num_chirps, radar.num_samples],
        values,
    ))
}

pub fn build_cube(
    config: &GeneratorConfig,
    radar: &RadarConfig,
    frame_index: usize,
) -> anyhow::Result<SampleCube> {
    build_payload(config, radar, frame_index)?
        .to_cube()
        .context("shaping synthetic frame")
}
