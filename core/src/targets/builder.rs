use crate::interface::{DoaBatch, SnapshotSet};
use crate::prelude::RadarConfig;
use crate::targets::Target;

/// One target per estimate, placed by its peak's range and Doppler bins.
///
/// Doppler bins in the upper half of `chirps` wrap to negative velocities.
pub fn build_targets(
    set: &SnapshotSet,
    batch: &DoaBatch,
    chirps: usize,
    config: &RadarConfig,
) -> Vec<Target> {
    let resolution = &config.targets;
    batch
        .estimates
        .iter()
        .filter_map(|estimate| {
            let peak = set.peaks.get(estimate.snapshot)?;
            let snapshot = set.snapshots.get(estimate.snapshot)?;

            let range_m = peak.sample as f64 * resolution.range_resolution_m;
            let velocity_mps = signed_bin(peak.chirp, chirps) * resolution.velocity_resolution_mps;
            let azimuth = estimate.azimuth_deg.to_radians();
            let elevation = estimate.elevation_deg.to_radians();

            Some(Target {
                peak: *peak,
                range_m,
                velocity_mps,
                azimuth_deg: estimate.azimuth_deg,
                elevation_deg: estimate.elevation_deg,
                x_m: range_m * elevation.cos() * azimuth.cos(),
                y_m: range_m * elevation.cos() * azimuth.sin(),
                z_m: range_m * elevation.sin(),
                strength: snapshot.values().iter().map(|v| v.norm()).sum(),
                rcs_m2: 0.0,
            })
        })
        .collect()
}

fn signed_bin(bin: usize, length: usize) -> f64 {
    if length > 0 && bin >= length / 2 {
        bin as f64 - length as f64
    } else {
        bin as f64
    }
}
