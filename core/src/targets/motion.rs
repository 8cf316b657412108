use crate::prelude::TargetConfig;
use crate::targets::Target;

/// Mean radial velocity of the moving targets, zero when nothing moves.
pub fn estimate_ego_speed(targets: &[Target], config: &TargetConfig) -> f64 {
    let (sum, count) = targets
        .iter()
        .map(|target| target.velocity_mps)
        .filter(|velocity| velocity.abs() > config.min_ego_speed_mps)
        .fold((0.0, 0usize), |(sum, count), velocity| (sum + velocity, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

/// Drops targets whose velocity strays more than `threshold` from the ego speed.
pub fn remove_ghosts(targets: Vec<Target>, ego_speed: f64, threshold: f64) -> Vec<Target> {
    targets
        .into_iter()
        .filter(|target| (target.velocity_mps - ego_speed).abs() <= threshold)
        .collect()
}
