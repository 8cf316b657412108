use std::f64::consts::PI;

use crate::prelude::{Condition, RadarConfig};
use crate::targets::Target;

/// Fills in `rcs_m2` from the monostatic radar equation.
///
/// Strength stands in for received power. Targets at a non-positive range
/// keep an RCS of zero and are reported.
pub fn estimate_rcs(targets: &mut [Target], config: &RadarConfig) -> Vec<Condition> {
    let constants = &config.targets;
    let denominator = constants.transmit_power_w
        * constants.transmit_gain
        * constants.receive_gain
        * config.wavelength_m.powi(2);

    let mut conditions = Vec::new();
    for (index, target) in targets.iter_mut().enumerate() {
        if target.range_m <= 0.0 || denominator <= 0.0 {
            target.rcs_m2 = 0.0;
            conditions.push(Condition::InvalidRange {
                target: index,
                range_m: target.range_m,
            });
            continue;
        }
        target.rcs_m2 = target.strength * (4.0 * PI).powi(3) * target.range_m.powi(4) / denominator;
    }
    conditions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::PeakCoordinate;

    fn at_range(range_m: f64, strength: f64) -> Target {
        Target {
            peak: PeakCoordinate::new(0, 0, 0),
            range_m,
            velocity_mps: 0.0,
            azimuth_deg: 0.0,
            elevation_deg: 0.0,
            x_m: range_m,
            y_m: 0.0,
            z_m: 0.0,
            strength,
            rcs_m2: 0.0,
        }
    }

    #[test]
    fn rcs_grows_with_fourth_power_of_range() {
        let mut targets = [at_range(1.0, 2.0), at_range(2.0, 2.0)];
        let conditions = estimate_rcs(&mut targets, &RadarConfig::default());
        assert!(conditions.is_empty());
        assert!(targets[0].rcs_m2 > 0.0);
        assert!((targets[1].rcs_m2 / targets[0].rcs_m2 - 16.0).abs() < 1e-9);
    }

    #[test]
    fn unit_constants_reduce_to_the_textbook_form() {
        let config = RadarConfig {
            wavelength_m: 1.0,
            ..Default::default()
        };
        let mut targets = [at_range(1.0, 1.0)];
        estimate_rcs(&mut targets, &config);
        assert!((targets[0].rcs_m2 - (4.0 * PI).powi(3)).abs() < 1e-9);
    }

    #[test]
    fn zero_range_is_reported() {
        let mut targets = [at_range(0.0, 5.0)];
        let conditions = estimate_rcs(&mut targets, &RadarConfig::default());
        assert_eq!(targets[0].rcs_m2, 0.0);
        assert_eq!(
            conditions,
            vec![Condition::InvalidRange {
                target: 0,
                range_m: 0.0
            }]
        );
    }
}
