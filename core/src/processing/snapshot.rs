use crate::interface::{PeakCoordinate, SampleCube, Snapshot, SnapshotSet};
use crate::prelude::{
    Condition, ProcessingStage, RadarConfig, StageError, StageMetadata, StageOutput, StageResult,
};
use crate::telemetry::log::LogManager;

/// Gathers the (chirp, sample) cell of every peak across all receivers.
///
/// Out-of-bounds peaks are skipped and reported; the result stays
/// index-aligned with the peaks that were kept.
pub fn synthesize(peaks: &[PeakCoordinate], cube: &SampleCube) -> SnapshotSet {
    let mut set = SnapshotSet {
        peaks: Vec::with_capacity(peaks.len()),
        snapshots: Vec::with_capacity(peaks.len()),
        conditions: Vec::new(),
    };

    for peak in peaks {
        let column = cube
            .contains(peak)
            .then(|| cube.receiver_column(peak.chirp, peak.sample))
            .flatten();
        match column {
            Some(values) => {
                set.peaks.push(*peak);
                set.snapshots.push(Snapshot::new(values));
            }
            None => set.conditions.push(Condition::PeakOutOfBounds { peak: *peak }),
        }
    }

    set
}

pub struct SnapshotStage {
    config: Option<RadarConfig>,
    logger: LogManager,
}

impl SnapshotStage {
    pub fn new() -> Self {
        Self {
            config: None,
            logger: LogManager::new("snapshot"),
        }
    }
}

impl Default for SnapshotStage {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStage for SnapshotStage {
    type Input<'a> = (&'a [PeakCoordinate], &'a SampleCube);
    type Output = SnapshotSet;

    fn initialize(&mut self, config: &RadarConfig) -> StageResult<()> {
        self.config = Some(config.clone());
        Ok(())
    }

    fn execute<'a>(
        &mut self,
        (peaks, cube): (&'a [PeakCoordinate], &'a SampleCube),
    ) -> StageResult<StageOutput<SnapshotSet>> {
        if self.config.is_none() {
            return Err(StageError::Internal("stage not initialized".into()));
        }

        let set = synthesize(peaks, cube);
        self.logger.report_all(&set.conditions);
        self.logger.record(&format!(
            "{} snapshots from {} peaks",
            set.len(),
            peaks.len()
        ));

        let metadata = StageMetadata {
            conditions: set.conditions.clone(),
            ..Default::default()
        };
        Ok(StageOutput {
            data: set,
            metadata,
        })
    }

    fn cleanup(&mut self) {
        self.config = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn indexed_cube(receivers: usize, chirps: usize, samples: usize) -> SampleCube {
        let mut cube = SampleCube::zeros(receivers, chirps, samples);
        for ((r, c, s), value) in cube.data_mut().indexed_iter_mut() {
            *value = Complex64::new((100 * r + 10 * c + s) as f64, r as f64);
        }
        cube
    }

    #[test]
    fn one_snapshot_per_peak_across_all_receivers() {
        let cube = indexed_cube(4, 8, 8);
        let peaks = [
            PeakCoordinate::new(0, 1, 2),
            PeakCoordinate::new(3, 7, 0),
            PeakCoordinate::new(2, 4, 5),
        ];
        let set = synthesize(&peaks, &cube);
        assert_eq!(set.len(), 3);
        assert!(set.conditions.is_empty());
        for (peak, snapshot) in set.peaks.iter().zip(&set.snapshots) {
            assert_eq!(snapshot.receivers(), 4);
            for (r, value) in snapshot.values().iter().enumerate() {
                assert_eq!(*value, cube[(r, peak.chirp, peak.sample)]);
            }
        }
    }

    #[test]
    fn out_of_bounds_peak_is_skipped_and_reported() {
        let cube = indexed_cube(2, 4, 4);
        let peaks = [
            PeakCoordinate::new(0, 1, 1),
            PeakCoordinate::new(0, 4, 1),
            PeakCoordinate::new(1, 3, 3),
        ];
        let set = synthesize(&peaks, &cube);
        assert_eq!(set.len(), 2);
        assert_eq!(set.peaks, vec![peaks[0], peaks[2]]);
        assert_eq!(
            set.conditions,
            vec![Condition::PeakOutOfBounds { peak: peaks[1] }]
        );
        assert_eq!(set.snapshots[1].values()[1], cube[(1, 3, 3)]);
    }

    #[test]
    fn receiver_index_is_bounds_checked_too() {
        let cube = indexed_cube(2, 4, 4);
        let set = synthesize(&[PeakCoordinate::new(2, 0, 0)], &cube);
        assert!(set.is_empty());
        assert_eq!(set.conditions.len(), 1);
    }

    #[test]
    fn stage_reports_skipped_peaks_in_metadata() {
        let cube = indexed_cube(2, 4, 4);
        let peaks = [PeakCoordinate::new(0, 9, 9)];
        let mut stage = SnapshotStage::new();
        stage.initialize(&RadarConfig::default()).unwrap();
        let output = stage.execute((&peaks[..], &cube)).unwrap();
        assert!(output.data.is_empty());
        assert_eq!(output.metadata.conditions.len(), 1);
        stage.cleanup();
    }
}
