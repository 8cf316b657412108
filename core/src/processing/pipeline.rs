use std::sync::Arc;
use std::time::Instant;

use crate::interface::{FrameReport, SampleCube};
use crate::prelude::{ProcessingStage, RadarConfig, StageMetadata, StageResult};
use crate::processing::cfar::CfarStage;
use crate::processing::doa::MusicStage;
use crate::processing::range_doppler::RangeDopplerStage;
use crate::processing::snapshot::SnapshotStage;
use crate::targets::{build_targets, estimate_ego_speed, estimate_rcs, remove_ghosts};
use crate::telemetry::log::LogManager;
use crate::telemetry::metrics::{MetricsRecorder, MetricsSnapshot};

/// Full per-frame chain: compression, detection, snapshots, MUSIC, targets.
pub struct FramePipeline {
    config: RadarConfig,
    range_doppler: RangeDopplerStage,
    cfar: CfarStage,
    snapshot: SnapshotStage,
    music: MusicStage,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
}

impl FramePipeline {
    pub fn new(config: RadarConfig) -> StageResult<Self> {
        Self::with_metrics(config, Arc::new(MetricsRecorder::new()))
    }

    /// Builds a pipeline that reports into a recorder shared with others.
    pub fn with_metrics(config: RadarConfig, metrics: Arc<MetricsRecorder>) -> StageResult<Self> {
        let mut pipeline = Self {
            range_doppler: RangeDopplerStage::new(),
            cfar: CfarStage::new(),
            snapshot: SnapshotStage::new(),
            music: MusicStage::new(),
            metrics,
            logger: LogManager::new("pipeline"),
            config,
        };
        pipeline.range_doppler.initialize(&pipeline.config)?;
        pipeline.cfar.initialize(&pipeline.config)?;
        pipeline.snapshot.initialize(&pipeline.config)?;
        pipeline.music.initialize(&pipeline.config)?;
        Ok(pipeline)
    }

    /// Compresses a raw cube in place, then runs the rest of the chain on it.
    pub fn process(&mut self, frame_index: usize, cube: &mut SampleCube) -> StageResult<FrameReport> {
        let started = Instant::now();
        let compressed = self.range_doppler.execute(&mut *cube)?;
        self.run(frame_index, cube, compressed.metadata, started)
    }

    /// Runs detection onwards on a cube that is already range-Doppler processed.
    pub fn process_processed(
        &mut self,
        frame_index: usize,
        cube: &SampleCube,
    ) -> StageResult<FrameReport> {
        self.run(frame_index, cube, StageMetadata::default(), Instant::now())
    }

    fn run(
        &mut self,
        frame_index: usize,
        cube: &SampleCube,
        mut collected: StageMetadata,
        started: Instant,
    ) -> StageResult<FrameReport> {
        let detection = self.cfar.execute(cube)?;
        absorb(&mut collected, detection.metadata);
        let detection = detection.data;

        let snapshots = self.snapshot.execute((&detection.peaks[..], cube))?;
        absorb(&mut collected, snapshots.metadata);
        let snapshots = snapshots.data;

        let doa = self.music.execute(&snapshots.snapshots[..])?;
        absorb(&mut collected, doa.metadata);
        let doa = doa.data;

        let constants = &self.config.targets;
        let targets = build_targets(&snapshots, &doa, cube.chirps(), &self.config);
        let ego_speed_mps = estimate_ego_speed(&targets, constants);
        let found = targets.len();
        let mut targets = remove_ghosts(targets, ego_speed_mps, constants.ghost_speed_threshold_mps);
        let rcs_conditions = estimate_rcs(&mut targets, &self.config);
        self.logger.report_all(&rcs_conditions);
        collected.conditions.extend(rcs_conditions);

        let report = FrameReport {
            frame_index,
            peaks: detection.peaks,
            estimates: doa.estimates,
            ghosts_removed: found - targets.len(),
            targets,
            ego_speed_mps,
            conditions: collected.conditions,
            notes: collected.notes,
            maps: Some(detection.maps),
        };

        self.metrics.record_frame(
            report.peaks.len(),
            report.estimates.len(),
            report.conditions.len(),
        );
        self.logger.record(&format!(
            "frame {}: {} peaks, {} estimates, {} targets",
            frame_index,
            report.peaks.len(),
            report.estimates.len(),
            report.targets.len()
        ));
        self.logger.timing(started.elapsed());

        Ok(report)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl Drop for FramePipeline {
    fn drop(&mut self) {
        self.range_doppler.cleanup();
        self.cfar.cleanup();
        self.snapshot.cleanup();
        self.music.cleanup();
    }
}

fn absorb(collected: &mut StageMetadata, metadata: StageMetadata) {
    if let Some(count) = metadata.detection_count {
        collected.detection_count = Some(count);
    }
    collected.conditions.extend(metadata.conditions);
    collected.notes.extend(metadata.notes);
}
