use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use doacore::interface::{FramePayload, FrameReport, SampleCube};
use doacore::telemetry::{MetricsRecorder, MetricsSnapshot};
use doacore::FramePipeline;
use serde::Serialize;
use std::sync::Arc;

/// Totals across a batch of frame reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub frames: usize,
    pub peaks: usize,
    pub estimates: usize,
    pub targets: usize,
    pub ghosts_removed: usize,
    pub conditions: usize,
}

impl BatchSummary {
    pub fn from_reports(reports: &[FrameReport]) -> Self {
        reports.iter().fold(Self::default(), |mut summary, report| {
            summary.frames += 1;
            summary.peaks += report.peaks.len();
            summary.estimates += report.estimates.len();
            summary.targets += report.targets.len();
            summary.ghosts_removed += report.ghosts_removed;
            summary.conditions += report.conditions.len();
            summary
        })
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
    metrics: Arc<MetricsRecorder>,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self {
            config,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Runs the full chain on one raw frame.
    pub fn execute(&self, frame_index: usize, mut cube: SampleCube) -> anyhow::Result<FrameReport> {
        let mut pipeline = FramePipeline::with_metrics(self.config.radar.clone(), self.metrics.clone())
            .context("initializing frame pipeline")?;
        pipeline
            .process(frame_index, &mut cube)
            .with_context(|| format!("processing frame {}", frame_index))
    }

    pub fn execute_payload(&self, payload: &FramePayload) -> anyhow::Result<FrameReport> {
        let cube = payload
            .to_cube()
            .with_context(|| format!("shaping payload for frame {}", payload.frame_index))?;
        self.execute(payload.frame_index, cube)
    }

    /// Processes independent frames concurrently, one blocking task each.
    ///
    /// Reports come back in the order the frames were given.
    pub async fn execute_batch(
        &self,
        frames: Vec<(usize, SampleCube)>,
    ) -> anyhow::Result<Vec<FrameReport>> {
        let handles: Vec<_> = frames
            .into_iter()
            .map(|(frame_index, cube)| {
                let runner = self.clone();
                tokio::task::spawn_blocking(move || runner.execute(frame_index, cube))
            })
            .collect();

        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            let report = handle.await.context("joining frame task")??;
            reports.push(report);
        }
        Ok(reports)
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}
