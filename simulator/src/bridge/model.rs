use doacore::telemetry::MetricsSnapshot;
use doacore::FrameReport;
use serde::Serialize;

use crate::workflow::runner::BatchSummary;

/// What `GET /report` serves: the latest frame plus running totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportModel {
    pub status: String,
    pub latest: Option<FrameReport>,
    pub summary: BatchSummary,
    pub metrics: MetricsSnapshot,
}

impl ReportModel {
    pub fn from_reports(reports: &[FrameReport], metrics: MetricsSnapshot) -> Self {
        Self {
            status: "ok".into(),
            latest: reports.last().cloned(),
            summary: BatchSummary::from_reports(reports),
            metrics,
        }
    }
}
