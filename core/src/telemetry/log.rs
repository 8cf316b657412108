use std::time::Duration;

use log::{debug, info, warn};

use crate::prelude::Condition;

/// Stage-scoped wrapper over the `log` facade.
pub struct LogManager {
    stage: &'static str,
}

impl LogManager {
    pub fn new(stage: &'static str) -> Self {
        Self { stage }
    }

    pub fn record(&self, message: &str) {
        info!("{}: {}", self.stage, message);
    }

    pub fn report(&self, condition: &Condition) {
        warn!("{}: {}", self.stage, condition);
    }

    pub fn report_all(&self, conditions: &[Condition]) {
        for condition in conditions {
            self.report(condition);
        }
    }

    pub fn timing(&self, elapsed: Duration) {
        debug!("{}: took {:.3} ms", self.stage, elapsed.as_secs_f64() * 1e3);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("pipeline")
    }
}
