use std::sync::Mutex;

use serde::Serialize;

/// Counters shared by every pipeline that processes frames for one run.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub frames: usize,
    pub peaks: usize,
    pub estimates: usize,
    pub conditions: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_frame(&self, peaks: usize, estimates: usize, conditions: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.frames += 1;
            metrics.peaks += peaks;
            metrics.estimates += estimates;
            metrics.conditions += conditions;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| *metrics)
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn recorder_accumulates_across_threads() {
        let recorder = Arc::new(MetricsRecorder::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let recorder = recorder.clone();
                thread::spawn(move || recorder.record_frame(2, 1, 0))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let snapshot = recorder.snapshot();
        assert_eq!(snapshot.frames, 4);
        assert_eq!(snapshot.peaks, 8);
        assert_eq!(snapshot.estimates, 4);
        assert_eq!(snapshot.conditions, 0);
    }
}
