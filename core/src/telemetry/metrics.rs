use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<Metrics>,
}

/// Point-in-time copy of the consumer counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Metrics {
    pub accepted: usize,
    pub rejected: usize,
    pub summaries_written: usize,
    pub write_failures: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Metrics::default()),
        }
    }

    pub fn record_accepted(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.accepted += 1;
        }
    }

    pub fn record_rejected(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.rejected += 1;
        }
    }

    pub fn record_summary(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.summaries_written += 1;
        }
    }

    pub fn record_write_failure(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.write_failures += 1;
        }
    }

    pub fn snapshot(&self) -> Metrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            Metrics::default()
        }
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

    #[test]
    fn snapshot_reflects_recorded_events() {
        let recorder = MetricsRecorder::new();
        recorder.record_accepted();
        recorder.record_accepted();
        recorder.record_rejected();
        recorder.record_summary();
        recorder.record_write_failure();
        assert_eq!(
            recorder.snapshot(),
            Metrics {
                accepted: 2,
                rejected: 1,
                summaries_written: 1,
                write_failures: 1,
            }
        );
    }
}
