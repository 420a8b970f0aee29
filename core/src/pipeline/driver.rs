//! Consumer loop tying the ingress queue to calibration, aggregation and
//! output.
//!
//! The driver waits on the queue with a short timeout. Every wake-up, whether
//! caused by a detection or by the timeout, checks whether the wall-clock
//! second has moved on and, if so, sweeps stale windows. A `Shutdown` message,
//! a closed queue or an interrupt moves the driver to `Draining`, after which
//! every open window is flushed and the loop ends.

use crate::output::{JsonlSummaryWriter, SummarySink, TraceSink};
use crate::pipeline::clock::Clock;
use crate::pipeline::queue::{
    ingress_channel, IngressHandle, IngressMessage, IngressQueue, Received,
};
use crate::prelude::{
    Calibration, DistanceThresholds, PipelineError, PipelineResult, PipelineSettings,
};
use crate::processing::calibration::{filter, FilterOutcome};
use crate::processing::summary::Summary;
use crate::processing::window::WindowAggregator;
use crate::sensor::{Detection, Timestamp};
use crate::telemetry::{LogManager, Metrics, MetricsRecorder};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Running,
    Draining,
}

/// Outcome of a completed consumer run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverReport {
    pub metrics: Metrics,
    pub interrupted: bool,
}

pub struct PipelineDriver<S, C> {
    queue: IngressQueue,
    aggregator: WindowAggregator,
    calibration: Calibration,
    thresholds: DistanceThresholds,
    trace: TraceSink,
    sink: S,
    clock: C,
    poll_interval: Duration,
    metrics: Arc<MetricsRecorder>,
    logger: LogManager,
    state: DriverState,
    last_second: Option<Timestamp>,
    interrupted: bool,
}

impl<S: SummarySink, C: Clock> PipelineDriver<S, C> {
    /// Fails when calibration or thresholds are missing or out of range; the
    /// consumer must not process anything in that case.
    pub fn new(
        queue: IngressQueue,
        settings: &PipelineSettings,
        sink: S,
        clock: C,
        metrics: Arc<MetricsRecorder>,
    ) -> PipelineResult<Self> {
        let logger = LogManager::new("consumer");
        let resolved = settings.resolve().map_err(|err| {
            logger.error(&format!("refusing to start: {}", err));
            err
        })?;

        let trace = TraceSink::new(
            resolved.print_stream,
            resolved.write_stream.then(|| resolved.trace_path.clone()),
        );

        Ok(Self {
            queue,
            aggregator: WindowAggregator::new(resolved.calibration, resolved.thresholds),
            calibration: resolved.calibration,
            thresholds: resolved.thresholds,
            trace,
            sink,
            clock,
            poll_interval: resolved.poll_interval,
            metrics,
            logger,
            state: DriverState::Running,
            last_second: None,
            interrupted: false,
        })
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn active_targets(&self) -> usize {
        self.aggregator.active_targets()
    }

    /// One iteration of the consumer loop.
    pub async fn tick(&mut self) -> DriverState {
        if self.state == DriverState::Draining {
            return self.state;
        }

        let received = self.queue.recv_timeout(self.poll_interval).await;
        let now = self.clock.now();

        match received {
            Received::Message(IngressMessage::Detection(detection)) => {
                self.ingest(&detection, now);
            }
            Received::Message(IngressMessage::Shutdown) => {
                self.logger.record("shutdown signal received, draining");
                self.state = DriverState::Draining;
            }
            Received::Closed => {
                self.logger.record("all producers gone, draining");
                self.state = DriverState::Draining;
            }
            Received::Interrupted => {
                self.logger.warn("interrupted, flushing open windows");
                self.interrupted = true;
                self.state = DriverState::Draining;
            }
            Received::Timeout => {}
        }

        if self.state == DriverState::Running && self.last_second != Some(now) {
            self.last_second = Some(now);
            let closed = self.aggregator.sweep(now);
            self.emit(closed);
        }

        self.state
    }

    /// Flushes every open window. Further calls find nothing left to flush.
    pub fn drain(&mut self) {
        self.state = DriverState::Draining;
        let remaining = self.aggregator.flush_all();
        self.logger
            .record(&format!("flushing {} open window(s)", remaining.len()));
        self.emit(remaining);
    }

    pub async fn run(mut self) -> DriverReport {
        self.logger.record(&format!(
            "consumer started (slope {}, offset {}, distance {}..={})",
            self.calibration.slope,
            self.calibration.offset,
            self.thresholds.low,
            self.thresholds.high
        ));

        while self.tick().await == DriverState::Running {}
        self.drain();

        let report = self.report();
        self.logger.record(&format!(
            "consumer finished: accepted {}, rejected {}, summaries {}, write failures {}",
            report.metrics.accepted,
            report.metrics.rejected,
            report.metrics.summaries_written,
            report.metrics.write_failures
        ));
        report
    }

    pub fn report(&self) -> DriverReport {
        DriverReport {
            metrics: self.metrics.snapshot(),
            interrupted: self.interrupted,
        }
    }

    fn ingest(&mut self, detection: &Detection, now: Timestamp) {
        if let Err(err) = self.trace.write_trace(now, detection) {
            self.metrics.record_write_failure();
            self.logger.error(&format!("trace write failed: {}", err));
        }

        match filter(detection, &self.calibration, &self.thresholds, now) {
            FilterOutcome::Accepted(sample) => {
                self.aggregator.accept(sample);
                self.metrics.record_accepted();
            }
            FilterOutcome::Rejected(_) => self.metrics.record_rejected(),
        }
    }

    fn emit(&mut self, summaries: Vec<Summary>) {
        for summary in summaries {
            match self.sink.write_summary(&summary) {
                Ok(()) => {
                    self.metrics.record_summary();
                    self.logger.detail(&format!(
                        "target {} closed: {} samples, max {}, 95% max {}, average {}",
                        summary.target_id,
                        summary.sample_count(),
                        summary.max,
                        summary.p95,
                        summary.average
                    ));
                }
                Err(err) => {
                    self.metrics.record_write_failure();
                    self.logger.error(&format!(
                        "summary for target {} lost: {}",
                        summary.target_id, err
                    ));
                }
            }
        }
    }
}

/// Explicitly constructed pipeline: owns the ingress queue until the consumer
/// is spawned and hands out producer handles.
pub struct Pipeline {
    handle: IngressHandle,
    queue: IngressQueue,
    metrics: Arc<MetricsRecorder>,
}

impl Pipeline {
    pub fn new() -> Self {
        let (handle, queue) = ingress_channel();
        Self {
            handle,
            queue,
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    pub fn handle(&self) -> IngressHandle {
        self.handle.clone()
    }

    pub fn metrics(&self) -> Arc<MetricsRecorder> {
        self.metrics.clone()
    }

    /// Spawns the consumer with a JSONL summary writer at the configured
    /// path.
    pub fn spawn<C>(
        self,
        settings: &PipelineSettings,
        clock: C,
    ) -> JoinHandle<PipelineResult<DriverReport>>
    where
        C: Clock + 'static,
    {
        let sink = JsonlSummaryWriter::new(settings.summary_path.clone());
        self.spawn_with_sink(settings, sink, clock)
    }

    pub fn spawn_with_sink<S, C>(
        self,
        settings: &PipelineSettings,
        sink: S,
        clock: C,
    ) -> JoinHandle<PipelineResult<DriverReport>>
    where
        S: SummarySink + Send + 'static,
        C: Clock + 'static,
    {
        // The pipeline's own handle is dropped here so the queue closes once
        // every producer lets go of theirs.
        let Pipeline { queue, metrics, .. } = self;
        let driver = PipelineDriver::new(queue, settings, sink, clock, metrics);
        tokio::spawn(async move {
            let driver = driver?;
            Ok::<_, PipelineError>(driver.run().await)
        })
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
