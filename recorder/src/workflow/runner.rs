use crate::generator::profile::{run_feed, FeedConfig, SyntheticFeed};
use anyhow::Context;
use radarcore::pipeline::{DriverReport, Pipeline, SystemClock};
use radarcore::prelude::PipelineSettings;
use std::time::Duration;
use tokio::signal;
use tokio::sync::watch;

/// How long the consumer gets to drain after the shutdown signal.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// One recording session: feed, consumer, and the stop/drain choreography.
#[derive(Clone)]
pub struct SessionRunner {
    settings: PipelineSettings,
    feed: FeedConfig,
    run_for: Option<Duration>,
}

impl SessionRunner {
    pub fn new(settings: PipelineSettings, feed: FeedConfig, run_for: Option<Duration>) -> Self {
        Self {
            settings,
            feed,
            run_for,
        }
    }

    pub async fn execute(&self) -> anyhow::Result<DriverReport> {
        let pipeline = Pipeline::new();
        let handle = pipeline.handle();
        let mut consumer = pipeline.spawn(&self.settings, SystemClock);

        let (stop_tx, stop_rx) = watch::channel(false);
        let feed = tokio::spawn(run_feed(
            SyntheticFeed::new(self.feed.clone()),
            handle.clone(),
            stop_rx,
        ));

        // The consumer only finishes on its own when it refused to start.
        let early_exit = tokio::select! {
            result = &mut consumer => Some(result),
            _ = wait_for_stop(self.run_for) => None,
        };

        // A send error only means the feed already exited.
        let _ = stop_tx.send(true);
        let pushed = feed.await.context("joining detection feed")?;
        log::info!("detection feed stopped after {} detections", pushed);

        if let Some(result) = early_exit {
            let report = result.context("consumer task panicked")??;
            return Ok(report);
        }

        handle.shutdown();
        let joined = tokio::select! {
            joined = tokio::time::timeout(DRAIN_TIMEOUT, &mut consumer) => joined,
            _ = signal::ctrl_c() => {
                log::warn!("second interrupt, skipping queued detections");
                handle.interrupt();
                tokio::time::timeout(DRAIN_TIMEOUT, &mut consumer).await
            }
        };

        let report = joined
            .context("consumer did not finish draining in time")?
            .context("consumer task panicked")??;
        Ok(report)
    }
}

async fn wait_for_stop(run_for: Option<Duration>) {
    let expiry = async {
        match run_for {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = expiry => log::info!("runtime elapsed, stopping"),
        result = signal::ctrl_c() => match result {
            Ok(()) => log::info!("interrupt received, stopping"),
            Err(err) => {
                log::error!("unable to listen for Ctrl+C: {}", err);
                std::future::pending::<()>().await
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn settings(dir: &std::path::Path) -> PipelineSettings {
        PipelineSettings {
            calib_slope: Some(1.0),
            calib_offset: Some(0.0),
            dist_low: Some(0.0),
            dist_high: Some(255.0),
            summary_path: dir.join("data.json"),
            trace_path: dir.join("data_stream.txt"),
            write_stream: true,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn session_flushes_every_target_on_expiry() {
        let dir = tempfile::tempdir().unwrap();
        let feed = FeedConfig {
            arrival_probability: 1.0,
            seed: 11,
            ..Default::default()
        };
        let runner = SessionRunner::new(settings(dir.path()), feed, Some(Duration::from_secs(3)));

        let report = runner.execute().await.unwrap();

        assert!(report.metrics.accepted > 0);
        assert!(report.metrics.summaries_written > 0);
        assert!(!report.interrupted);
        let summaries = fs::read_to_string(dir.path().join("data.json")).unwrap();
        assert_eq!(summaries.lines().count(), report.metrics.summaries_written);
        let trace = fs::read_to_string(dir.path().join("data_stream.txt")).unwrap();
        assert_eq!(
            trace.lines().count(),
            report.metrics.accepted + report.metrics.rejected
        );
    }

    #[tokio::test(start_paused = true)]
    async fn missing_thresholds_abort_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.dist_low = None;
        let runner = SessionRunner::new(settings, FeedConfig::default(), None);

        let err = runner.execute().await.unwrap_err();
        assert!(err.to_string().contains("dist_low"));
        assert!(!dir.path().join("data.json").exists());
    }
}
