use crate::prelude::{Calibration, DistanceThresholds};
use crate::processing::summary::Summary;
use crate::sensor::{CalibratedSample, TargetId, Timestamp};
use std::collections::BTreeMap;

/// Seconds of silence after which a target's session is considered over.
pub const STALE_AFTER_SECS: i64 = 10;

/// Samples accumulated for one active target session, in arrival order.
#[derive(Debug, Clone)]
pub struct Window {
    target_id: TargetId,
    samples: Vec<CalibratedSample>,
    last_seen: Timestamp,
}

impl Window {
    fn open(sample: CalibratedSample) -> Self {
        Self {
            target_id: sample.target_id,
            samples: vec![sample],
            last_seen: sample.timestamp,
        }
    }

    fn push(&mut self, sample: CalibratedSample) {
        self.last_seen = self.last_seen.max(sample.timestamp);
        self.samples.push(sample);
    }

    pub fn target_id(&self) -> TargetId {
        self.target_id
    }

    pub fn last_seen(&self) -> Timestamp {
        self.last_seen
    }

    pub fn samples(&self) -> &[CalibratedSample] {
        &self.samples
    }

    pub fn is_stale(&self, now: Timestamp) -> bool {
        now.seconds_since(self.last_seen) > STALE_AFTER_SECS
    }
}

/// Owns every open window, keyed by target id. Only the consumer task touches
/// it, so no locking is involved.
pub struct WindowAggregator {
    windows: BTreeMap<TargetId, Window>,
    calibration: Calibration,
    thresholds: DistanceThresholds,
}

impl WindowAggregator {
    pub fn new(calibration: Calibration, thresholds: DistanceThresholds) -> Self {
        Self {
            windows: BTreeMap::new(),
            calibration,
            thresholds,
        }
    }

    pub fn accept(&mut self, sample: CalibratedSample) {
        match self.windows.get_mut(&sample.target_id) {
            Some(window) => window.push(sample),
            None => {
                self.windows.insert(sample.target_id, Window::open(sample));
            }
        }
    }

    /// Closes every window whose last sample is more than
    /// [`STALE_AFTER_SECS`] older than `now`. Stale ids are collected first
    /// and removed afterwards, so a closed id can immediately start a new
    /// session.
    pub fn sweep(&mut self, now: Timestamp) -> Vec<Summary> {
        let stale: Vec<TargetId> = self
            .windows
            .values()
            .filter(|window| window.is_stale(now))
            .map(Window::target_id)
            .collect();

        let closed: Vec<Window> = stale
            .into_iter()
            .filter_map(|id| self.windows.remove(&id))
            .collect();

        closed
            .into_iter()
            .filter_map(|window| self.finalize(window))
            .collect()
    }

    /// Closes every remaining window regardless of age.
    pub fn flush_all(&mut self) -> Vec<Summary> {
        let windows = std::mem::take(&mut self.windows);
        windows
            .into_values()
            .filter_map(|window| self.finalize(window))
            .collect()
    }

    fn finalize(&self, window: Window) -> Option<Summary> {
        Summary::compute(
            window.target_id,
            &window.samples,
            self.calibration,
            self.thresholds,
        )
    }

    pub fn active_targets(&self) -> usize {
        self.windows.len()
    }

    pub fn window(&self, target_id: TargetId) -> Option<&Window> {
        self.windows.get(&target_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn aggregator() -> WindowAggregator {
        WindowAggregator::new(Calibration::default(), DistanceThresholds::new(10.0, 100.0))
    }

    fn sample(id: u32, secs: i64, speed: f64) -> CalibratedSample {
        CalibratedSample {
            target_id: TargetId(id),
            timestamp: Timestamp::from_secs(secs),
            calibrated_speed: speed,
            distance: 50.0,
        }
    }

    #[test]
    fn window_stays_open_for_ten_quiet_seconds() {
        let mut agg = aggregator();
        agg.accept(sample(1, 0, 20.0));
        agg.accept(sample(1, 1, 25.0));

        assert!(agg.sweep(Timestamp::from_secs(11)).is_empty());
        assert_eq!(agg.active_targets(), 1);

        let summaries = agg.sweep(Timestamp::from_secs(12));
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].max, 25.0);
        assert_eq!(summaries[0].average, 22.5);
        assert_eq!(summaries[0].sample_count(), 2);
        assert_eq!(summaries[0].timestamp, Timestamp::from_secs(0));
        assert_eq!(agg.active_targets(), 0);
    }

    #[test]
    fn sweep_never_summarizes_a_window_twice() {
        let mut agg = aggregator();
        agg.accept(sample(1, 0, 20.0));
        assert_eq!(agg.sweep(Timestamp::from_secs(20)).len(), 1);
        assert!(agg.sweep(Timestamp::from_secs(21)).is_empty());
        assert!(agg.flush_all().is_empty());
    }

    #[test]
    fn reused_id_starts_fresh_window() {
        let mut agg = aggregator();
        agg.accept(sample(4, 0, 20.0));
        assert_eq!(agg.sweep(Timestamp::from_secs(11)).len(), 1);

        agg.accept(sample(4, 30, 40.0));
        let window = agg.window(TargetId(4)).unwrap();
        assert_eq!(window.samples().len(), 1);
        assert_eq!(window.last_seen(), Timestamp::from_secs(30));

        let summaries = agg.flush_all();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].data, vec![(40.0, 50.0)]);
    }

    #[test]
    fn interleaved_targets_do_not_mix() {
        let mut agg = aggregator();
        agg.accept(sample(1, 0, 10.0));
        agg.accept(sample(2, 0, 50.0));
        agg.accept(sample(1, 1, 12.0));
        agg.accept(sample(2, 6, 52.0));

        let first = agg.sweep(Timestamp::from_secs(12));
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].target_id, TargetId(1));
        assert_eq!(first[0].data, vec![(10.0, 50.0), (12.0, 50.0)]);

        assert!(agg.sweep(Timestamp::from_secs(16)).is_empty());
        let second = agg.sweep(Timestamp::from_secs(17));
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].target_id, TargetId(2));
        assert_eq!(second[0].data, vec![(50.0, 50.0), (52.0, 50.0)]);
    }

    #[test]
    fn out_of_order_sample_does_not_rewind_last_seen() {
        let mut agg = aggregator();
        agg.accept(sample(1, 5, 20.0));
        agg.accept(sample(1, 3, 21.0));
        assert_eq!(
            agg.window(TargetId(1)).unwrap().last_seen(),
            Timestamp::from_secs(5)
        );
        assert!(agg.sweep(Timestamp::from_secs(15)).is_empty());
    }

    #[test]
    fn flush_all_closes_everything() {
        let mut agg = aggregator();
        agg.accept(sample(1, 0, 10.0));
        agg.accept(sample(2, 0, 20.0));
        agg.accept(sample(3, 0, 30.0));
        let summaries = agg.flush_all();
        assert_eq!(summaries.len(), 3);
        assert_eq!(agg.active_targets(), 0);
    }
}
