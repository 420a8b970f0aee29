use radarcore::pipeline::IngressHandle;
use radarcore::sensor::{Detection, TargetId};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::watch;

/// Configuration for the synthetic rear-view detection feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Upper bound on simultaneously tracked vehicles.
    pub max_targets: usize,
    /// Size of the id pool; ids are recycled once a vehicle passes.
    pub id_pool: u32,
    pub seed: u64,
    pub notify_interval_ms: u64,
    /// Chance per notification that a new vehicle appears.
    pub arrival_probability: f64,
    pub speed_kmh: (f64, f64),
    pub start_distance_m: (f64, f64),
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            max_targets: 3,
            id_pool: 8,
            seed: 0,
            notify_interval_ms: 250,
            arrival_probability: 0.05,
            speed_kmh: (15.0, 70.0),
            start_distance_m: (120.0, 200.0),
        }
    }
}

impl FeedConfig {
    fn normalized_pool(&self) -> u32 {
        self.id_pool.max(1)
    }
}

#[derive(Debug, Clone)]
struct Track {
    id: TargetId,
    speed_kmh: f64,
    distance_m: f64,
}

/// Simulates vehicles closing in from behind the rider. Each call to
/// [`SyntheticFeed::next_batch`] corresponds to one radar notification.
pub struct SyntheticFeed {
    config: FeedConfig,
    rng: StdRng,
    tracks: Vec<Track>,
}

impl SyntheticFeed {
    pub fn new(config: FeedConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng,
            tracks: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn active_tracks(&self) -> usize {
        self.tracks.len()
    }

    fn free_id(&self) -> Option<TargetId> {
        (1..=self.config.normalized_pool())
            .map(TargetId)
            .find(|id| self.tracks.iter().all(|track| track.id != *id))
    }

    fn maybe_spawn(&mut self) {
        if self.tracks.len() >= self.config.max_targets {
            return;
        }
        if !self.rng.gen_bool(self.config.arrival_probability.clamp(0.0, 1.0)) {
            return;
        }
        let Some(id) = self.free_id() else {
            return;
        };
        let (speed_lo, speed_hi) = self.config.speed_kmh;
        let (dist_lo, dist_hi) = self.config.start_distance_m;
        let track = Track {
            id,
            speed_kmh: sample_range(&mut self.rng, speed_lo, speed_hi),
            distance_m: sample_range(&mut self.rng, dist_lo, dist_hi),
        };
        self.tracks.push(track);
    }

    pub fn next_batch(&mut self) -> Vec<Detection> {
        self.maybe_spawn();

        let dt = self.config.notify_interval_ms as f64 / 1000.0;
        let mut batch = Vec::with_capacity(self.tracks.len());
        for track in &mut self.tracks {
            track.speed_kmh = (track.speed_kmh + self.rng.gen_range(-1.0..=1.0)).max(0.0);
            track.distance_m -= track.speed_kmh / 3.6 * dt;
            if track.distance_m > 0.0 {
                batch.push(Detection::new(
                    track.id.0,
                    track.speed_kmh.round(),
                    track.distance_m.round(),
                ));
            }
        }
        self.tracks.retain(|track| track.distance_m > 0.0);
        batch
    }
}

fn sample_range(rng: &mut StdRng, lo: f64, hi: f64) -> f64 {
    if hi > lo {
        rng.gen_range(lo..hi)
    } else {
        lo
    }
}

/// Pushes one batch per notification interval until `stop` flips or the
/// consumer goes away. Returns the number of detections enqueued.
pub async fn run_feed(
    mut feed: SyntheticFeed,
    handle: IngressHandle,
    mut stop: watch::Receiver<bool>,
) -> usize {
    let period = Duration::from_millis(feed.config.notify_interval_ms.max(1));
    let mut ticker = tokio::time::interval(period);
    let mut pushed = 0;

    loop {
        tokio::select! {
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                if handle.is_closed() {
                    break;
                }
                pushed += handle.push_batch(feed.next_batch());
            }
        }
    }

    log::debug!("synthetic feed stopped after {} detections", pushed);
    pushed
}
