pub struct StatsHelper;

impl StatsHelper {
    /// Rounds half away from zero to one decimal place.
    pub fn round_tenth(value: f64) -> f64 {
        (value * 10.0).round() / 10.0
    }

    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    pub fn max(values: &[f64]) -> Option<f64> {
        values.iter().copied().reduce(f64::max)
    }

    /// Highest value left after discarding the fastest `floor(len * fraction)`
    /// entries.
    pub fn trimmed_max(values: &[f64], fraction: f64) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| b.total_cmp(a));
        let discard = (sorted.len() as f64 * fraction).floor() as usize;
        sorted.get(discard.min(sorted.len() - 1)).copied()
    }
}
