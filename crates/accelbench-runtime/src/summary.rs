use std::fmt;

/// Aggregate view over a finished run, computed from the raw samples on demand.
#[derive(Clone, Debug, PartialEq)]
pub struct LatencySummary {
    pub count: usize,
    pub total_ms: f64,
    pub mean_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub std_dev_ms: f64,
    pub p50_ms: f64,
    pub p90_ms: f64,
    pub p99_ms: f64,
}

impl LatencySummary {
    pub fn from_samples(samples: &[f64]) -> Option<Self> {
        if samples.is_empty() {
            return None;
        }

        let count = samples.len();
        let total_ms: f64 = samples.iter().sum();
        let mean_ms = total_ms / count as f64;
        let variance = samples
            .iter()
            .map(|s| (s - mean_ms).powi(2))
            .sum::<f64>()
            / count as f64;

        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        Some(Self {
            count,
            total_ms,
            mean_ms,
            min_ms: sorted[0],
            max_ms: sorted[count - 1],
            std_dev_ms: variance.sqrt(),
            p50_ms: percentile(&sorted, 50.0),
            p90_ms: percentile(&sorted, 90.0),
            p99_ms: percentile(&sorted, 99.0),
        })
    }
}

/// Nearest-rank percentile of an ascending, non-empty slice.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = (pct * sorted.len() as f64 / 100.0).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}

impl fmt::Display for LatencySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "n={} total={:.2}ms mean={:.3}ms min={:.3}ms p50={:.3}ms p90={:.3}ms p99={:.3}ms max={:.3}ms sd={:.3}ms",
            self.count,
            self.total_ms,
            self.mean_ms,
            self.min_ms,
            self.p50_ms,
            self.p90_ms,
            self.p99_ms,
            self.max_ms,
            self.std_dev_ms
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_has_no_summary() {
        assert!(LatencySummary::from_samples(&[]).is_none());
    }

    #[test]
    fn order_independent_stats() {
        let samples: Vec<f64> = (1..=100).rev().map(f64::from).collect();
        let s = LatencySummary::from_samples(&samples).unwrap();
        assert_eq!(s.count, 100);
        assert_eq!(s.total_ms, 5050.0);
        assert_eq!(s.mean_ms, 50.5);
        assert_eq!(s.min_ms, 1.0);
        assert_eq!(s.max_ms, 100.0);
        assert_eq!(s.p50_ms, 50.0);
        assert_eq!(s.p90_ms, 90.0);
        assert_eq!(s.p99_ms, 99.0);
    }

    #[test]
    fn single_sample() {
        let s = LatencySummary::from_samples(&[2.5]).unwrap();
        assert_eq!(s.p50_ms, 2.5);
        assert_eq!(s.p99_ms, 2.5);
        assert_eq!(s.std_dev_ms, 0.0);
    }
}
