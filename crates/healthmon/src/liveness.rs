use std::time::{Duration, Instant};

/// Default time without a block number advance before a node counts as stalled.
pub const DEFAULT_STALL_THRESHOLD: Duration = Duration::from_secs(60);

/// Tracks forward progress of a single node's block number.
///
/// The stall clock only restarts when a strictly higher number is observed.
/// Repeated numbers and regressions (restart, reorg) leave it running, but a
/// regression becomes the baseline for the next comparison.
#[derive(Debug, Clone)]
pub struct LivenessTracker {
    last_observed: Option<u64>,
    last_advance: Instant,
    stall_threshold: Duration,
}

impl LivenessTracker {
    pub fn new(stall_threshold: Duration) -> Self {
        Self::new_at(stall_threshold, Instant::now())
    }

    pub fn new_at(stall_threshold: Duration, now: Instant) -> Self {
        Self {
            last_observed: None,
            last_advance: now,
            stall_threshold,
        }
    }

    pub fn stall_threshold(&self) -> Duration {
        self.stall_threshold
    }

    pub fn last_observed(&self) -> Option<u64> {
        self.last_observed
    }

    pub fn observe(&mut self, number: u64) {
        self.observe_at(number, Instant::now());
    }

    pub fn observe_at(&mut self, number: u64, now: Instant) {
        match self.last_observed {
            Some(last) if number <= last => {
                if number < last {
                    tracing::warn!(
                        "block number went backwards from {} to {}, stall clock kept",
                        last,
                        number
                    );
                    self.last_observed = Some(number);
                }
            }
            _ => {
                self.last_observed = Some(number);
                self.last_advance = now;
            }
        }
    }

    /// Returns the time since the last advance if it exceeds the stall threshold.
    pub fn check_liveness(&self) -> Result<(), Duration> {
        self.check_liveness_at(Instant::now())
    }

    pub fn check_liveness_at(&self, now: Instant) -> Result<(), Duration> {
        let elapsed = now.saturating_duration_since(self.last_advance);
        if elapsed > self.stall_threshold {
            return Err(elapsed);
        }
        Ok(())
    }
}

impl Default for LivenessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_STALL_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: Duration = Duration::from_secs(60);

    #[test]
    fn test_increasing_numbers_never_stall() {
        let start = Instant::now();
        let mut tracker = LivenessTracker::new_at(THRESHOLD, start);

        for (i, number) in [10u64, 11, 12].into_iter().enumerate() {
            let now = start + Duration::from_secs(50 * (i as u64 + 1));
            tracker.observe_at(number, now);
            assert!(tracker.check_liveness_at(now).is_ok());
        }
        assert_eq!(tracker.last_observed(), Some(12));
    }

    #[test]
    fn test_repeated_number_stalls() {
        let start = Instant::now();
        let mut tracker = LivenessTracker::new_at(THRESHOLD, start);

        tracker.observe_at(10, start);
        tracker.observe_at(10, start + Duration::from_secs(30));
        assert!(tracker.check_liveness_at(start + Duration::from_secs(30)).is_ok());

        let now = start + Duration::from_secs(61);
        tracker.observe_at(10, now);
        assert_eq!(
            tracker.check_liveness_at(now),
            Err(Duration::from_secs(61))
        );
    }

    #[test]
    fn test_grace_period_from_construction() {
        let start = Instant::now();
        let tracker = LivenessTracker::new_at(THRESHOLD, start);

        assert!(tracker.check_liveness_at(start + THRESHOLD).is_ok());
        assert!(
            tracker
                .check_liveness_at(start + THRESHOLD + Duration::from_secs(1))
                .is_err()
        );
    }

    #[test]
    fn test_regression_does_not_reset_clock() {
        let start = Instant::now();
        let mut tracker = LivenessTracker::new_at(THRESHOLD, start);

        tracker.observe_at(100, start);
        tracker.observe_at(90, start + Duration::from_secs(40));
        assert_eq!(tracker.last_observed(), Some(90));

        // 95 is an advance over the new baseline
        tracker.observe_at(95, start + Duration::from_secs(70));
        assert!(
            tracker
                .check_liveness_at(start + Duration::from_secs(70))
                .is_ok()
        );
    }

    #[test]
    fn test_regression_alone_stalls() {
        let start = Instant::now();
        let mut tracker = LivenessTracker::new_at(THRESHOLD, start);

        tracker.observe_at(100, start);
        tracker.observe_at(50, start + Duration::from_secs(61));
        assert!(
            tracker
                .check_liveness_at(start + Duration::from_secs(61))
                .is_err()
        );
    }
}
