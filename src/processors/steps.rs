//! Step bookkeeping: refractory gate, cumulative count and cadence.

use std::collections::VecDeque;

/// Trailing window used for cadence, in seconds.
pub const CADENCE_WINDOW_SECS: f64 = 10.0;

/// Lower bound on the cadence window duration.
const MIN_CADENCE_DURATION: f64 = 1e-6;

/// Accepted step history for one session.
#[derive(Debug, Clone)]
pub struct StepTracker {
    min_interval: f64,
    /// Step times still inside the cadence window, strictly increasing.
    recent: VecDeque<f64>,
    count: u64,
    last_step: Option<f64>,
}

impl StepTracker {
    /// `min_interval` is the refractory period in seconds.
    pub fn new(min_interval: f64) -> Self {
        Self {
            min_interval,
            recent: VecDeque::new(),
            count: 0,
            last_step: None,
        }
    }

    /// True when a step at `now` would respect the refractory period.
    ///
    /// A step never lands at or before the previous one, so step times stay
    /// strictly increasing even with a zero interval or a clock going back.
    pub fn refractory_ok(&self, now: f64) -> bool {
        match self.last_step {
            None => true,
            Some(last) => now > last && now - last >= self.min_interval,
        }
    }

    /// Records a step at `now` and returns the time since the previous step.
    ///
    /// Callers check [`refractory_ok`](Self::refractory_ok) first.
    pub fn record(&mut self, now: f64) -> Option<f64> {
        let step_time = self.last_step.map(|last| now - last);

        self.recent.push_back(now);
        self.count += 1;
        self.last_step = Some(now);

        let lo = now - CADENCE_WINDOW_SECS;
        while self.recent.front().is_some_and(|&t| t < lo) {
            self.recent.pop_front();
        }

        step_time
    }

    /// Steps per minute over the trailing window ending at `now`.
    pub fn cadence(&self, now: f64) -> f64 {
        let lo = now - CADENCE_WINDOW_SECS;
        let start = self.recent.partition_point(|&t| t < lo);
        let in_window = self.recent.len() - start;

        let Some(&earliest) = self.recent.get(start) else {
            return 0.0;
        };

        let duration = (now - earliest)
            .max(MIN_CADENCE_DURATION)
            .min(CADENCE_WINDOW_SECS);
        60.0 * in_window as f64 / duration
    }

    /// Cumulative accepted steps.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    #[inline]
    pub fn last_step(&self) -> Option<f64> {
        self.last_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refractory_gate() {
        let mut steps = StepTracker::new(0.28);
        assert!(steps.refractory_ok(0.0));

        steps.record(1.0);
        assert!(!steps.refractory_ok(1.1));
        assert!(steps.refractory_ok(1.28));
        assert!(!steps.refractory_ok(0.5));
    }

    #[test]
    fn test_zero_interval_still_strictly_increasing() {
        let mut steps = StepTracker::new(0.0);
        steps.record(2.0);
        assert!(!steps.refractory_ok(2.0));
        assert!(steps.refractory_ok(2.001));
    }

    #[test]
    fn test_record_step_time() {
        let mut steps = StepTracker::new(0.28);
        assert_eq!(steps.record(1.0), None);
        let dt = steps.record(1.6).unwrap();
        assert!((dt - 0.6).abs() < 1e-12);
        assert_eq!(steps.count(), 2);
        assert_eq!(steps.last_step(), Some(1.6));
    }

    #[test]
    fn test_cadence_empty() {
        let steps = StepTracker::new(0.28);
        assert_eq!(steps.cadence(5.0), 0.0);
    }

    #[test]
    fn test_cadence_three_steps_over_four_seconds() {
        let mut steps = StepTracker::new(0.28);
        for t in [2.0, 4.0, 6.0] {
            steps.record(t);
        }
        assert!((steps.cadence(6.0) - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_cadence_window_expires() {
        let mut steps = StepTracker::new(0.28);
        steps.record(1.0);
        steps.record(2.0);

        // Both steps have left the 10 s window.
        assert_eq!(steps.cadence(12.5), 0.0);
        // Count is cumulative and unaffected.
        assert_eq!(steps.count(), 2);
    }

    #[test]
    fn test_cadence_duration_clamped_to_window() {
        let mut steps = StepTracker::new(0.28);
        steps.record(0.0);
        // 10 s after the only step: still in the window, duration capped.
        assert!((steps.cadence(10.0) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_cadence_single_fresh_step() {
        let mut steps = StepTracker::new(0.28);
        steps.record(3.0);
        // Duration floored, cadence large but finite.
        let cadence = steps.cadence(3.0);
        assert!(cadence.is_finite());
        assert!(cadence > 0.0);
    }
}
