//! Tap tempo estimation.
//!
//! Keeps the last few tap timestamps and turns the mean gap between them
//! into a whole-number tempo.
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Taps kept in the sliding window.
pub const TAP_WINDOW: usize = 4;
/// A gap longer than this starts a fresh tap sequence.
pub const TAP_RESET: Duration = Duration::from_secs(2);

#[derive(Debug)]
pub struct TapTempo {
    taps: Mutex<VecDeque<Instant>>,
    window: usize,
    reset_after: Duration,
}

impl Default for TapTempo {
    fn default() -> Self {
        Self::new()
    }
}

impl TapTempo {
    pub fn new() -> Self {
        Self::with_limits(TAP_WINDOW, TAP_RESET)
    }

    pub fn with_limits(window: usize, reset_after: Duration) -> Self {
        Self {
            taps: Mutex::new(VecDeque::with_capacity(window + 1)),
            window: window.max(2),
            reset_after,
        }
    }

    /// Register a tap at `now` and return the new tempo estimate, if any.
    ///
    /// A lone tap (first of a sequence, or first after a stale gap) never
    /// produces an estimate.
    pub fn tap(&self, now: Instant) -> Option<f64> {
        let mut taps = self.taps.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(&last) = taps.back() {
            if now.saturating_duration_since(last) > self.reset_after {
                log::debug!("Tap gap exceeded {:?}, starting new sequence", self.reset_after);
                taps.clear();
            }
        }

        taps.push_back(now);
        while taps.len() > self.window {
            taps.pop_front();
        }

        let mean = mean_interval(&taps)?;
        let seconds = mean.as_secs_f64();
        if seconds > 0.0 {
            Some((60.0 / seconds).round())
        } else {
            None
        }
    }

    pub fn len(&self) -> usize {
        self.taps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.taps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

fn mean_interval(taps: &VecDeque<Instant>) -> Option<Duration> {
    if taps.len() < 2 {
        return None;
    }
    let total: Duration = taps
        .iter()
        .zip(taps.iter().skip(1))
        .map(|(earlier, later)| later.saturating_duration_since(*earlier))
        .sum();
    Some(total / (taps.len() - 1) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, seconds: f64) -> Instant {
        base + Duration::from_secs_f64(seconds)
    }

    #[test]
    fn test_window_evicts_oldest() {
        let tapper = TapTempo::new();
        let base = Instant::now();
        for i in 0..6 {
            tapper.tap(at(base, i as f64 * 0.5));
        }
        assert_eq!(tapper.len(), TAP_WINDOW);
    }

    #[test]
    fn test_identical_timestamps_give_no_estimate() {
        let tapper = TapTempo::new();
        let now = Instant::now();
        assert_eq!(tapper.tap(now), None);
        assert_eq!(tapper.tap(now), None);
    }

    #[test]
    fn test_only_recent_intervals_count() {
        let tapper = TapTempo::new();
        let base = Instant::now();
        // One slow gap, then three fast ones push it out of the window.
        tapper.tap(at(base, 0.0));
        tapper.tap(at(base, 1.0));
        tapper.tap(at(base, 1.4));
        tapper.tap(at(base, 1.8));
        let bpm = tapper.tap(at(base, 2.2));
        assert_eq!(bpm, Some(150.0));
    }
}
