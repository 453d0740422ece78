//! Time-bounded scroll interpolation.
//!
//! The engine updates the logical scroll offset immediately; the tween
//! only exists so a presenter can sample a smoothed offset while the
//! animation runs. A new scroll command replaces the in-flight tween,
//! re-anchored at its current sample.

use std::time::{Duration, Instant};

/// Linear interpolation from `from` to `to` over `duration`.
#[derive(Debug, Clone, Copy)]
pub struct ScrollTween {
    pub from: i32,
    pub to: i32,
    pub started: Instant,
    pub duration: Duration,
}

impl ScrollTween {
    pub fn new(from: i32, to: i32, started: Instant, duration: Duration) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    /// Offset at `now`, clamped to the end value once the duration has
    /// elapsed (or when the duration is zero).
    pub fn sample(&self, now: Instant) -> i32 {
        if self.duration.is_zero() {
            return self.to;
        }
        let elapsed = now.saturating_duration_since(self.started);
        if elapsed >= self.duration {
            return self.to;
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let span = f64::from(self.to - self.from);
        self.from + (span * t).round() as i32
    }

    pub fn is_finished(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.started) >= self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_linearly() {
        let start = Instant::now();
        let tween = ScrollTween::new(0, 100, start, Duration::from_millis(100));
        assert_eq!(tween.sample(start), 0);
        assert_eq!(tween.sample(start + Duration::from_millis(50)), 50);
        assert_eq!(tween.sample(start + Duration::from_millis(100)), 100);
        // Past the end it stays pinned.
        assert_eq!(tween.sample(start + Duration::from_millis(500)), 100);
    }

    #[test]
    fn zero_duration_jumps() {
        let start = Instant::now();
        let tween = ScrollTween::new(40, 7, start, Duration::ZERO);
        assert_eq!(tween.sample(start), 7);
        assert!(tween.is_finished(start));
    }

    #[test]
    fn samples_downward_motion() {
        let start = Instant::now();
        let tween = ScrollTween::new(200, 0, start, Duration::from_millis(100));
        assert_eq!(tween.sample(start + Duration::from_millis(25)), 150);
    }
}
