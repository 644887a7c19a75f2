//! Frame timing

use std::time::{Duration, Instant};

/// Frame clock
#[derive(Debug, Clone)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    delta: Duration,
    frame_count: u64,
}

impl Time {
    /// Longest step handed to the simulation; longer stalls are cut short
    pub const MAX_DELTA: Duration = Duration::from_millis(100);

    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advance to the current instant
    pub fn update(&mut self) {
        self.advance_to(Instant::now());
    }

    fn advance_to(&mut self, now: Instant) {
        self.delta = now.saturating_duration_since(self.last_frame).min(Self::MAX_DELTA);
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Time since the previous frame
    pub fn delta(&self) -> Duration {
        self.delta
    }

    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Seconds since the clock was created
    pub fn elapsed_seconds(&self) -> f32 {
        self.last_frame.duration_since(self.start).as_secs_f32()
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delta_is_clamped() {
        let mut time = Time::new();
        let later = time.last_frame + Duration::from_secs(5);
        time.advance_to(later);
        assert_eq!(time.delta(), Time::MAX_DELTA);
        assert_eq!(time.frame_count(), 1);
        assert!((time.elapsed_seconds() - 5.0).abs() < 1e-3);
    }

    #[test]
    fn test_delta_seconds() {
        let mut time = Time::new();
        let later = time.last_frame + Duration::from_millis(16);
        time.advance_to(later);
        assert!((time.delta_seconds() - 0.016).abs() < 1e-6);
    }
}
