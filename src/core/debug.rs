//! Frame statistics shown in the developer panel

use std::collections::VecDeque;
use std::time::Duration;

/// Rolling frame-time window
#[derive(Debug)]
pub struct FrameStats {
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    /// Sum of `frame_times`
    window_total: Duration,
    total_frames: u64,
}

impl FrameStats {
    const DEFAULT_SAMPLES: usize = 120;

    pub fn new() -> Self {
        Self::with_samples(Self::DEFAULT_SAMPLES)
    }

    /// Tracker averaging over the last `samples` frames
    pub fn with_samples(samples: usize) -> Self {
        let samples = samples.max(1);
        Self {
            frame_times: VecDeque::with_capacity(samples),
            max_samples: samples,
            window_total: Duration::ZERO,
            total_frames: 0,
        }
    }

    /// Record a frame with the given delta time
    pub fn record_frame(&mut self, delta: Duration) {
        self.total_frames += 1;

        if self.frame_times.len() >= self.max_samples
            && let Some(oldest) = self.frame_times.pop_front()
        {
            self.window_total = self.window_total.saturating_sub(oldest);
        }
        self.frame_times.push_back(delta);
        self.window_total += delta;
    }

    /// Frames per second over the window; 0 until time has passed
    pub fn fps(&self) -> f32 {
        let total = self.window_total.as_secs_f32();
        if total > 0.0 {
            self.frame_times.len() as f32 / total
        } else {
            0.0
        }
    }

    /// Average frame time in milliseconds
    pub fn avg_frame_time_ms(&self) -> f32 {
        if self.frame_times.is_empty() {
            return 0.0;
        }
        self.window_total.as_secs_f32() * 1000.0 / self.frame_times.len() as f32
    }

    /// Slowest frame in the window, in milliseconds
    pub fn max_frame_time_ms(&self) -> f32 {
        self.frame_times
            .iter()
            .max()
            .map_or(0.0, |d| d.as_secs_f32() * 1000.0)
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Get a formatted stats string
    pub fn format_stats(&self) -> String {
        format!(
            "FPS: {:.1} | Frame: {:.2}ms (max: {:.2})",
            self.fps(),
            self.avg_frame_time_ms(),
            self.max_frame_time_ms()
        )
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Debug overlay state
#[derive(Debug)]
pub struct DebugInfo {
    /// Whether the developer panel is shown
    pub enabled: bool,
    pub frame_stats: FrameStats,
    /// Lines set by the game for the current frame
    lines: Vec<String>,
}

impl DebugInfo {
    pub fn new() -> Self {
        Self {
            enabled: true,
            frame_stats: FrameStats::new(),
            lines: Vec::new(),
        }
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    /// Add a line for this frame
    pub fn add_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// Stats line followed by this frame's lines
    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        std::iter::once(self.frame_stats.format_stats()).chain(self.lines.iter().cloned())
    }

    /// Record a frame and drop the previous frame's lines
    pub fn record_frame(&mut self, delta: Duration) {
        self.frame_stats.record_frame(delta);
        self.lines.clear();
    }
}

impl Default for DebugInfo {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fps_over_window() {
        let mut stats = FrameStats::with_samples(4);
        for _ in 0..10 {
            stats.record_frame(Duration::from_millis(20));
        }
        assert!((stats.fps() - 50.0).abs() < 0.01);
        assert!((stats.avg_frame_time_ms() - 20.0).abs() < 0.01);
        assert_eq!(stats.total_frames(), 10);
    }

    #[test]
    fn test_window_drops_old_samples() {
        let mut stats = FrameStats::with_samples(2);
        stats.record_frame(Duration::from_millis(100));
        stats.record_frame(Duration::from_millis(10));
        stats.record_frame(Duration::from_millis(10));
        assert!((stats.max_frame_time_ms() - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_stats() {
        let stats = FrameStats::new();
        assert_eq!(stats.fps(), 0.0);
        assert_eq!(stats.avg_frame_time_ms(), 0.0);
    }

    #[test]
    fn test_lines_reset_each_frame() {
        let mut debug = DebugInfo::new();
        debug.add_line("grid 10x10");
        assert_eq!(debug.lines().count(), 2);
        debug.record_frame(Duration::from_millis(16));
        assert_eq!(debug.lines().count(), 1);
    }
}
