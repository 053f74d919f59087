//! # Frame Statistics
//!
//! Rolling frame-time window for the render loop. Statistics are written to the log
//! at `debug` level every few seconds, so run with `RUST_LOG=pastel_park=debug` to
//! see them.
//!
//! ```rust
//! use pastel_park::performance::FrameTimer;
//!
//! let mut timer = FrameTimer::new();
//! timer.begin_frame();
//! // ... tick and render ...
//! timer.end_frame();
//! ```

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Summary of the frames currently in the window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub fps: f32,
    /// Average frame time in milliseconds
    pub frame_time_ms: f32,
    pub min_frame_time_ms: f32,
    pub max_frame_time_ms: f32,
    /// Number of draw calls in the last frame
    pub draw_calls: u32,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self {
            fps: 0.0,
            frame_time_ms: 0.0,
            min_frame_time_ms: 0.0,
            max_frame_time_ms: 0.0,
            draw_calls: 0,
        }
    }
}

pub struct FrameTimer {
    /// Ring buffer of recent frame times
    frame_times: VecDeque<Duration>,
    max_samples: usize,
    frame_start: Option<Instant>,
    stats: FrameStats,
    last_report: Instant,
    report_interval: Duration,
}

impl FrameTimer {
    pub fn new() -> Self {
        // ~2 seconds at 60fps
        Self::with_config(120, Duration::from_secs(5))
    }

    pub fn with_config(max_samples: usize, report_interval: Duration) -> Self {
        Self {
            frame_times: VecDeque::with_capacity(max_samples),
            max_samples: max_samples.max(1),
            frame_start: None,
            stats: FrameStats::default(),
            last_report: Instant::now(),
            report_interval,
        }
    }

    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Records the frame started by `begin_frame` and logs when a report is due
    pub fn end_frame(&mut self) {
        if let Some(start) = self.frame_start.take() {
            self.record(start.elapsed());

            if self.last_report.elapsed() >= self.report_interval {
                let stats = self.stats;
                log::debug!(
                    "{:.1} fps, frame {:.2}ms (min {:.2}ms, max {:.2}ms), {} draw calls",
                    stats.fps,
                    stats.frame_time_ms,
                    stats.min_frame_time_ms,
                    stats.max_frame_time_ms,
                    stats.draw_calls
                );
                self.last_report = Instant::now();
            }
        }
    }

    /// Adds one frame time sample and refreshes the statistics
    pub fn record(&mut self, frame_time: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(frame_time);
        self.update_stats();
    }

    fn update_stats(&mut self) {
        if self.frame_times.is_empty() {
            return;
        }

        let total_time: Duration = self.frame_times.iter().sum();
        let avg_frame_time_ms =
            total_time.as_secs_f32() * 1000.0 / self.frame_times.len() as f32;

        self.stats.frame_time_ms = avg_frame_time_ms;
        self.stats.fps = if avg_frame_time_ms > 0.0 {
            1000.0 / avg_frame_time_ms
        } else {
            0.0
        };

        if let (Some(min_time), Some(max_time)) =
            (self.frame_times.iter().min(), self.frame_times.iter().max())
        {
            self.stats.min_frame_time_ms = min_time.as_secs_f32() * 1000.0;
            self.stats.max_frame_time_ms = max_time.as_secs_f32() * 1000.0;
        }
    }

    pub fn set_draw_calls(&mut self, draw_calls: u32) {
        self.stats.draw_calls = draw_calls;
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn sample_count(&self) -> usize {
        self.frame_times.len()
    }
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_over_window() {
        let mut timer = FrameTimer::with_config(4, Duration::from_secs(60));
        for ms in [10, 20, 30, 40] {
            timer.record(Duration::from_millis(ms));
        }

        let stats = timer.stats();
        assert!((stats.frame_time_ms - 25.0).abs() < 1e-3);
        assert!((stats.fps - 40.0).abs() < 1e-2);
        assert!((stats.min_frame_time_ms - 10.0).abs() < 1e-3);
        assert!((stats.max_frame_time_ms - 40.0).abs() < 1e-3);
    }

    #[test]
    fn test_window_drops_oldest_samples() {
        let mut timer = FrameTimer::with_config(2, Duration::from_secs(60));
        for ms in [100, 10, 10] {
            timer.record(Duration::from_millis(ms));
        }

        assert_eq!(timer.sample_count(), 2);
        assert!((timer.stats().max_frame_time_ms - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_end_frame_without_begin_is_ignored() {
        let mut timer = FrameTimer::new();
        timer.end_frame();
        assert_eq!(timer.sample_count(), 0);

        timer.begin_frame();
        timer.end_frame();
        assert_eq!(timer.sample_count(), 1);
    }
}
