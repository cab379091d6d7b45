use std::collections::VecDeque;
use std::time::Duration;

/// Rolling window of recent frame durations.
#[derive(Debug, Clone)]
pub struct FrameStats {
    window: VecDeque<Duration>,
    capacity: usize,
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new(60)
    }
}

impl FrameStats {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, dt: Duration) {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(dt);
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn average(&self) -> Duration {
        if self.window.is_empty() {
            return Duration::ZERO;
        }
        self.window.iter().sum::<Duration>() / self.window.len() as u32
    }

    pub fn worst(&self) -> Duration {
        self.window.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    /// Frames per second over the window, 0 when empty.
    pub fn fps(&self) -> f32 {
        let avg = self.average().as_secs_f32();
        if avg > 0.0 { 1.0 / avg } else { 0.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_recent_frames() {
        let mut stats = FrameStats::new(3);
        for ms in [10, 20, 30] {
            stats.record(Duration::from_millis(ms));
        }
        assert_eq!(stats.average(), Duration::from_millis(20));
        assert_eq!(stats.worst(), Duration::from_millis(30));
        assert!((stats.fps() - 50.0).abs() < 0.01);
    }

    #[test]
    fn window_drops_oldest() {
        let mut stats = FrameStats::new(2);
        for ms in [100, 10, 20] {
            stats.record(Duration::from_millis(ms));
        }
        assert_eq!(stats.len(), 2);
        assert_eq!(stats.worst(), Duration::from_millis(20));
    }

    #[test]
    fn empty_window_reports_zero() {
        let stats = FrameStats::default();
        assert!(stats.is_empty());
        assert_eq!(stats.fps(), 0.0);
    }
}
