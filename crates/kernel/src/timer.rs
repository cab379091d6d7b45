use std::time::Duration;

use crate::error::TaskError;
use crate::scheduler::Task;

/// Accumulates step time and fires once `interval` has been reached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timer {
    interval: Duration,
    accumulated: Duration,
}

impl Timer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulated: Duration::ZERO,
        }
    }

    /// Add `dt`. Returns the accumulated time and resets when it reached
    /// the interval.
    pub fn tick(&mut self, dt: Duration) -> Option<Duration> {
        self.accumulated += dt;
        if self.accumulated >= self.interval {
            let fired = self.accumulated;
            self.accumulated = Duration::ZERO;
            Some(fired)
        } else {
            None
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

/// A never-finishing task that calls `callback` at most once per interval.
pub struct TimerTask<F> {
    timer: Timer,
    callback: F,
}

/// Throttle `callback` to run only when accumulated step time crosses
/// `interval`. The callback receives the accumulated time.
pub fn timer<C, F>(interval: Duration, callback: F) -> TimerTask<F>
where
    F: FnMut(&mut C, Duration),
{
    TimerTask {
        timer: Timer::new(interval),
        callback,
    }
}

impl<C, F> Task<C> for TimerTask<F>
where
    F: FnMut(&mut C, Duration),
{
    fn execute(&mut self, ctx: &mut C, dt: Duration) -> Result<bool, TaskError> {
        if let Some(elapsed) = self.timer.tick(dt) {
            (self.callback)(ctx, elapsed);
        }
        Ok(false)
    }

    fn name(&self) -> &str {
        "timer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Scheduler;

    #[test]
    fn fires_when_interval_reached() {
        let mut t = Timer::new(Duration::from_millis(20));
        assert_eq!(t.tick(Duration::from_millis(8)), None);
        assert_eq!(t.tick(Duration::from_millis(8)), None);
        assert_eq!(t.tick(Duration::from_millis(8)), Some(Duration::from_millis(24)));
        // Resets to zero, not to the overshoot.
        assert_eq!(t.tick(Duration::from_millis(8)), None);
    }

    #[test]
    fn timer_task_throttles_callback() {
        let mut sched: Scheduler<Vec<Duration>> = Scheduler::new();
        let mut fired: Vec<Duration> = Vec::new();
        sched.add_task(timer(Duration::from_millis(10), |log: &mut Vec<Duration>, acc| {
            log.push(acc)
        }));
        for _ in 0..6 {
            sched.run(&mut fired, Duration::from_millis(4)).unwrap();
        }
        assert_eq!(fired, vec![Duration::from_millis(12), Duration::from_millis(12)]);
        assert_eq!(sched.len(), 1);
    }
}
