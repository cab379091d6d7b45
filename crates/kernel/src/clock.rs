use std::time::Duration;

/// 1000/128 ms, exactly.
pub const DEFAULT_STEP: Duration = Duration::from_nanos(7_812_500);

/// Fixed-timestep accumulator driven by the display refresh callback.
///
/// Each call to [`FrameClock::advance`] adds the elapsed wall time and
/// returns how many whole steps are due. `Duration` arithmetic is exact, so
/// the number of steps only depends on the total elapsed time.
#[derive(Debug, Clone)]
pub struct FrameClock {
    step: Duration,
    accumulator: Duration,
    max_delta: Duration,
    started: bool,
    total_steps: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(DEFAULT_STEP)
    }
}

impl FrameClock {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            accumulator: Duration::ZERO,
            max_delta: Duration::from_millis(250),
            started: false,
            total_steps: 0,
        }
    }

    /// Clamp per-frame deltas to `max_delta` (long stalls, debugger pauses).
    pub fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = max_delta;
        self
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn accumulator(&self) -> Duration {
        self.accumulator
    }

    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Fraction of a step left in the accumulator, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        self.accumulator.as_secs_f32() / self.step.as_secs_f32()
    }

    /// Add elapsed wall time and return the number of steps to simulate.
    ///
    /// Frames flagged `initial_render` contribute nothing. The first regular
    /// frame contributes exactly one step regardless of `elapsed`.
    pub fn advance(&mut self, elapsed: Duration, initial_render: bool) -> u32 {
        let delta = if initial_render {
            Duration::ZERO
        } else if !self.started {
            self.started = true;
            self.step
        } else {
            elapsed.min(self.max_delta)
        };

        self.accumulator += delta;
        let mut steps = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            steps += 1;
        }
        self.total_steps += steps as u64;
        tracing::trace!(steps, accumulator = ?self.accumulator, "frame clock advanced");
        steps
    }

    /// Advance and call `on_step` once per due step with the step length.
    ///
    /// Stops at the first error; steps after it are dropped.
    pub fn run<E>(
        &mut self,
        elapsed: Duration,
        initial_render: bool,
        mut on_step: impl FnMut(Duration) -> Result<(), E>,
    ) -> Result<u32, E> {
        let steps = self.advance(elapsed, initial_render);
        for _ in 0..steps {
            on_step(self.step)?;
        }
        Ok(steps)
    }

    /// Forget accumulated time and the first-frame state.
    pub fn reset(&mut self) {
        self.accumulator = Duration::ZERO;
        self.started = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> FrameClock {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance(Duration::from_secs(3), false), 1);
        clock
    }

    #[test]
    fn first_frame_is_one_step() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance(Duration::from_secs(5), false), 1);
        assert_eq!(clock.accumulator(), Duration::ZERO);
    }

    #[test]
    fn initial_render_frames_add_nothing() {
        let mut clock = FrameClock::default();
        assert_eq!(clock.advance(Duration::from_millis(100), true), 0);
        assert_eq!(clock.accumulator(), Duration::ZERO);
        // The first-frame rule still applies afterwards.
        assert_eq!(clock.advance(Duration::from_millis(100), false), 1);
    }

    #[test]
    fn three_steps_regardless_of_chunking() {
        let step = DEFAULT_STEP;
        let chunkings: Vec<Vec<Duration>> = vec![
            vec![step * 3],
            vec![step, step, step],
            vec![step / 2, step / 2, step / 2, step / 2, step / 2, step / 2],
            vec![step / 2, step * 5 / 4, step * 5 / 4],
            vec![step / 4, step * 2, step * 3 / 4],
        ];
        for chunks in chunkings {
            let mut clock = started();
            let mut calls = Vec::new();
            for dt in &chunks {
                clock
                    .run::<()>(*dt, false, |s| {
                        calls.push(s);
                        Ok(())
                    })
                    .unwrap();
            }
            assert_eq!(calls.len(), 3, "chunks {chunks:?}");
            assert!(calls.iter().all(|&s| s == step));
            assert_eq!(clock.accumulator(), Duration::ZERO);
        }
    }

    #[test]
    fn remainder_carries_over() {
        let mut clock = started();
        assert_eq!(clock.advance(DEFAULT_STEP * 3 / 2, false), 1);
        assert_eq!(clock.accumulator(), DEFAULT_STEP / 2);
        assert!((clock.alpha() - 0.5).abs() < 1e-6);
        assert_eq!(clock.advance(DEFAULT_STEP / 2, false), 1);
    }

    #[test]
    fn long_stalls_are_clamped() {
        let mut clock = started().with_max_delta(DEFAULT_STEP * 4);
        assert_eq!(clock.advance(Duration::from_secs(10), false), 4);
        assert_eq!(clock.total_steps(), 5);
    }

    #[test]
    fn run_stops_on_error() {
        let mut clock = started();
        let mut seen = 0;
        let result = clock.run(DEFAULT_STEP * 3, false, |_| {
            seen += 1;
            if seen == 2 { Err("boom") } else { Ok(()) }
        });
        assert_eq!(result, Err("boom"));
        assert_eq!(seen, 2);
    }

    #[test]
    fn reset_restores_first_frame_rule() {
        let mut clock = started();
        clock.advance(DEFAULT_STEP / 3, false);
        clock.reset();
        assert_eq!(clock.accumulator(), Duration::ZERO);
        assert_eq!(clock.advance(Duration::from_secs(1), false), 1);
    }
}
