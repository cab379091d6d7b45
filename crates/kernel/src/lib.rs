//! Frame kernel: fixed-timestep accumulator, cooperative task queue, timers.
//!
//! # Invariants
//! - Simulation advances only in whole `step`-sized increments; the display
//!   rate never changes the step length.
//! - Tasks run in insertion order; a completed task is removed after the
//!   step that completed it.
//! - Everything here runs on the caller's thread; there is no background work.

mod clock;
mod error;
mod scheduler;
mod stats;
mod timer;

pub use clock::{DEFAULT_STEP, FrameClock};
pub use error::{SchedulerError, TaskError};
pub use scheduler::{FnTask, Scheduler, Task, TaskId};
pub use stats::FrameStats;
pub use timer::{Timer, TimerTask, timer};

pub fn crate_info() -> &'static str {
    "viewport-kernel v0.1.0"
}
