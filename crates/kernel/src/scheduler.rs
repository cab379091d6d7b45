use std::time::Duration;

use crate::error::{SchedulerError, TaskError};

/// Handle to a queued task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// A cooperative unit of work run once per simulation step.
///
/// `C` is the simulation context handed to every task (usually the scene).
pub trait Task<C> {
    /// Run one step. `Ok(true)` means the task is finished and leaves the
    /// queue after this step.
    fn execute(&mut self, ctx: &mut C, dt: Duration) -> Result<bool, TaskError>;

    fn name(&self) -> &str {
        "task"
    }
}

/// Adapts a closure into a [`Task`].
pub struct FnTask<F>(pub F);

impl<C, F> Task<C> for FnTask<F>
where
    F: FnMut(&mut C, Duration) -> bool,
{
    fn execute(&mut self, ctx: &mut C, dt: Duration) -> Result<bool, TaskError> {
        Ok((self.0)(ctx, dt))
    }

    fn name(&self) -> &str {
        "fn"
    }
}

/// Ordered queue of tasks run once per simulation step.
pub struct Scheduler<C> {
    queue: Vec<(TaskId, Box<dyn Task<C>>)>,
    next_id: u64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self {
            queue: Vec::new(),
            next_id: 0,
        }
    }
}

impl<C> std::fmt::Debug for Scheduler<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("tasks", &self.queue.iter().map(|(id, t)| (id, t.name())).collect::<Vec<_>>())
            .finish()
    }
}

impl<C> Scheduler<C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_task(&mut self, task: impl Task<C> + 'static) -> TaskId {
        self.add_boxed(Box::new(task))
    }

    pub fn add_boxed(&mut self, task: Box<dyn Task<C>>) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        tracing::debug!(?id, name = task.name(), "task queued");
        self.queue.push((id, task));
        id
    }

    /// Remove a task before it completes. Returns false if it is not queued.
    pub fn remove_task(&mut self, id: TaskId) -> bool {
        let before = self.queue.len();
        self.queue.retain(|(tid, _)| *tid != id);
        before != self.queue.len()
    }

    /// The task at the head of the queue.
    pub fn request_task(&self) -> Option<TaskId> {
        self.queue.first().map(|(id, _)| *id)
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.queue.iter().any(|(tid, _)| *tid == id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Execute every task once, in order, and drop the ones that finished.
    ///
    /// A failing task aborts the rest of the step. Tasks that finished
    /// before the failure are still removed.
    pub fn run(&mut self, ctx: &mut C, dt: Duration) -> Result<usize, SchedulerError> {
        let mut finished = Vec::new();
        let mut failure = None;

        for (id, task) in self.queue.iter_mut() {
            match task.execute(ctx, dt) {
                Ok(true) => finished.push(*id),
                Ok(false) => {}
                Err(source) => {
                    tracing::warn!(id = ?*id, name = task.name(), %source, "task failed");
                    failure = Some(SchedulerError::TaskFailed { id: *id, source });
                    break;
                }
            }
        }

        if !finished.is_empty() {
            self.queue.retain(|(id, _)| !finished.contains(id));
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(finished.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Countdown(u32);

    impl Task<Vec<&'static str>> for Countdown {
        fn execute(&mut self, log: &mut Vec<&'static str>, _dt: Duration) -> Result<bool, TaskError> {
            log.push("countdown");
            self.0 -= 1;
            Ok(self.0 == 0)
        }
    }

    struct Failing;

    impl Task<Vec<&'static str>> for Failing {
        fn execute(&mut self, _log: &mut Vec<&'static str>, _dt: Duration) -> Result<bool, TaskError> {
            Err(TaskError::Failed {
                name: "failing".into(),
                reason: "always".into(),
            })
        }
    }

    const DT: Duration = Duration::from_millis(8);

    #[test]
    fn completed_tasks_leave_after_their_step() {
        let mut sched: Scheduler<Vec<&'static str>> = Scheduler::new();
        let mut log = Vec::new();
        let id = sched.add_task(Countdown(2));
        assert_eq!(sched.run(&mut log, DT), Ok(0));
        assert!(sched.contains(id));
        assert_eq!(sched.run(&mut log, DT), Ok(1));
        assert!(sched.is_empty());
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn tasks_run_in_insertion_order() {
        let mut sched: Scheduler<Vec<&'static str>> = Scheduler::new();
        let mut log = Vec::new();
        sched.add_task(FnTask(|log: &mut Vec<&'static str>, _dt: Duration| {
            log.push("first");
            false
        }));
        sched.add_task(FnTask(|log: &mut Vec<&'static str>, _dt: Duration| {
            log.push("second");
            true
        }));
        sched.run(&mut log, DT).unwrap();
        assert_eq!(log, vec!["first", "second"]);
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn failure_aborts_remaining_tasks() {
        let mut sched: Scheduler<Vec<&'static str>> = Scheduler::new();
        let mut log = Vec::new();
        sched.add_task(Countdown(1));
        let bad = sched.add_task(Failing);
        sched.add_task(FnTask(|log: &mut Vec<&'static str>, _dt: Duration| {
            log.push("never");
            true
        }));

        let err = sched.run(&mut log, DT).unwrap_err();
        assert!(matches!(err, SchedulerError::TaskFailed { id, .. } if id == bad));
        assert_eq!(log, vec!["countdown"]);
        // The finished countdown is gone, the failing task stays queued.
        assert_eq!(sched.len(), 2);
        assert_eq!(sched.request_task(), Some(bad));
    }

    #[test]
    fn remove_and_request() {
        let mut sched: Scheduler<Vec<&'static str>> = Scheduler::new();
        let a = sched.add_task(Countdown(5));
        let b = sched.add_task(Countdown(5));
        assert_eq!(sched.request_task(), Some(a));
        assert!(sched.remove_task(a));
        assert!(!sched.remove_task(a));
        assert_eq!(sched.request_task(), Some(b));
    }

    #[test]
    fn dt_is_forwarded() {
        let mut sched: Scheduler<Duration> = Scheduler::new();
        let mut total = Duration::ZERO;
        sched.add_task(FnTask(|acc: &mut Duration, dt: Duration| {
            *acc += dt;
            false
        }));
        for _ in 0..4 {
            sched.run(&mut total, DT).unwrap();
        }
        assert_eq!(total, DT * 4);
    }
}
