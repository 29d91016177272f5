//! One-shot delayed tasks on an explicitly driven clock.
//!
//! The frontends advance the clock once per frame with the wall time that
//! passed; tests advance it by hand. Nothing here reads the system clock.

use std::time::Duration;

/// Handle returned by [`Schedule::schedule`], used to cancel a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

#[derive(Debug)]
struct Pending<T> {
    id: TaskId,
    deadline: Duration,
    task: T,
}

#[derive(Debug)]
pub struct Schedule<T> {
    now: Duration,
    next_id: u64,
    pending: Vec<Pending<T>>,
}

impl<T> Default for Schedule<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Schedule<T> {
    pub fn new() -> Self {
        Schedule {
            now: Duration::ZERO,
            next_id: 0,
            pending: Vec::new(),
        }
    }

    /// Time elapsed since the schedule was created.
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Queues `task` to fire once `delay` has elapsed.
    pub fn schedule(&mut self, delay: Duration, task: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            deadline: self.now + delay,
            task,
        });
        id
    }

    /// Removes a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Drops every pending task and returns how many there were.
    pub fn cancel_all(&mut self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    /// Moves the clock forward and returns the tasks that came due, earliest
    /// deadline first; ties keep scheduling order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<(TaskId, T)> {
        self.now += elapsed;
        let now = self.now;

        let (mut due, waiting): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|p| p.deadline <= now);
        self.pending = waiting;

        due.sort_by_key(|p| (p.deadline, p.id));
        due.into_iter().map(|p| (p.id, p.task)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn fires_once_after_delay() {
        let mut schedule = Schedule::new();
        schedule.schedule(ms(100), "a");

        assert!(schedule.advance(ms(99)).is_empty());
        let fired: Vec<_> = schedule.advance(ms(1)).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec!["a"]);
        assert!(schedule.advance(ms(1000)).is_empty());
        assert_eq!(schedule.pending(), 0);
    }

    #[test]
    fn due_tasks_come_out_in_deadline_order() {
        let mut schedule = Schedule::new();
        schedule.schedule(ms(300), 3);
        schedule.schedule(ms(100), 1);
        schedule.schedule(ms(200), 2);
        schedule.schedule(ms(100), 4);

        let fired: Vec<_> = schedule.advance(ms(500)).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec![1, 4, 2, 3]);
    }

    #[test]
    fn cancelled_task_never_fires() {
        let mut schedule = Schedule::new();
        let keep = schedule.schedule(ms(10), "keep");
        let drop = schedule.schedule(ms(10), "drop");

        assert!(schedule.cancel(drop));
        assert!(!schedule.cancel(drop));
        assert!(schedule.is_pending(keep));

        let fired: Vec<_> = schedule.advance(ms(10)).into_iter().map(|(_, t)| t).collect();
        assert_eq!(fired, vec!["keep"]);
    }

    #[test]
    fn cancel_all_clears_everything() {
        let mut schedule = Schedule::new();
        schedule.schedule(ms(10), ());
        schedule.schedule(ms(20), ());
        assert_eq!(schedule.cancel_all(), 2);
        assert!(schedule.advance(ms(100)).is_empty());
    }

    #[test]
    fn delays_are_relative_to_current_clock() {
        let mut schedule = Schedule::new();
        schedule.advance(ms(1000));
        schedule.schedule(ms(50), "late");
        assert!(schedule.advance(ms(49)).is_empty());
        assert_eq!(schedule.advance(ms(1)).len(), 1);
        assert_eq!(schedule.now(), ms(1050));
    }
}
