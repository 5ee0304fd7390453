use super::powerup::PowerUpKind;
use std::time::Duration;

/// Deferred work owned by a session
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub(crate) enum Task {
    /// Try to spawn a power-up, then schedule the next attempt
    SpawnPowerUp,
    /// The given buff's duration has run out
    BuffExpiry(PowerUpKind),
    /// Immunity wanted to end but the head was overlapping something; look
    /// again
    ImmunityCheck,
    /// The obstacle glitch transition is over
    GlitchEnd,
    /// Advance the pre-game countdown
    CountdownStep,
}

/// Identifies one scheduled task.  Handles from before the last
/// [`Scheduler::cancel_all()`] belong to an earlier epoch and are never
/// honored again.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub(crate) struct TaskHandle {
    epoch: u64,
    id: u64,
}

#[derive(Clone, Debug, Eq, PartialEq)]
struct Entry {
    due: Duration,
    handle: TaskHandle,
    task: Task,
}

/// A set of one-shot timers keyed on the session clock.  Nothing fires on
/// its own; the owner drains due tasks with [`Scheduler::pop_due()`] once per
/// frame.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct Scheduler {
    epoch: u64,
    next_id: u64,
    pending: Vec<Entry>,
}

impl Scheduler {
    pub(crate) fn new() -> Scheduler {
        Scheduler::default()
    }

    /// Arrange for `task` to come due at `due`
    pub(crate) fn schedule(&mut self, task: Task, due: Duration) -> TaskHandle {
        let handle = TaskHandle {
            epoch: self.epoch,
            id: self.next_id,
        };
        self.next_id += 1;
        self.pending.push(Entry { due, handle, task });
        handle
    }

    /// Cancel a pending task.  Returns `false` if the task already fired, was
    /// already canceled, or belongs to an earlier epoch.
    pub(crate) fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|e| e.handle != handle);
        self.pending.len() != before
    }

    /// Drop every pending task and start a new epoch
    pub(crate) fn cancel_all(&mut self) {
        self.pending.clear();
        self.epoch += 1;
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self, handle: TaskHandle) -> bool {
        self.pending.iter().any(|e| e.handle == handle)
    }

    /// Was `handle` issued in the current epoch?
    pub(crate) fn is_current(&self, handle: TaskHandle) -> bool {
        handle.epoch == self.epoch
    }

    /// Remove and return the earliest task due at or before `now`.  Tasks
    /// due at the same instant come out in the order they were scheduled.
    pub(crate) fn pop_due(&mut self, now: Duration) -> Option<(TaskHandle, Task)> {
        let i = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, e)| e.due <= now)
            .min_by_key(|(_, e)| (e.due, e.handle))
            .map(|(i, _)| i)?;
        let entry = self.pending.swap_remove(i);
        Some((entry.handle, entry.task))
    }

    /// When the given task is due, if it is still pending
    #[cfg(test)]
    pub(crate) fn due(&self, handle: TaskHandle) -> Option<Duration> {
        self.pending
            .iter()
            .find(|e| e.handle == handle)
            .map(|e| e.due)
    }

    pub(crate) fn len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
