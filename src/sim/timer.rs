//! Cancelable scheduled tasks
//!
//! Every delayed or periodic piece of game logic (countdown, spawn interval,
//! pending respawns, jump impulses, ground watchdog, lock retries) is a task
//! in a `Timers` queue. The owner advances the queue with its own clock and
//! cancels tasks when the phase that owns them ends, so a stale callback can
//! never reach a session that has been reset.

/// What a task does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// One-second round clock tick
    Countdown,
    /// Periodic edge spawn
    SpawnInterval,
    /// Replacement for a popped balloon
    PendingRespawn,
    /// Main jump impulse following the unstick pulse
    JumpImpulse,
    /// Periodic ground state reset
    GroundWatchdog,
    /// Second aim-capture attempt after a failed resume
    LockRetry,
}

/// Handle to a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone)]
struct Task {
    id: TimerId,
    kind: TimerKind,
    due_ms: u64,
    period_ms: Option<u64>,
}

/// A task that came due during `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub id: TimerId,
    pub kind: TimerKind,
    /// Clock time the task was due at
    pub at_ms: u64,
}

/// Task queue with its own millisecond clock
#[derive(Debug, Clone, Default)]
pub struct Timers {
    now_ms: u64,
    next_id: u64,
    tasks: Vec<Task>,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current clock time
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Run `kind` once after `delay_ms`
    pub fn schedule_once(&mut self, kind: TimerKind, delay_ms: u64) -> TimerId {
        self.push(kind, delay_ms, None)
    }

    /// Run `kind` every `period_ms` (first run after one period)
    pub fn schedule_repeating(&mut self, kind: TimerKind, period_ms: u64) -> TimerId {
        self.push(kind, period_ms, Some(period_ms.max(1)))
    }

    fn push(&mut self, kind: TimerKind, delay_ms: u64, period_ms: Option<u64>) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            kind,
            due_ms: self.now_ms + delay_ms,
            period_ms,
        });
        id
    }

    /// Cancel one task; returns false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Drop every pending task
    pub fn cancel_all(&mut self) {
        if !self.tasks.is_empty() {
            log::debug!("Cancelling {} pending timers", self.tasks.len());
        }
        self.tasks.clear();
    }

    /// Drop every task and rewind the clock
    pub fn reset(&mut self) {
        self.cancel_all();
        self.now_ms = 0;
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    pub fn pending_of(&self, kind: TimerKind) -> usize {
        self.tasks.iter().filter(|t| t.kind == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Advance the clock and return the tasks that came due, in due order.
    ///
    /// Repeating tasks fire once per elapsed period.
    pub fn advance(&mut self, dt_ms: u64) -> Vec<Fired> {
        let target = self.now_ms + dt_ms;
        let mut fired = Vec::new();

        loop {
            let next = self
                .tasks
                .iter()
                .enumerate()
                .filter(|(_, t)| t.due_ms <= target)
                .min_by_key(|(_, t)| (t.due_ms, t.id))
                .map(|(i, _)| i);
            let Some(index) = next else { break };

            let task = &mut self.tasks[index];
            fired.push(Fired {
                id: task.id,
                kind: task.kind,
                at_ms: task.due_ms,
            });
            match task.period_ms {
                Some(period) => task.due_ms += period,
                None => {
                    self.tasks.swap_remove(index);
                }
            }
        }

        self.now_ms = target;
        fired
    }
}
