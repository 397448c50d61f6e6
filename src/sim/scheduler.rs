//! Cancellable task scheduler
//!
//! Every timer in the game (spike stages, spotlight lifetime, hazard attempts,
//! the restart delay) is a task in a min-heap keyed by due time. The heap is
//! drained synchronously at the start of each tick; nothing fires between
//! ticks. Tasks may be owned by an entity so destroying the entity drops its
//! pending callbacks.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::{Deserialize, Serialize};

/// Scheduler-assigned task handle
pub type TaskId = u64;

/// What a task does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Task {
    /// Hazard scheduler: maybe spawn a spike ahead of the player
    SpikeAttempt,
    /// Hazard scheduler: maybe spawn a spotlight ahead of the player
    SpotlightAttempt,
    /// Advance a spike to its next stage
    SpikeStage { spike: u32 },
    /// Remove a spotlight at the end of its lifetime
    SpotlightExpire { spotlight: u32 },
    /// Expose the restart affordance after game over
    RestartReady,
}

/// A pending task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTask {
    pub id: TaskId,
    pub due_ms: u64,
    pub task: Task,
    /// Entity whose destruction cancels this task
    pub owner: Option<u32>,
    /// Re-arm interval for looping tasks
    pub repeat_ms: Option<u64>,
}

// Heap ordering: earliest due first, then insertion order.
impl Ord for ScheduledTask {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due_ms
            .cmp(&self.due_ms)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for ScheduledTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledTask {
    fn eq(&self, other: &Self) -> bool {
        self.due_ms == other.due_ms && self.id == other.id
    }
}

impl Eq for ScheduledTask {}

/// A task that came due during a drain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub task: Task,
    /// When it was due (not when it was observed)
    pub due_ms: u64,
}

/// Min-heap of pending tasks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scheduler {
    heap: BinaryHeap<ScheduledTask>,
    next_id: TaskId,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, due_ms: u64, task: Task, owner: Option<u32>, repeat_ms: Option<u64>) -> TaskId {
        let id = self.next_id;
        self.next_id += 1;
        self.heap.push(ScheduledTask {
            id,
            due_ms,
            task,
            owner,
            repeat_ms,
        });
        id
    }

    /// Schedule a one-shot task
    pub fn schedule_at(&mut self, due_ms: u64, task: Task, owner: Option<u32>) -> TaskId {
        self.push(due_ms, task, owner, None)
    }

    /// Schedule a task that re-arms itself every `interval_ms` until cancelled
    pub fn schedule_repeating(&mut self, first_due_ms: u64, interval_ms: u64, task: Task) -> TaskId {
        debug_assert!(interval_ms > 0, "repeating task needs a non-zero interval");
        self.push(first_due_ms, task, None, Some(interval_ms))
    }

    /// Pop every task due at or before `now_ms`, in due order.
    ///
    /// Looping tasks are re-armed from their due time. Tasks scheduled by the
    /// caller while handling the result wait for the next drain.
    pub fn drain_due(&mut self, now_ms: u64) -> Vec<Fired> {
        let mut fired = Vec::new();
        let mut rearm = Vec::new();

        while self.heap.peek().is_some_and(|t| t.due_ms <= now_ms) {
            let Some(task) = self.heap.pop() else { break };
            fired.push(Fired {
                task: task.task,
                due_ms: task.due_ms,
            });
            if let Some(interval) = task.repeat_ms {
                rearm.push(ScheduledTask {
                    due_ms: task.due_ms + interval,
                    ..task
                });
            }
        }

        self.heap.extend(rearm);
        fired
    }

    /// Drop every task owned by `owner`
    pub fn cancel_owner(&mut self, owner: u32) {
        self.heap.retain(|t| t.owner != Some(owner));
    }

    /// Drop every pending task
    pub fn cancel_all(&mut self) {
        self.heap.clear();
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Pending tasks in no particular order
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledTask> {
        self.heap.iter()
    }

    /// Whether any pending task is owned by `owner`
    pub fn has_owner(&self, owner: u32) -> bool {
        self.heap.iter().any(|t| t.owner == Some(owner))
    }
}
