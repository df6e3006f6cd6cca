//! Tick scheduling: one-shot tasks carrying only their captured parameters,
//! and a queue that releases them in due-tick then issue order.

use crate::battle::DragonBattle;
use crate::types::{AnchorSlot, Location, RespawnTrigger, WorldId};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

pub type Tick = u64;

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct TaskHandle(u64);

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Deferred work for one world.
pub enum ScheduledTask {
    /// Run the sequencer for a delayed join/death trigger. `token` must
    /// match the world's pending start or the start was superseded.
    BeginSequence {
        world: WorldId,
        trigger: RespawnTrigger,
        origin: Location,
        token: u64,
    },
    /// Place one anchor crystal, detonate it and advance the battle.
    /// Skipped unless `generation` is still the world's current sequence.
    AnchorStep {
        world: WorldId,
        slot: AnchorSlot,
        position: Location,
        generation: u64,
        battle: Arc<dyn DragonBattle>,
    },
    /// Inspect the world after the timeout. `generation` must match the
    /// world's armed watchdog or the check is stale.
    Watchdog { world: WorldId, generation: u64 },
    /// Roll and drop the live template's loot once the death animation ends.
    DropLoot { world: WorldId, at: Location },
}

impl ScheduledTask {
    pub fn world(&self) -> &WorldId {
        match self {
            ScheduledTask::BeginSequence { world, .. }
            | ScheduledTask::AnchorStep { world, .. }
            | ScheduledTask::Watchdog { world, .. }
            | ScheduledTask::DropLoot { world, .. } => world,
        }
    }

    /// Order among tasks due on the same tick; lower runs first. Loot from a
    /// finished death animation drops before the next sequence starts.
    fn rank(&self) -> u8 {
        match self {
            ScheduledTask::DropLoot { .. } => 0,
            _ => 1,
        }
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScheduledTask::BeginSequence {
                world,
                trigger,
                origin,
                token,
            } => f
                .debug_struct("BeginSequence")
                .field("world", world)
                .field("trigger", trigger)
                .field("origin", origin)
                .field("token", token)
                .finish(),
            ScheduledTask::AnchorStep {
                world,
                slot,
                position,
                generation,
                ..
            } => f
                .debug_struct("AnchorStep")
                .field("world", world)
                .field("slot", slot)
                .field("position", position)
                .field("generation", generation)
                .finish_non_exhaustive(),
            ScheduledTask::Watchdog { world, generation } => f
                .debug_struct("Watchdog")
                .field("world", world)
                .field("generation", generation)
                .finish(),
            ScheduledTask::DropLoot { world, at } => f
                .debug_struct("DropLoot")
                .field("world", world)
                .field("at", at)
                .finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Scheduler seam
// ---------------------------------------------------------------------------

/// `schedule(task, delay)`. Tasks cannot be cancelled; stale ones are
/// filtered out when they fire.
pub trait Scheduler {
    fn now(&self) -> Tick;
    fn schedule(&mut self, task: ScheduledTask, delay_ticks: u64) -> TaskHandle;
}

// ---------------------------------------------------------------------------
// TickScheduler
// ---------------------------------------------------------------------------

struct Pending {
    due: Tick,
    handle: TaskHandle,
    task: ScheduledTask,
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    fn cmp(&self, other: &Self) -> Ordering {
        let key = |p: &Pending| (p.due, p.task.rank(), p.handle);
        key(self).cmp(&key(other))
    }
}

/// Single-timeline queue. Handles are issued monotonically, so tasks of the
/// same rank due on the same tick come out in the order they were scheduled.
#[derive(Default)]
pub struct TickScheduler {
    now: Tick,
    next_handle: u64,
    queue: BinaryHeap<Reverse<Pending>>,
}

impl TickScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward one tick and return the new tick.
    pub fn advance(&mut self) -> Tick {
        self.now += 1;
        self.now
    }

    /// Next task due at or before the current tick.
    pub fn pop_due(&mut self) -> Option<(TaskHandle, ScheduledTask)> {
        if self.queue.peek()?.0.due > self.now {
            return None;
        }
        self.queue.pop().map(|Reverse(p)| (p.handle, p.task))
    }

    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    /// Every queued task with its due tick, earliest first.
    pub fn pending(&self) -> Vec<(Tick, &ScheduledTask)> {
        let mut all: Vec<&Pending> = self.queue.iter().map(|Reverse(p)| p).collect();
        all.sort();
        all.into_iter().map(|p| (p.due, &p.task)).collect()
    }
}

impl Scheduler for TickScheduler {
    fn now(&self) -> Tick {
        self.now
    }

    fn schedule(&mut self, task: ScheduledTask, delay_ticks: u64) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.queue.push(Reverse(Pending {
            due: self.now + delay_ticks,
            handle,
            task,
        }));
        handle
    }
}
