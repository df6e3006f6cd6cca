//! `respawn.*` outbound event protocol.
//!
//! Every state change the engine makes is reported as a [`RespawnEvent`].
//! The agent wraps each in a [`WorldEvent`] envelope and publishes it as JSON
//! on the subject returned by [`RespawnEvent::subject`].
//!
//! ## Subjects
//!
//! | Subject                       | Variant              |
//! |-------------------------------|----------------------|
//! | `respawn.sequence.scheduled`  | `SequenceScheduled`  |
//! | `respawn.sequence.started`    | `SequenceStarted`    |
//! | `respawn.sequence.skipped`    | `SequenceSkipped`    |
//! | `respawn.anchor.placed`       | `AnchorPlaced`       |
//! | `respawn.watchdog.restarted`  | `WatchdogRestarted`  |
//! | `respawn.watchdog.settled`    | `WatchdogSettled`    |
//! | `respawn.boss.spawned`        | `BossSpawned`        |
//! | `respawn.loot.dropped`        | `LootDropped`        |

use crate::template::LootDrop;
use crate::types::{AnchorSlot, Location, RespawnTrigger, WorldId};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

/// The `session` field lets one consumer multiplex several servers.
/// The `frame` field is the tick that produced the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldEvent<T> {
    pub session: String,
    pub frame: u64,
    pub payload: T,
}

impl<T> WorldEvent<T> {
    pub fn new(session: impl Into<String>, frame: u64, payload: T) -> Self {
        Self {
            session: session.into(),
            frame,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// A boss is already alive in the world.
    BossPresent,
    /// A sequence is already running for the world.
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RespawnEvent {
    SequenceScheduled {
        world: WorldId,
        trigger: RespawnTrigger,
        delay_ticks: u64,
    },
    SequenceStarted {
        world: WorldId,
        trigger: RespawnTrigger,
        template: Option<String>,
    },
    SequenceSkipped {
        world: WorldId,
        trigger: RespawnTrigger,
        reason: SkipReason,
    },
    AnchorPlaced {
        world: WorldId,
        slot: AnchorSlot,
        position: Location,
    },
    WatchdogRestarted {
        world: WorldId,
        anchors_removed: usize,
    },
    WatchdogSettled {
        world: WorldId,
        anchors_neutralized: usize,
    },
    BossSpawned {
        world: WorldId,
        template: Option<String>,
        anchors_neutralized: usize,
    },
    LootDropped {
        world: WorldId,
        template: Option<String>,
        loot: LootDrop,
    },
}

impl RespawnEvent {
    pub fn world(&self) -> &WorldId {
        match self {
            RespawnEvent::SequenceScheduled { world, .. }
            | RespawnEvent::SequenceStarted { world, .. }
            | RespawnEvent::SequenceSkipped { world, .. }
            | RespawnEvent::AnchorPlaced { world, .. }
            | RespawnEvent::WatchdogRestarted { world, .. }
            | RespawnEvent::WatchdogSettled { world, .. }
            | RespawnEvent::BossSpawned { world, .. }
            | RespawnEvent::LootDropped { world, .. } => world,
        }
    }

    pub fn subject(&self) -> &'static str {
        match self {
            RespawnEvent::SequenceScheduled { .. } => subjects::SEQUENCE_SCHEDULED,
            RespawnEvent::SequenceStarted { .. } => subjects::SEQUENCE_STARTED,
            RespawnEvent::SequenceSkipped { .. } => subjects::SEQUENCE_SKIPPED,
            RespawnEvent::AnchorPlaced { .. } => subjects::ANCHOR_PLACED,
            RespawnEvent::WatchdogRestarted { .. } => subjects::WATCHDOG_RESTARTED,
            RespawnEvent::WatchdogSettled { .. } => subjects::WATCHDOG_SETTLED,
            RespawnEvent::BossSpawned { .. } => subjects::BOSS_SPAWNED,
            RespawnEvent::LootDropped { .. } => subjects::LOOT_DROPPED,
        }
    }
}

// ---------------------------------------------------------------------------
// Subjects
// ---------------------------------------------------------------------------

pub mod subjects {
    pub const SEQUENCE_SCHEDULED: &str = "respawn.sequence.scheduled";
    pub const SEQUENCE_STARTED: &str = "respawn.sequence.started";
    pub const SEQUENCE_SKIPPED: &str = "respawn.sequence.skipped";
    pub const ANCHOR_PLACED: &str = "respawn.anchor.placed";
    pub const WATCHDOG_RESTARTED: &str = "respawn.watchdog.restarted";
    pub const WATCHDOG_SETTLED: &str = "respawn.watchdog.settled";
    pub const BOSS_SPAWNED: &str = "respawn.boss.spawned";
    pub const LOOT_DROPPED: &str = "respawn.loot.dropped";
}
