//! Safeguard watchdog.
//!
//! The host's own respawn mechanic occasionally stalls after the last crystal
//! detonates. One check is armed per sequence start; when it fires it either
//! repairs the world for a restart or cleans up after a successful respawn.
//! Restarting is left to the caller, which owns the world state.

use crate::battle::DragonBattle;
use crate::host::WorldHost;
use crate::scheduler::{ScheduledTask, Scheduler, TaskHandle};
use crate::types::{RespawnConfig, WorldId};
use log::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogVerdict {
    /// No boss at the deadline. Battle reset and anchors removed; the
    /// sequence must be restarted.
    Stalled { anchors_removed: usize },
    /// The boss is alive. Lingering anchors were made disposable.
    Settled { anchors_neutralized: usize },
}

pub fn arm(
    scheduler: &mut dyn Scheduler,
    config: &RespawnConfig,
    world: &WorldId,
    generation: u64,
) -> TaskHandle {
    scheduler.schedule(
        ScheduledTask::Watchdog {
            world: world.clone(),
            generation,
        },
        config.watchdog_timeout_ticks,
    )
}

/// Evaluate the world as it is right now and act on it.
pub fn inspect(host: &dyn WorldHost, world: &WorldId, battle: &dyn DragonBattle) -> WatchdogVerdict {
    if !host.boss_exists(world) {
        warn!(
            "Respawn sequence in '{}' stalled with no boss present; forcing a battle reset",
            world
        );
        battle.reset_battle_state();
        let anchors_removed = host.remove_anchors(world);
        return WatchdogVerdict::Stalled { anchors_removed };
    }

    WatchdogVerdict::Settled {
        anchors_neutralized: host.neutralize_anchors(world),
    }
}
