//! Respawn sequencer: stages the four anchor crystals around the portal.
//!
//! Step `i` is scheduled `(i + 1) * step_interval_ticks` after the sequence
//! starts. Each step ensures the chunk is loaded, places the crystal with its
//! base hidden, sets off a zero-power detonation with a particle burst and
//! advances the battle's destruction mechanic by one increment.

use crate::battle::DragonBattle;
use crate::host::{Particle, WorldHost};
use crate::scheduler::{ScheduledTask, Scheduler, TaskHandle};
use crate::types::{AnchorSlot, Location, RespawnConfig, WorldId};
use log::debug;
use std::sync::Arc;

pub fn anchor_positions(origin: Location, config: &RespawnConfig) -> [(AnchorSlot, Location); 4] {
    AnchorSlot::ALL.map(|slot| {
        (
            slot,
            slot.relative_to(origin, config.anchor_radius, config.anchor_drop),
        )
    })
}

/// Queue one [`ScheduledTask::AnchorStep`] per slot.
pub fn schedule_steps(
    scheduler: &mut dyn Scheduler,
    config: &RespawnConfig,
    world: &WorldId,
    origin: Location,
    generation: u64,
    battle: &Arc<dyn DragonBattle>,
) -> Vec<TaskHandle> {
    anchor_positions(origin, config)
        .into_iter()
        .enumerate()
        .map(|(i, (slot, position))| {
            let delay = (i as u64 + 1) * config.step_interval_ticks;
            scheduler.schedule(
                ScheduledTask::AnchorStep {
                    world: world.clone(),
                    slot,
                    position,
                    generation,
                    battle: battle.clone(),
                },
                delay,
            )
        })
        .collect()
}

pub fn fire_step(
    host: &dyn WorldHost,
    world: &WorldId,
    slot: AnchorSlot,
    position: Location,
    battle: &dyn DragonBattle,
) {
    if !host.is_chunk_loaded(world, position) {
        debug!("Loading chunk {} for {:?} anchor in '{}'", position.chunk(), slot, world);
        host.load_chunk(world, position);
    }

    // The respawn mechanic channels the anchor, so it starts locked.
    host.spawn_anchor(world, position, false, true);
    host.create_detonation(world, position, 0.0);
    host.spawn_particle(world, position, Particle::HugeExplosion);

    battle.resume_destruction_effect();
    debug!("Placed {:?} anchor at {} in '{}'", slot, position, world);
}
