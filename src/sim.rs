//! In-memory host: a [`WorldHost`] and per-world [`DragonBattle`] backed by
//! plain data, for the standalone server and for tests.
//!
//! The simulated mechanic spawns the boss on the fourth destruction
//! increment unless the world has stalls queued, in which case progress is
//! swallowed the way a stuck host would swallow it.

use crate::battle::{BattleProvider, DragonBattle};
use crate::host::{AnchorInfo, Particle, WorldHost};
use crate::template::LootDrop;
use crate::types::{ChunkCoord, Location, WorldId};
use log::debug;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Destruction increments that complete one vanilla respawn.
pub const INCREMENTS_PER_RESPAWN: u32 = 4;

// ---------------------------------------------------------------------------
// Data
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SimAnchor {
    pub position: Location,
    pub show_base: bool,
    pub invulnerable: bool,
    pub beam_locked: bool,
}

impl SimAnchor {
    fn is_near(&self, at: Location, radius: f64) -> bool {
        (self.position.x - at.x).abs() <= radius
            && (self.position.y - at.y).abs() <= radius
            && (self.position.z - at.z).abs() <= radius
    }

    fn info(&self) -> AnchorInfo {
        AnchorInfo {
            position: self.position,
            show_base: self.show_base,
            invulnerable: self.invulnerable,
        }
    }
}

/// Every host-visible call, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SimCall {
    ChunkLoaded(ChunkCoord),
    AnchorSpawned(Location),
    Detonation(Location, f32),
    Particle(Location, Particle),
    DestructionResumed,
    BattleReset,
    AnchorsRemoved(usize),
    AnchorsNeutralized(usize),
    LootDropped(Location),
}

#[derive(Debug, Clone)]
pub struct SimWorld {
    pub portal: Location,
    pub boss_alive: bool,
    pub previously_killed: bool,
    pub death_animation: Option<u64>,
    pub destruction_progress: u32,
    /// Upcoming respawns the mechanic will silently fail to finish.
    pub stalls_remaining: u32,
    pub anchors: Vec<SimAnchor>,
    pub loaded_chunks: HashSet<ChunkCoord>,
    pub loot: Vec<(Location, LootDrop)>,
    pub calls: Vec<SimCall>,
}

impl SimWorld {
    pub fn new(portal: Location) -> Self {
        Self {
            portal,
            boss_alive: false,
            previously_killed: false,
            death_animation: None,
            destruction_progress: 0,
            stalls_remaining: 0,
            anchors: Vec::new(),
            loaded_chunks: HashSet::new(),
            loot: Vec::new(),
            calls: Vec::new(),
        }
    }

    pub fn count_calls(&self, pred: impl Fn(&SimCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn advance_mechanic(&mut self) {
        self.destruction_progress += 1;
        if self.destruction_progress < INCREMENTS_PER_RESPAWN {
            return;
        }
        self.destruction_progress = 0;
        if self.stalls_remaining > 0 {
            self.stalls_remaining -= 1;
            debug!("Simulated respawn stalled");
            return;
        }
        self.boss_alive = true;
        self.previously_killed = true;
        self.death_animation = None;
    }
}

type SharedWorlds = Arc<Mutex<HashMap<WorldId, SimWorld>>>;

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct SimulatedHost {
    worlds: SharedWorlds,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_world(&self, world: WorldId, portal: Location) {
        self.worlds.lock().insert(world, SimWorld::new(portal));
    }

    pub fn inspect<R>(&self, world: &WorldId, f: impl FnOnce(&SimWorld) -> R) -> Option<R> {
        self.worlds.lock().get(world).map(f)
    }

    pub fn update<R>(&self, world: &WorldId, f: impl FnOnce(&mut SimWorld) -> R) -> Option<R> {
        self.worlds.lock().get_mut(world).map(f)
    }

    pub fn spawn_boss(&self, world: &WorldId) {
        self.update(world, |w| w.boss_alive = true);
    }

    /// Kill the boss, leaving the death animation at `animation_tick`.
    pub fn kill_boss(&self, world: &WorldId, animation_tick: Option<u64>) {
        self.update(world, |w| {
            w.boss_alive = false;
            w.death_animation = animation_tick;
        });
    }

    pub fn queue_stalls(&self, world: &WorldId, stalls: u32) {
        self.update(world, |w| w.stalls_remaining += stalls);
    }

    pub fn world_ids(&self) -> Vec<WorldId> {
        let mut ids: Vec<_> = self.worlds.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    fn with_world(&self, world: &WorldId, f: impl FnOnce(&mut SimWorld)) {
        if self.update(world, f).is_none() {
            debug!("Simulated host has no world '{}'", world);
        }
    }
}

impl WorldHost for SimulatedHost {
    fn boss_exists(&self, world: &WorldId) -> bool {
        self.inspect(world, |w| w.boss_alive).unwrap_or(false)
    }

    fn is_chunk_loaded(&self, world: &WorldId, at: Location) -> bool {
        self.inspect(world, |w| w.loaded_chunks.contains(&at.chunk()))
            .unwrap_or(false)
    }

    fn load_chunk(&self, world: &WorldId, at: Location) {
        self.with_world(world, |w| {
            w.loaded_chunks.insert(at.chunk());
            w.calls.push(SimCall::ChunkLoaded(at.chunk()));
        });
    }

    fn spawn_anchor(&self, world: &WorldId, at: Location, show_base: bool, invulnerable: bool) {
        self.with_world(world, |w| {
            // Locked anchors are also the beam target of the mechanic.
            w.anchors.push(SimAnchor {
                position: at,
                show_base,
                invulnerable,
                beam_locked: invulnerable,
            });
            w.calls.push(SimCall::AnchorSpawned(at));
        });
    }

    fn anchor_near(&self, world: &WorldId, at: Location, radius: f64) -> Option<AnchorInfo> {
        self.inspect(world, |w| {
            w.anchors
                .iter()
                .find(|a| a.is_near(at, radius))
                .map(SimAnchor::info)
        })
        .flatten()
    }

    fn anchors(&self, world: &WorldId) -> Vec<AnchorInfo> {
        self.inspect(world, |w| w.anchors.iter().map(SimAnchor::info).collect())
            .unwrap_or_default()
    }

    fn remove_anchors(&self, world: &WorldId) -> usize {
        self.update(world, |w| {
            let removed = w.anchors.len();
            w.anchors.clear();
            w.calls.push(SimCall::AnchorsRemoved(removed));
            removed
        })
        .unwrap_or(0)
    }

    fn neutralize_anchors(&self, world: &WorldId) -> usize {
        self.update(world, |w| {
            let mut touched = 0;
            for anchor in w.anchors.iter_mut() {
                if anchor.invulnerable || anchor.beam_locked {
                    anchor.invulnerable = false;
                    anchor.beam_locked = false;
                    touched += 1;
                }
            }
            w.calls.push(SimCall::AnchorsNeutralized(touched));
            touched
        })
        .unwrap_or(0)
    }

    fn create_detonation(&self, world: &WorldId, at: Location, power: f32) {
        self.with_world(world, |w| w.calls.push(SimCall::Detonation(at, power)));
    }

    fn spawn_particle(&self, world: &WorldId, at: Location, particle: Particle) {
        self.with_world(world, |w| w.calls.push(SimCall::Particle(at, particle)));
    }

    fn drop_loot(&self, world: &WorldId, at: Location, loot: &LootDrop) {
        self.with_world(world, |w| {
            w.loot.push((at, loot.clone()));
            w.calls.push(SimCall::LootDropped(at));
        });
    }
}

impl BattleProvider for SimulatedHost {
    fn battle_for_world(&self, world: &WorldId) -> Option<Arc<dyn DragonBattle>> {
        if !self.worlds.lock().contains_key(world) {
            return None;
        }
        Some(Arc::new(SimBattle {
            world: world.clone(),
            worlds: self.worlds.clone(),
        }))
    }
}

// ---------------------------------------------------------------------------
// Battle
// ---------------------------------------------------------------------------

pub struct SimBattle {
    world: WorldId,
    worlds: SharedWorlds,
}

impl SimBattle {
    fn read<R: Default>(&self, f: impl FnOnce(&SimWorld) -> R) -> R {
        self.worlds.lock().get(&self.world).map(f).unwrap_or_default()
    }

    fn write(&self, f: impl FnOnce(&mut SimWorld)) {
        if let Some(w) = self.worlds.lock().get_mut(&self.world) {
            f(w);
        }
    }
}

impl DragonBattle for SimBattle {
    fn portal_location(&self) -> Location {
        self.worlds
            .lock()
            .get(&self.world)
            .map(|w| w.portal)
            .unwrap_or_else(Location::zero)
    }

    fn reset_battle_state(&self) {
        self.write(|w| {
            w.destruction_progress = 0;
            w.calls.push(SimCall::BattleReset);
        });
    }

    fn resume_destruction_effect(&self) {
        self.write(|w| {
            w.calls.push(SimCall::DestructionResumed);
            w.advance_mechanic();
        });
    }

    fn has_been_previously_killed(&self) -> bool {
        self.read(|w| w.previously_killed)
    }

    fn death_animation_ticks(&self) -> Option<u64> {
        self.read(|w| w.death_animation)
    }
}
