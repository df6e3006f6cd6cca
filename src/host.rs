//! The world/entity query surface the respawn engine drives.

use crate::template::LootDrop;
use crate::types::{Location, WorldId};

/// Cosmetic effects issued alongside anchor detonations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Particle {
    HugeExplosion,
}

/// A spawned anchor crystal as the host currently sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorInfo {
    pub position: Location,
    pub show_base: bool,
    pub invulnerable: bool,
}

/// Host-side entity and terrain operations, scoped per world.
///
/// Methods take `&self`; implementations own whatever synchronisation their
/// engine needs.
pub trait WorldHost: Send + Sync {
    fn boss_exists(&self, world: &WorldId) -> bool;

    fn is_chunk_loaded(&self, world: &WorldId, at: Location) -> bool;
    fn load_chunk(&self, world: &WorldId, at: Location);

    /// Spawn one anchor crystal. `show_base` controls the bedrock base render.
    fn spawn_anchor(&self, world: &WorldId, at: Location, show_base: bool, invulnerable: bool);

    /// First anchor within `radius` blocks of `at` on every axis.
    fn anchor_near(&self, world: &WorldId, at: Location, radius: f64) -> Option<AnchorInfo>;

    /// Every anchor currently spawned in the world.
    fn anchors(&self, world: &WorldId) -> Vec<AnchorInfo>;

    /// Remove every anchor crystal in the world. Returns how many were removed.
    fn remove_anchors(&self, world: &WorldId) -> usize;

    /// Clear invulnerable and beam-target flags on every anchor in the world.
    /// Returns how many anchors were touched.
    fn neutralize_anchors(&self, world: &WorldId) -> usize;

    /// Explosion with the given power; power 0 breaks nothing.
    fn create_detonation(&self, world: &WorldId, at: Location, power: f32);
    fn spawn_particle(&self, world: &WorldId, at: Location, particle: Particle);

    fn drop_loot(&self, world: &WorldId, at: Location, loot: &LootDrop);
}
