//! Slot-level view of the four anchor crystals around a world's exit portal.

use crate::battle::DragonBattle;
use crate::host::{AnchorInfo, WorldHost};
use crate::types::{AnchorSlot, Location, RespawnConfig, WorldId};
use log::debug;
use std::sync::Arc;

/// Anchors within this many blocks of a slot position belong to the slot.
pub const SLOT_TOLERANCE: f64 = 1.0;

/// Anchor slots of one world, positioned around its portal.
pub struct PortalAnchors {
    host: Arc<dyn WorldHost>,
    battle: Arc<dyn DragonBattle>,
    world: WorldId,
    radius: f64,
    drop: f64,
}

impl PortalAnchors {
    pub fn new(
        host: Arc<dyn WorldHost>,
        battle: Arc<dyn DragonBattle>,
        world: WorldId,
        config: &RespawnConfig,
    ) -> Self {
        Self {
            host,
            battle,
            world,
            radius: config.anchor_radius,
            drop: config.anchor_drop,
        }
    }

    pub fn world(&self) -> &WorldId {
        &self.world
    }

    pub fn position(&self, slot: AnchorSlot) -> Location {
        slot.relative_to_portal(self.battle.as_ref(), self.radius, self.drop)
    }

    pub fn get(&self, slot: AnchorSlot) -> Option<AnchorInfo> {
        self.host
            .anchor_near(&self.world, self.position(slot), SLOT_TOLERANCE)
    }

    pub fn is_present(&self, slot: AnchorSlot) -> bool {
        self.get(slot).is_some()
    }

    /// Spawn the slot's anchor with its base hidden. Returns `None` without
    /// spawning when the slot is already occupied.
    pub fn spawn(&self, slot: AnchorSlot, invulnerable: bool) -> Option<AnchorInfo> {
        let position = self.position(slot);
        if let Some(existing) = self.host.anchor_near(&self.world, position, SLOT_TOLERANCE) {
            debug!(
                "{:?} slot in '{}' already holds an anchor at {}",
                slot, self.world, existing.position
            );
            return None;
        }

        self.host
            .spawn_anchor(&self.world, position, false, invulnerable);
        Some(AnchorInfo {
            position,
            show_base: false,
            invulnerable,
        })
    }

    /// Occupied slots with their anchors, in spawn order.
    pub fn all_spawned(&self) -> Vec<(AnchorSlot, AnchorInfo)> {
        AnchorSlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot).map(|anchor| (slot, anchor)))
            .collect()
    }
}
