//! Core respawn types shared across all modules.

use crate::battle::DragonBattle;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

/// A block-space position inside one world.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn offset(&self, dx: f64, dy: f64, dz: f64) -> Self {
        Self::new(self.x + dx, self.y + dy, self.z + dz)
    }

    /// Chunk column containing this location (16×16 columns).
    pub fn chunk(&self) -> ChunkCoord {
        ChunkCoord::new(
            (self.x / 16.0).floor() as i32,
            (self.z / 16.0).floor() as i32,
        )
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChunkCoord {
    pub x: i32,
    pub z: i32,
}

impl ChunkCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }
}

impl std::fmt::Display for ChunkCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{},{}]", self.x, self.z)
    }
}

// ---------------------------------------------------------------------------
// World identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldId(pub String);

impl WorldId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WorldId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Triggers
// ---------------------------------------------------------------------------

/// Why a respawn sequence was started.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RespawnTrigger {
    /// A participant entered a world with no boss and no running sequence.
    Join,
    /// The boss was just defeated.
    Death,
    /// The watchdog found a stalled sequence and restarted it.
    Forced,
}

impl std::fmt::Display for RespawnTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RespawnTrigger::Join => "join",
            RespawnTrigger::Death => "death",
            RespawnTrigger::Forced => "forced",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Anchor slots
// ---------------------------------------------------------------------------

/// Compass positions of the four anchor crystals around the portal.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSlot {
    East,
    South,
    West,
    North,
}

impl AnchorSlot {
    /// Spawn order used by the sequencer.
    pub const ALL: [AnchorSlot; 4] = [
        AnchorSlot::East,
        AnchorSlot::South,
        AnchorSlot::West,
        AnchorSlot::North,
    ];

    /// Unit horizontal offset `(dx, dz)`.
    pub fn offset(&self) -> (f64, f64) {
        match self {
            AnchorSlot::East => (1.0, 0.0),
            AnchorSlot::South => (0.0, 1.0),
            AnchorSlot::West => (-1.0, 0.0),
            AnchorSlot::North => (0.0, -1.0),
        }
    }

    /// Anchor position for this slot, `radius` out and `drop` below `origin`.
    pub fn relative_to(&self, origin: Location, radius: f64, drop: f64) -> Location {
        let (dx, dz) = self.offset();
        origin.offset(dx * radius, -drop, dz * radius)
    }

    /// Anchor position for this slot around the battle's exit portal.
    pub fn relative_to_portal(&self, battle: &dyn DragonBattle, radius: f64, drop: f64) -> Location {
        self.relative_to(battle.portal_location(), radius, drop)
    }
}

// ---------------------------------------------------------------------------
// Stats & config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespawnStats {
    pub tracked_worlds: usize,
    pub running_sequences: usize,
    pub registered_templates: usize,
    pub forced_restarts: u64,
    pub current_tick: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RespawnConfig {
    /// Ticks between consecutive anchor steps.
    pub step_interval_ticks: u64,
    /// Delay before the watchdog inspects a started sequence.
    pub watchdog_timeout_ticks: u64,
    /// Horizontal distance of each anchor from the trigger location.
    pub anchor_radius: f64,
    /// Vertical drop of each anchor below the trigger location.
    pub anchor_drop: f64,
    /// Delay between a join trigger and the first sequencer check.
    pub join_delay_ticks: u64,
    /// Delay between a death trigger and the first sequencer check.
    pub death_delay_ticks: u64,
    /// Full length of the boss death animation.
    pub death_animation_ticks: u64,
    /// Fixed RNG seed for reproducible template and loot draws.
    pub rng_seed: Option<u64>,
}

impl Default for RespawnConfig {
    fn default() -> Self {
        Self {
            step_interval_ticks: 22,
            watchdog_timeout_ticks: 700,
            anchor_radius: 3.0,
            anchor_drop: 3.0,
            join_delay_ticks: 0,
            death_delay_ticks: 0,
            death_animation_ticks: 200,
            rng_seed: None,
        }
    }
}
