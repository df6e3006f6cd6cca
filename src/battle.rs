//! Battle abstraction: the engine-version-independent view of a boss
//! encounter, plus selection of the adapter matching the running host.

use crate::error::{RespawnError, Result};
use crate::types::{Location, WorldId};
use std::collections::BTreeMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Operations on one world's boss encounter.
///
/// Implemented once per supported host version; the orchestration core only
/// ever calls through this trait.
pub trait DragonBattle: Send + Sync {
    /// Top of the exit portal, above which the boss originally stood.
    fn portal_location(&self) -> Location;

    /// Drop whatever respawn progress the host is tracking.
    fn reset_battle_state(&self);

    /// Advance the host's crystal-destruction mechanic by one increment.
    fn resume_destruction_effect(&self);

    fn has_been_previously_killed(&self) -> bool;

    /// Current tick of the boss death animation, `None` when no animation is
    /// playing.
    fn death_animation_ticks(&self) -> Option<u64>;
}

/// Hands out the battle for a world. Returns `None` for worlds without a
/// boss encounter.
pub trait BattleProvider: Send + Sync {
    fn battle_for_world(&self, world: &WorldId) -> Option<Arc<dyn DragonBattle>>;
}

// ---------------------------------------------------------------------------
// Version selection
// ---------------------------------------------------------------------------

/// Battle providers keyed by the host version prefix they support.
#[derive(Default)]
pub struct BattleAdapters {
    adapters: BTreeMap<String, Arc<dyn BattleProvider>>,
}

impl BattleAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, version_prefix: impl Into<String>, provider: Arc<dyn BattleProvider>) {
        self.adapters.insert(version_prefix.into(), provider);
    }

    pub fn supported_versions(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    /// Pick the provider whose prefix matches `detected` on a version-segment
    /// boundary. The longest matching prefix wins, so `1.12` beats `1` for
    /// `1.12.2`.
    pub fn select(&self, detected: &str) -> Result<Arc<dyn BattleProvider>> {
        self.adapters
            .iter()
            .filter(|(prefix, _)| {
                detected == prefix.as_str()
                    || detected
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('-'))
            })
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, provider)| provider.clone())
            .ok_or_else(|| RespawnError::UnsupportedHostVersion(detected.to_string()))
    }
}
