//! Boss Respawn Engine
//!
//! Orchestrates the recurring boss respawn in a persistent world: draws a
//! weighted template, stages four anchor crystals on a tick timeline and
//! watches for a respawn the host failed to finish.
//!
//! ## Architecture
//!
//! ```text
//! RespawnAgent  (agent.rs)          ← wall-clock tick loop, event publishing
//!   └── RespawnService  (service.rs) ← per-world state, triggers, dispatch
//!         ├── TemplateRegistry  (registry.rs) ← WeightedSelector (selector.rs)
//!         ├── TickScheduler     (scheduler.rs)
//!         ├── sequencer / watchdog
//!         └── BattleProvider + WorldHost  (battle.rs, host.rs) ← host adapters
//! ```
//!
//! The service never touches host internals directly; every world operation
//! goes through [`WorldHost`] and every battle operation through
//! [`DragonBattle`], one implementation per supported host version.

pub mod anchors;
pub mod battle;
pub mod error;
pub mod host;
pub mod protocol;
pub mod registry;
pub mod scheduler;
pub mod selector;
pub mod sequencer;
pub mod service;
pub mod template;
pub mod types;
pub mod watchdog;

// Runtime modules require the `server` feature.
#[cfg(feature = "server")]
pub mod agent;
#[cfg(feature = "server")]
pub mod sim;

pub use anchors::PortalAnchors;
pub use battle::{BattleAdapters, BattleProvider, DragonBattle};
pub use error::{RespawnError, Result, TemplateError};
pub use host::{AnchorInfo, Particle, WorldHost};
pub use protocol::{RespawnEvent, SkipReason, WorldEvent};
pub use registry::{ReloadReport, TemplateRegistry};
pub use scheduler::{ScheduledTask, Scheduler, TaskHandle, Tick, TickScheduler};
pub use selector::WeightedSelector;
pub use service::{RespawnService, RespawnStatus, StartOutcome, TickEvents, WorldState};
pub use template::{
    DirectoryTemplateSource, LootDrop, LootTable, StaticTemplateSource, Template, TemplateSource,
};
pub use types::{AnchorSlot, Location, RespawnConfig, RespawnStats, RespawnTrigger, WorldId};

// Convenience re-exports (server only)
#[cfg(feature = "server")]
pub use agent::{AgentConfig, Published, RespawnAgent};
#[cfg(feature = "server")]
pub use sim::SimulatedHost;
