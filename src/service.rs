//! RespawnService – per-world respawn state, trigger entry points and tick
//! dispatch for the sequencer and watchdog.

use crate::anchors::PortalAnchors;
use crate::battle::{BattleProvider, DragonBattle};
use crate::error::{RespawnError, Result};
use crate::host::WorldHost;
use crate::protocol::{RespawnEvent, SkipReason};
use crate::registry::{ReloadReport, TemplateRegistry};
use crate::scheduler::{ScheduledTask, Scheduler, Tick, TickScheduler};
use crate::template::{Template, TemplateSource};
use crate::types::{Location, RespawnConfig, RespawnStats, RespawnTrigger, WorldId};
use crate::watchdog::WatchdogVerdict;
use crate::{sequencer, watchdog};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Per-world state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RespawnStatus {
    Idle,
    Running,
}

/// Respawn bookkeeping for one world.
pub struct WorldState {
    world: WorldId,
    status: RespawnStatus,
    /// Template drawn for the sequence in progress.
    template: Option<Arc<Template>>,
    /// Template the currently living boss was spawned from.
    live_template: Option<Arc<Template>>,
    battle: Arc<dyn DragonBattle>,
    origin: Option<Location>,
    /// Current sequence; anchor steps and watchdogs from older ones are void.
    generation: u64,
    armed_watchdog: Option<u64>,
    /// Token of the delayed start still waiting to fire.
    pending_begin: Option<u64>,
    begin_tokens: u64,
    sequences_started: u64,
}

impl WorldState {
    fn new(world: WorldId, battle: Arc<dyn DragonBattle>) -> Self {
        Self {
            world,
            status: RespawnStatus::Idle,
            template: None,
            live_template: None,
            battle,
            origin: None,
            generation: 0,
            armed_watchdog: None,
            pending_begin: None,
            begin_tokens: 0,
            sequences_started: 0,
        }
    }

    pub fn world(&self) -> &WorldId {
        &self.world
    }

    pub fn status(&self) -> RespawnStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == RespawnStatus::Running
    }

    pub fn template(&self) -> Option<&Arc<Template>> {
        self.template.as_ref()
    }

    pub fn live_template(&self) -> Option<&Arc<Template>> {
        self.live_template.as_ref()
    }

    pub fn battle(&self) -> &Arc<dyn DragonBattle> {
        &self.battle
    }

    /// Trigger location of the most recent sequence.
    pub fn origin(&self) -> Option<Location> {
        self.origin
    }

    pub fn has_armed_watchdog(&self) -> bool {
        self.armed_watchdog.is_some()
    }

    pub fn sequences_started(&self) -> u64 {
        self.sequences_started
    }

    /// Leave `Running`; the sequence template now describes the live boss.
    fn settle(&mut self) {
        self.status = RespawnStatus::Idle;
        if let Some(t) = self.template.take() {
            self.live_template = Some(t);
        }
    }

    /// Void the in-flight sequence: pending anchor steps, the armed watchdog
    /// and any delayed start. Leaves the world settled.
    fn supersede(&mut self) {
        self.generation += 1;
        self.armed_watchdog = None;
        self.pending_begin = None;
        self.settle();
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Anchor steps and the watchdog were scheduled.
    Started,
    /// The sequencer will run after the trigger delay.
    Scheduled { delay_ticks: u64 },
    Skipped(SkipReason),
}

/// Events produced by a single [`RespawnService::tick`] call, plus any
/// emitted by trigger entry points since the previous tick.
pub struct TickEvents {
    pub tick: Tick,
    pub events: Vec<RespawnEvent>,
}

// ---------------------------------------------------------------------------
// Service
// ---------------------------------------------------------------------------

pub struct RespawnService {
    config: RespawnConfig,
    registry: TemplateRegistry,
    fallback_template: Option<Arc<Template>>,
    worlds: HashMap<WorldId, WorldState>,
    battles: Arc<dyn BattleProvider>,
    host: Arc<dyn WorldHost>,
    scheduler: TickScheduler,
    rng: StdRng,
    events: Vec<RespawnEvent>,
    forced_restarts: u64,
}

impl RespawnService {
    pub fn new(
        config: RespawnConfig,
        battles: Arc<dyn BattleProvider>,
        host: Arc<dyn WorldHost>,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            registry: TemplateRegistry::new(),
            fallback_template: None,
            worlds: HashMap::new(),
            battles,
            host,
            scheduler: TickScheduler::new(),
            rng,
            events: Vec::new(),
            forced_restarts: 0,
        }
    }

    pub fn config(&self) -> &RespawnConfig {
        &self.config
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.registry
    }

    /// Template used when the registry has nothing to draw.
    pub fn set_fallback_template(&mut self, template: Option<Template>) {
        self.fallback_template = template.map(Arc::new);
    }

    /// Runs to completion inside one call, so no tick observes a partially
    /// populated registry.
    pub fn reload_templates(&mut self, source: &dyn TemplateSource) -> ReloadReport {
        self.registry.reload(source)
    }

    // -----------------------------------------------------------------------
    // World state
    // -----------------------------------------------------------------------

    pub fn world_state(&self, world: &WorldId) -> Option<&WorldState> {
        self.worlds.get(world)
    }

    pub fn worlds(&self) -> impl Iterator<Item = &WorldState> {
        self.worlds.values()
    }

    /// Battle handle for `world`, created on first use and cached.
    pub fn battle_for(&mut self, world: &WorldId) -> Result<Arc<dyn DragonBattle>> {
        let state = world_entry(&mut self.worlds, self.battles.as_ref(), world)?;
        Ok(state.battle.clone())
    }

    /// Slot view of the anchors around `world`'s exit portal.
    pub fn portal_anchors(&mut self, world: &WorldId) -> Result<PortalAnchors> {
        let battle = self.battle_for(world)?;
        Ok(PortalAnchors::new(
            self.host.clone(),
            battle,
            world.clone(),
            &self.config,
        ))
    }

    /// Forget every world. Pending watchdogs for them become no-ops.
    pub fn clear_worlds(&mut self) {
        info!("Clearing respawn state for {} worlds", self.worlds.len());
        self.worlds.clear();
    }

    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    pub fn current_tick(&self) -> Tick {
        self.scheduler.now()
    }

    // -----------------------------------------------------------------------
    // Trigger entry points
    // -----------------------------------------------------------------------

    /// Start a respawn sequence for `world` above `origin`.
    ///
    /// A world that is already running, or that has a live boss, is left
    /// untouched and reported as skipped.
    pub fn start_respawn(
        &mut self,
        world: &WorldId,
        trigger: RespawnTrigger,
        origin: Location,
    ) -> Result<StartOutcome> {
        let delay = match trigger {
            RespawnTrigger::Join => self.config.join_delay_ticks,
            RespawnTrigger::Death => self.config.death_delay_ticks,
            RespawnTrigger::Forced => 0,
        };
        self.request_sequence(world, trigger, origin, delay)
    }

    pub fn handle_participant_join(
        &mut self,
        world: &WorldId,
        origin: Location,
    ) -> Result<StartOutcome> {
        self.start_respawn(world, RespawnTrigger::Join, origin)
    }

    /// The boss in `world` died at `location`.
    ///
    /// Whatever sequence the world still tracks is superseded. The next
    /// sequence is requested after the animation plus the death delay, and
    /// loot for the live template drops once the death animation finishes.
    pub fn handle_boss_death(
        &mut self,
        world: &WorldId,
        location: Location,
    ) -> Result<StartOutcome> {
        let battle = self.battle_for(world)?;
        let remaining = battle
            .death_animation_ticks()
            .map(|elapsed| self.config.death_animation_ticks.saturating_sub(elapsed))
            .unwrap_or(0);

        if let Some(state) = self.worlds.get_mut(world) {
            if state.is_running() {
                debug!("Boss died in '{}' with a sequence in flight; superseding it", world);
            }
            state.supersede();
        }

        let delay = remaining + self.config.death_delay_ticks;
        let outcome = self.request_sequence(world, RespawnTrigger::Death, location, delay)?;
        if !matches!(outcome, StartOutcome::Skipped(_)) {
            self.scheduler.schedule(
                ScheduledTask::DropLoot {
                    world: world.clone(),
                    at: location,
                },
                remaining,
            );
        }
        Ok(outcome)
    }

    /// The host saw the boss appear. Returns the template it should be tuned
    /// with, if any.
    pub fn handle_boss_spawned(&mut self, world: &WorldId) -> Option<Arc<Template>> {
        let state = self.worlds.get_mut(world)?;
        if state.is_running() {
            state.supersede();
            let anchors_neutralized = self.host.neutralize_anchors(world);
            info!(
                "Boss respawned in '{}' ({} anchors neutralized)",
                world, anchors_neutralized
            );
            self.events.push(RespawnEvent::BossSpawned {
                world: world.clone(),
                template: state.live_template.as_ref().map(|t| t.id.clone()),
                anchors_neutralized,
            });
        }
        state.live_template.clone()
    }

    fn request_sequence(
        &mut self,
        world: &WorldId,
        trigger: RespawnTrigger,
        origin: Location,
        delay_ticks: u64,
    ) -> Result<StartOutcome> {
        let state = world_entry(&mut self.worlds, self.battles.as_ref(), world)?;

        // Death triggers arrive while the dying boss is still present; the
        // sequencer re-checks once the delay has elapsed.
        let skip = if state.is_running() {
            Some(SkipReason::AlreadyRunning)
        } else if trigger != RespawnTrigger::Death && self.host.boss_exists(world) {
            Some(SkipReason::BossPresent)
        } else {
            None
        };
        if let Some(reason) = skip {
            debug!("Ignoring {} trigger for '{}': {:?}", trigger, world, reason);
            self.events.push(RespawnEvent::SequenceSkipped {
                world: world.clone(),
                trigger,
                reason,
            });
            return Ok(StartOutcome::Skipped(reason));
        }

        state.status = RespawnStatus::Running;
        state.origin = Some(origin);

        if delay_ticks == 0 {
            return Ok(if self.begin_sequence(world, trigger, origin) {
                StartOutcome::Started
            } else {
                StartOutcome::Skipped(SkipReason::BossPresent)
            });
        }

        state.begin_tokens += 1;
        let token = state.begin_tokens;
        state.pending_begin = Some(token);
        self.scheduler.schedule(
            ScheduledTask::BeginSequence {
                world: world.clone(),
                trigger,
                origin,
                token,
            },
            delay_ticks,
        );
        debug!(
            "Respawn for '{}' ({}) scheduled in {} ticks",
            world, trigger, delay_ticks
        );
        self.events.push(RespawnEvent::SequenceScheduled {
            world: world.clone(),
            trigger,
            delay_ticks,
        });
        Ok(StartOutcome::Scheduled { delay_ticks })
    }

    /// Draw a template, queue the anchor steps and arm a fresh watchdog.
    /// Returns `false` when a boss already exists.
    fn begin_sequence(&mut self, world: &WorldId, trigger: RespawnTrigger, origin: Location) -> bool {
        let Some(state) = self.worlds.get_mut(world) else {
            debug!("Dropping {} sequence for untracked world '{}'", trigger, world);
            return false;
        };

        if self.host.boss_exists(world) {
            debug!("Boss already present in '{}'; aborting {} sequence", world, trigger);
            state.status = RespawnStatus::Idle;
            self.events.push(RespawnEvent::SequenceSkipped {
                world: world.clone(),
                trigger,
                reason: SkipReason::BossPresent,
            });
            return false;
        }

        let template = self
            .registry
            .draw_random_with(&mut self.rng)
            .or_else(|| self.fallback_template.clone());
        let template_id = template.as_ref().map(|t| t.id.clone());

        state.status = RespawnStatus::Running;
        state.template = template;
        state.origin = Some(origin);
        state.pending_begin = None;
        state.sequences_started += 1;
        state.generation += 1;
        let generation = state.generation;

        sequencer::schedule_steps(
            &mut self.scheduler,
            &self.config,
            world,
            origin,
            generation,
            &state.battle,
        );

        state.armed_watchdog = Some(generation);
        watchdog::arm(&mut self.scheduler, &self.config, world, generation);

        info!(
            "Starting {} respawn in '{}' at {} with template {}",
            trigger,
            world,
            origin,
            template_id.as_deref().unwrap_or("<none>")
        );
        self.events.push(RespawnEvent::SequenceStarted {
            world: world.clone(),
            trigger,
            template: template_id,
        });
        true
    }

    // -----------------------------------------------------------------------
    // Main tick
    // -----------------------------------------------------------------------

    /// Advance the timeline by one tick and run every task that came due,
    /// including tasks those tasks schedule with no delay.
    pub fn tick(&mut self) -> TickEvents {
        let tick = self.scheduler.advance();
        while let Some((_, task)) = self.scheduler.pop_due() {
            self.dispatch(task);
        }
        TickEvents {
            tick,
            events: self.drain_events(),
        }
    }

    pub fn drain_events(&mut self) -> Vec<RespawnEvent> {
        std::mem::take(&mut self.events)
    }

    fn dispatch(&mut self, task: ScheduledTask) {
        match task {
            ScheduledTask::BeginSequence {
                world,
                trigger,
                origin,
                token,
            } => {
                let current = self
                    .worlds
                    .get(&world)
                    .is_some_and(|s| s.pending_begin == Some(token));
                if current {
                    self.begin_sequence(&world, trigger, origin);
                } else {
                    debug!("Ignoring superseded {} start for '{}'", trigger, world);
                }
            }
            ScheduledTask::AnchorStep {
                world,
                slot,
                position,
                generation,
                battle,
            } => {
                let current = self
                    .worlds
                    .get(&world)
                    .is_some_and(|s| s.generation == generation);
                if !current {
                    debug!("Skipping superseded {:?} anchor for '{}'", slot, world);
                    return;
                }
                sequencer::fire_step(self.host.as_ref(), &world, slot, position, battle.as_ref());
                self.events.push(RespawnEvent::AnchorPlaced {
                    world,
                    slot,
                    position,
                });
            }
            ScheduledTask::Watchdog { world, generation } => {
                self.fire_watchdog(&world, generation);
            }
            ScheduledTask::DropLoot { world, at } => self.drop_loot(&world, at),
        }
    }

    fn fire_watchdog(&mut self, world: &WorldId, generation: u64) {
        let Some(state) = self.worlds.get_mut(world) else {
            return;
        };
        if state.armed_watchdog != Some(generation) {
            debug!("Ignoring stale watchdog #{} for '{}'", generation, world);
            return;
        }
        state.armed_watchdog = None;

        match watchdog::inspect(self.host.as_ref(), world, state.battle.as_ref()) {
            WatchdogVerdict::Stalled { anchors_removed } => {
                self.forced_restarts += 1;
                let origin = state
                    .origin
                    .unwrap_or_else(|| state.battle.portal_location());
                self.events.push(RespawnEvent::WatchdogRestarted {
                    world: world.clone(),
                    anchors_removed,
                });
                self.begin_sequence(world, RespawnTrigger::Forced, origin);
            }
            WatchdogVerdict::Settled {
                anchors_neutralized,
            } => {
                state.settle();
                debug!(
                    "Watchdog settled '{}' ({} anchors neutralized)",
                    world, anchors_neutralized
                );
                self.events.push(RespawnEvent::WatchdogSettled {
                    world: world.clone(),
                    anchors_neutralized,
                });
            }
        }
    }

    fn drop_loot(&mut self, world: &WorldId, at: Location) {
        let Some(state) = self.worlds.get_mut(world) else {
            return;
        };
        let Some(template) = state.live_template.take() else {
            debug!("No live template in '{}'; leaving loot to the host", world);
            return;
        };

        // The host drops the first-kill egg itself.
        let egg_allowed = state.battle.has_been_previously_killed();
        let loot = template.loot.roll(&mut self.rng, egg_allowed);
        self.host.drop_loot(world, at, &loot);

        info!("Dropped '{}' loot in '{}' at {}", template.id, world, at);
        self.events.push(RespawnEvent::LootDropped {
            world: world.clone(),
            template: Some(template.id.clone()),
            loot,
        });
    }

    // -----------------------------------------------------------------------
    // Stats
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> RespawnStats {
        RespawnStats {
            tracked_worlds: self.worlds.len(),
            running_sequences: self.worlds.values().filter(|w| w.is_running()).count(),
            registered_templates: self.registry.len(),
            forced_restarts: self.forced_restarts,
            current_tick: self.scheduler.now(),
        }
    }
}

fn world_entry<'a>(
    worlds: &'a mut HashMap<WorldId, WorldState>,
    battles: &dyn BattleProvider,
    world: &WorldId,
) -> Result<&'a mut WorldState> {
    match worlds.entry(world.clone()) {
        Entry::Occupied(e) => Ok(e.into_mut()),
        Entry::Vacant(v) => {
            let battle = battles
                .battle_for_world(world)
                .ok_or_else(|| RespawnError::UnsupportedWorld(world.clone()))?;
            debug!("Tracking respawn state for '{}'", world);
            Ok(v.insert(WorldState::new(world.clone(), battle)))
        }
    }
}
