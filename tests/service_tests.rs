//! RespawnService tests: state machine, sequencer timing and watchdog
#![cfg(feature = "server")]

#[cfg(test)]
mod tests {
    use boss_respawn::error::RespawnError;
    use boss_respawn::protocol::{RespawnEvent, SkipReason};
    use boss_respawn::scheduler::ScheduledTask;
    use boss_respawn::service::{RespawnService, RespawnStatus, StartOutcome};
    use boss_respawn::sim::{SimCall, SimulatedHost};
    use boss_respawn::template::{LootItem, LootTable, Template};
    use boss_respawn::types::{AnchorSlot, Location, RespawnConfig, RespawnTrigger, WorldId};
    use std::sync::Arc;

    const PORTAL: Location = Location {
        x: 0.0,
        y: 67.0,
        z: 0.0,
    };

    fn make_service(config: RespawnConfig) -> (RespawnService, SimulatedHost, WorldId) {
        let host = SimulatedHost::new();
        let world = WorldId::new("the_end");
        host.add_world(world.clone(), PORTAL);

        let config = RespawnConfig {
            rng_seed: Some(7),
            ..config
        };
        let svc = RespawnService::new(config, Arc::new(host.clone()), Arc::new(host.clone()));
        (svc, host, world)
    }

    /// Tick until `until` (inclusive), collecting every event.
    fn run_to(svc: &mut RespawnService, until: u64) -> Vec<RespawnEvent> {
        let mut events = Vec::new();
        while svc.current_tick() < until {
            events.extend(svc.tick().events);
        }
        events
    }

    fn calls(host: &SimulatedHost, world: &WorldId) -> Vec<SimCall> {
        host.inspect(world, |w| w.calls.clone()).unwrap()
    }

    fn status(svc: &RespawnService, world: &WorldId) -> RespawnStatus {
        svc.world_state(world).unwrap().status()
    }

    // -----------------------------------------------------------------------
    // Sequencer timing
    // -----------------------------------------------------------------------

    #[test]
    fn full_run_schedules_four_steps_and_watchdog() {
        let (mut svc, _host, world) = make_service(RespawnConfig::default());
        let outcome = svc
            .start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        assert_eq!(outcome, StartOutcome::Started);

        let pending = svc.scheduler().pending();
        let steps: Vec<_> = pending
            .iter()
            .filter_map(|(due, task)| match task {
                ScheduledTask::AnchorStep { slot, position, .. } => Some((*due, *slot, *position)),
                _ => None,
            })
            .collect();
        assert_eq!(
            steps,
            vec![
                (22, AnchorSlot::East, Location::new(3.0, 64.0, 0.0)),
                (44, AnchorSlot::South, Location::new(0.0, 64.0, 3.0)),
                (66, AnchorSlot::West, Location::new(-3.0, 64.0, 0.0)),
                (88, AnchorSlot::North, Location::new(0.0, 64.0, -3.0)),
            ]
        );

        let watchdogs: Vec<_> = pending
            .iter()
            .filter(|(_, task)| matches!(task, ScheduledTask::Watchdog { .. }))
            .map(|(due, _)| *due)
            .collect();
        assert_eq!(watchdogs, vec![700]);
    }

    #[test]
    fn steps_fire_at_their_ticks_with_detonation_and_advance() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();

        let anchors_at = |host: &SimulatedHost| host.inspect(&world, |w| w.anchors.len()).unwrap();

        for (tick, expected) in [(21, 0), (22, 1), (43, 1), (44, 2), (66, 3), (87, 3), (88, 4)] {
            run_to(&mut svc, tick);
            assert_eq!(anchors_at(&host), expected, "anchors at tick {}", tick);
        }

        // Each step is spawn → detonation → particle → advance, in that order.
        let effects: Vec<_> = calls(&host, &world)
            .into_iter()
            .filter(|c| !matches!(c, SimCall::ChunkLoaded(_)))
            .collect();
        assert_eq!(effects.len(), 16);
        for step in effects.chunks(4) {
            assert!(matches!(step[0], SimCall::AnchorSpawned(_)));
            assert!(matches!(step[1], SimCall::Detonation(_, power) if power == 0.0));
            assert!(matches!(step[2], SimCall::Particle(_, _)));
            assert_eq!(step[3], SimCall::DestructionResumed);
        }

        let bases_hidden = host
            .inspect(&world, |w| w.anchors.iter().all(|a| !a.show_base))
            .unwrap();
        assert!(bases_hidden);
    }

    #[test]
    fn unloaded_chunks_are_loaded_before_spawning() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        run_to(&mut svc, 88);

        // East and South share chunk [0,0]; West and North sit in their own.
        let loaded = host
            .inspect(&world, |w| w.count_calls(|c| matches!(c, SimCall::ChunkLoaded(_))))
            .unwrap();
        assert_eq!(loaded, 3);
    }

    // -----------------------------------------------------------------------
    // Idempotence guards
    // -----------------------------------------------------------------------

    #[test]
    fn start_with_live_boss_is_a_no_op() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        host.spawn_boss(&world);

        let outcome = svc
            .start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        assert_eq!(outcome, StartOutcome::Skipped(SkipReason::BossPresent));
        assert_eq!(svc.scheduler().pending_len(), 0);
        assert!(!svc.world_state(&world).unwrap().has_armed_watchdog());

        run_to(&mut svc, 800);
        assert!(calls(&host, &world).is_empty());
        assert_eq!(status(&svc, &world), RespawnStatus::Idle);
    }

    #[test]
    fn start_while_running_is_a_no_op() {
        let (mut svc, _host, world) = make_service(RespawnConfig::default());
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        let pending = svc.scheduler().pending_len();

        let outcome = svc
            .handle_participant_join(&world, PORTAL)
            .unwrap();
        assert_eq!(outcome, StartOutcome::Skipped(SkipReason::AlreadyRunning));
        assert_eq!(svc.scheduler().pending_len(), pending);
        assert_eq!(svc.world_state(&world).unwrap().sequences_started(), 1);
    }

    #[test]
    fn delayed_sequence_aborts_if_boss_appeared_meanwhile() {
        let (mut svc, host, world) = make_service(RespawnConfig {
            join_delay_ticks: 40,
            ..Default::default()
        });
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        host.spawn_boss(&world);

        let events = run_to(&mut svc, 200);
        assert!(events.iter().any(|e| matches!(
            e,
            RespawnEvent::SequenceSkipped { reason: SkipReason::BossPresent, .. }
        )));
        assert_eq!(status(&svc, &world), RespawnStatus::Idle);
        assert_eq!(svc.scheduler().pending_len(), 0);
        assert!(calls(&host, &world).is_empty());
    }

    #[test]
    fn unknown_world_is_rejected() {
        let (mut svc, _host, _world) = make_service(RespawnConfig::default());
        let err = svc
            .start_respawn(&WorldId::new("overworld"), RespawnTrigger::Join, PORTAL)
            .unwrap_err();
        assert!(matches!(err, RespawnError::UnsupportedWorld(_)));
        assert_eq!(svc.stats().tracked_worlds, 0);
    }

    // -----------------------------------------------------------------------
    // Watchdog
    // -----------------------------------------------------------------------

    #[test]
    fn watchdog_settles_when_boss_present() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        svc.registry_mut()
            .register(Template::new("crimson", "Crimson", 1.0))
            .unwrap();
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();

        run_to(&mut svc, 699);
        assert!(host.inspect(&world, |w| w.boss_alive).unwrap());
        assert_eq!(status(&svc, &world), RespawnStatus::Running);

        let events = run_to(&mut svc, 700);
        assert_eq!(
            events,
            vec![RespawnEvent::WatchdogSettled {
                world: world.clone(),
                anchors_neutralized: 4,
            }]
        );

        let state = svc.world_state(&world).unwrap();
        assert_eq!(state.status(), RespawnStatus::Idle);
        assert!(state.template().is_none());
        assert_eq!(state.live_template().unwrap().id, "crimson");

        let locked = host
            .inspect(&world, |w| w.anchors.iter().any(|a| a.invulnerable || a.beam_locked))
            .unwrap();
        assert!(!locked);
        assert_eq!(svc.stats().forced_restarts, 0);
        assert!(!calls(&host, &world).contains(&SimCall::BattleReset));
    }

    #[test]
    fn watchdog_forces_exactly_one_restart_when_boss_absent() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        host.queue_stalls(&world, 1);
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();

        let events = run_to(&mut svc, 700);
        assert!(!host.inspect(&world, |w| w.boss_alive).unwrap());

        let restarts = events
            .iter()
            .filter(|e| matches!(e, RespawnEvent::WatchdogRestarted { anchors_removed: 4, .. }))
            .count();
        let forced_starts = events
            .iter()
            .filter(|e| matches!(
                e,
                RespawnEvent::SequenceStarted { trigger: RespawnTrigger::Forced, .. }
            ))
            .count();
        assert_eq!(restarts, 1);
        assert_eq!(forced_starts, 1);

        let host_calls = calls(&host, &world);
        let reset_at = host_calls
            .iter()
            .position(|c| *c == SimCall::BattleReset)
            .unwrap();
        assert_eq!(host_calls[reset_at + 1], SimCall::AnchorsRemoved(4));
        assert_eq!(host.inspect(&world, |w| w.anchors.len()).unwrap(), 0);

        let state = svc.world_state(&world).unwrap();
        assert_eq!(state.status(), RespawnStatus::Running);
        assert_eq!(state.sequences_started(), 2);
        assert_eq!(svc.stats().forced_restarts, 1);

        // Restarted sequence is re-staged from the watchdog tick.
        let dues: Vec<_> = svc
            .scheduler()
            .pending()
            .iter()
            .map(|(due, _)| *due)
            .collect();
        assert_eq!(dues, vec![722, 744, 766, 788, 1400]);
    }

    #[test]
    fn rearmed_watchdog_fires_once_and_original_never_refires() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        host.queue_stalls(&world, 1);
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();

        let events = run_to(&mut svc, 3000);
        let watchdog_events: Vec<_> = events
            .iter()
            .filter(|e| matches!(
                e,
                RespawnEvent::WatchdogRestarted { .. } | RespawnEvent::WatchdogSettled { .. }
            ))
            .collect();
        assert_eq!(watchdog_events.len(), 2);
        assert!(matches!(watchdog_events[0], RespawnEvent::WatchdogRestarted { .. }));
        assert!(matches!(watchdog_events[1], RespawnEvent::WatchdogSettled { .. }));

        assert!(host.inspect(&world, |w| w.boss_alive).unwrap());
        assert_eq!(status(&svc, &world), RespawnStatus::Idle);
        assert_eq!(svc.stats().forced_restarts, 1);
        assert_eq!(svc.scheduler().pending_len(), 0);
    }

    #[test]
    fn configurable_timeout_is_honoured() {
        let (mut svc, host, world) = make_service(RespawnConfig {
            watchdog_timeout_ticks: 800,
            ..Default::default()
        });
        host.queue_stalls(&world, 1);
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();

        assert!(run_to(&mut svc, 799)
            .iter()
            .all(|e| !matches!(e, RespawnEvent::WatchdogRestarted { .. })));
        assert!(run_to(&mut svc, 800)
            .iter()
            .any(|e| matches!(e, RespawnEvent::WatchdogRestarted { .. })));
    }

    #[test]
    fn cleared_worlds_ignore_pending_watchdogs() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        host.queue_stalls(&world, 1);
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        svc.clear_worlds();

        run_to(&mut svc, 800);
        assert!(!calls(&host, &world).contains(&SimCall::BattleReset));
        assert_eq!(svc.stats().tracked_worlds, 0);
        assert_eq!(svc.stats().forced_restarts, 0);
    }

    // -----------------------------------------------------------------------
    // Templates
    // -----------------------------------------------------------------------

    #[test]
    fn fallback_template_used_when_registry_empty() {
        let (mut svc, _host, world) = make_service(RespawnConfig::default());
        svc.set_fallback_template(Some(Template::new("vanilla", "Ender Dragon", 1.0)));
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        assert_eq!(
            svc.world_state(&world).unwrap().template().unwrap().id,
            "vanilla"
        );
    }

    #[test]
    fn sequence_runs_without_any_template() {
        let (mut svc, _host, world) = make_service(RespawnConfig::default());
        let outcome = svc
            .start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        assert_eq!(outcome, StartOutcome::Started);
        assert!(svc.world_state(&world).unwrap().template().is_none());
    }

    #[test]
    fn battle_handle_is_cached_per_world() {
        let (mut svc, _host, world) = make_service(RespawnConfig::default());
        let a = svc.battle_for(&world).unwrap();
        let b = svc.battle_for(&world).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.portal_location(), PORTAL);
    }

    // -----------------------------------------------------------------------
    // Delayed triggers, spawn and death
    // -----------------------------------------------------------------------

    #[test]
    fn join_delay_postpones_the_sequence() {
        let (mut svc, _host, world) = make_service(RespawnConfig {
            join_delay_ticks: 100,
            ..Default::default()
        });
        let outcome = svc
            .handle_participant_join(&world, PORTAL)
            .unwrap();
        assert_eq!(outcome, StartOutcome::Scheduled { delay_ticks: 100 });
        assert_eq!(status(&svc, &world), RespawnStatus::Running);
        assert_eq!(svc.world_state(&world).unwrap().sequences_started(), 0);

        run_to(&mut svc, 100);
        assert_eq!(svc.world_state(&world).unwrap().sequences_started(), 1);
        let dues: Vec<_> = svc
            .scheduler()
            .pending()
            .iter()
            .map(|(due, _)| *due)
            .collect();
        assert_eq!(dues, vec![122, 144, 166, 188, 800]);
    }

    #[test]
    fn boss_spawn_report_settles_world_early() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        svc.registry_mut()
            .register(Template::new("frost", "Frost", 1.0))
            .unwrap();
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        run_to(&mut svc, 88);

        let template = svc.handle_boss_spawned(&world).unwrap();
        assert_eq!(template.id, "frost");

        let state = svc.world_state(&world).unwrap();
        assert_eq!(state.status(), RespawnStatus::Idle);
        assert!(!state.has_armed_watchdog());

        // Anchors are released right away instead of at the watchdog.
        let locked = host
            .inspect(&world, |w| w.anchors.iter().any(|a| a.invulnerable))
            .unwrap();
        assert!(!locked);
        assert!(calls(&host, &world).contains(&SimCall::AnchorsNeutralized(4)));

        let events = run_to(&mut svc, 800);
        assert!(events.iter().all(|e| !matches!(
            e,
            RespawnEvent::WatchdogSettled { .. } | RespawnEvent::WatchdogRestarted { .. }
        )));
        assert_eq!(host.inspect(&world, |w| w.anchors.len()).unwrap(), 4);
    }

    #[test]
    fn boss_death_drops_loot_then_respawns() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        let mut template = Template::new("hoarder", "Hoarder", 1.0);
        template.loot = LootTable {
            egg_chance: 1.0,
            chest_chance: 1.0,
            chest_name: None,
            min_rolls: 1,
            max_rolls: 1,
            items: vec![LootItem {
                item: "elytra".into(),
                weight: 1.0,
                min_amount: 2,
                max_amount: 2,
            }],
        };
        svc.registry_mut().register(template).unwrap();

        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        run_to(&mut svc, 700);
        assert_eq!(status(&svc, &world), RespawnStatus::Idle);

        // Animation is 150 ticks into its 200-tick run.
        host.kill_boss(&world, Some(150));
        let outcome = svc.handle_boss_death(&world, PORTAL).unwrap();
        assert_eq!(outcome, StartOutcome::Scheduled { delay_ticks: 50 });

        let events = run_to(&mut svc, 749);
        assert!(events
            .iter()
            .all(|e| !matches!(e, RespawnEvent::LootDropped { .. })));

        let events = run_to(&mut svc, 750);
        let loot_pos = events
            .iter()
            .position(|e| matches!(e, RespawnEvent::LootDropped { .. }))
            .unwrap();
        let start_pos = events
            .iter()
            .position(|e| matches!(
                e,
                RespawnEvent::SequenceStarted { trigger: RespawnTrigger::Death, .. }
            ))
            .unwrap();
        assert!(loot_pos < start_pos);

        let (at, loot) = host.inspect(&world, |w| w.loot[0].clone()).unwrap();
        assert_eq!(at, PORTAL);
        assert!(loot.egg);
        let chest = loot.chest.unwrap();
        assert_eq!(chest.items.len(), 1);
        assert_eq!(chest.items[0].item, "elytra");
        assert_eq!(chest.items[0].amount, 2);

        let state = svc.world_state(&world).unwrap();
        assert!(state.live_template().is_none());
        assert_eq!(state.status(), RespawnStatus::Running);
        assert_eq!(state.sequences_started(), 2);
    }

    #[test]
    fn first_kill_leaves_the_egg_to_the_host() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        svc.set_fallback_template(Some(Template::new("vanilla", "Ender Dragon", 1.0)));
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        run_to(&mut svc, 700);

        host.update(&world, |w| w.previously_killed = false);
        host.kill_boss(&world, None);
        let outcome = svc.handle_boss_death(&world, PORTAL).unwrap();
        assert_eq!(outcome, StartOutcome::Started);

        run_to(&mut svc, 701);
        let loot = host.inspect(&world, |w| w.loot[0].1.clone()).unwrap();
        assert!(!loot.egg);
    }

    // -----------------------------------------------------------------------
    // Superseded sequences
    // -----------------------------------------------------------------------

    fn started_triggers(events: &[RespawnEvent]) -> Vec<RespawnTrigger> {
        events
            .iter()
            .filter_map(|e| match e {
                RespawnEvent::SequenceStarted { trigger, .. } => Some(*trigger),
                _ => None,
            })
            .collect()
    }

    /// Spawn reported at 88, boss killed at `kill_at` with a full animation
    /// still to play.
    fn kill_after_reported_spawn(
        kill_at: u64,
    ) -> (RespawnService, SimulatedHost, WorldId, Vec<RespawnEvent>) {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();

        let mut events = run_to(&mut svc, 88);
        svc.handle_boss_spawned(&world).unwrap();
        events.extend(run_to(&mut svc, kill_at));

        host.kill_boss(&world, Some(0));
        let outcome = svc.handle_boss_death(&world, PORTAL).unwrap();
        assert_eq!(outcome, StartOutcome::Scheduled { delay_ticks: 200 });

        events.extend(run_to(&mut svc, 900));
        (svc, host, world, events)
    }

    #[test]
    fn death_animation_spanning_old_deadline_is_not_a_stall() {
        let (svc, host, world, events) = kill_after_reported_spawn(520);

        assert_eq!(
            started_triggers(&events),
            vec![RespawnTrigger::Join, RespawnTrigger::Death]
        );
        assert!(events
            .iter()
            .all(|e| !matches!(e, RespawnEvent::WatchdogRestarted { .. })));
        assert!(!calls(&host, &world).contains(&SimCall::BattleReset));
        assert_eq!(svc.stats().forced_restarts, 0);

        // One set of anchors per sequence, never two in flight.
        let spawned = host
            .inspect(&world, |w| w.count_calls(|c| matches!(c, SimCall::AnchorSpawned(_))))
            .unwrap();
        assert_eq!(spawned, 8);

        let dues: Vec<_> = svc
            .scheduler()
            .pending()
            .iter()
            .map(|(due, _)| *due)
            .collect();
        assert_eq!(dues, vec![1420]);
        assert_eq!(status(&svc, &world), RespawnStatus::Running);
    }

    #[test]
    fn death_after_old_deadline_still_starts_its_sequence() {
        let (svc, _host, world, events) = kill_after_reported_spawn(600);

        assert_eq!(
            started_triggers(&events),
            vec![RespawnTrigger::Join, RespawnTrigger::Death]
        );
        assert_eq!(svc.stats().forced_restarts, 0);
        assert_eq!(status(&svc, &world), RespawnStatus::Running);
        assert_eq!(svc.world_state(&world).unwrap().sequences_started(), 2);
    }

    #[test]
    fn death_supersedes_a_pending_delayed_start() {
        let (mut svc, host, world) = make_service(RespawnConfig {
            join_delay_ticks: 100,
            ..Default::default()
        });
        assert_eq!(
            svc.handle_participant_join(&world, PORTAL).unwrap(),
            StartOutcome::Scheduled { delay_ticks: 100 }
        );
        run_to(&mut svc, 10);

        // A boss the engine never staged dies before the join delay ends.
        host.kill_boss(&world, None);
        let outcome = svc.handle_boss_death(&world, PORTAL).unwrap();
        assert_eq!(outcome, StartOutcome::Started);

        // The join start due at 100 never runs.
        let events = run_to(&mut svc, 200);
        assert_eq!(started_triggers(&events), vec![RespawnTrigger::Death]);
        assert_eq!(svc.world_state(&world).unwrap().sequences_started(), 1);
        let spawned = host
            .inspect(&world, |w| w.count_calls(|c| matches!(c, SimCall::AnchorSpawned(_))))
            .unwrap();
        assert_eq!(spawned, 4);
    }

    #[test]
    fn death_mid_sequence_voids_remaining_steps() {
        let (mut svc, host, world) = make_service(RespawnConfig {
            death_delay_ticks: 100,
            ..Default::default()
        });
        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        run_to(&mut svc, 50);

        host.kill_boss(&world, None);
        let outcome = svc.handle_boss_death(&world, PORTAL).unwrap();
        assert_eq!(outcome, StartOutcome::Scheduled { delay_ticks: 100 });

        // Steps at 66 and 88 and the watchdog at 700 belong to the old run.
        run_to(&mut svc, 149);
        assert_eq!(host.inspect(&world, |w| w.anchors.len()).unwrap(), 2);

        run_to(&mut svc, 800);
        assert_eq!(svc.world_state(&world).unwrap().sequences_started(), 2);
        assert!(!calls(&host, &world).contains(&SimCall::BattleReset));
    }

    // -----------------------------------------------------------------------
    // Stats & isolation
    // -----------------------------------------------------------------------

    #[test]
    fn worlds_keep_isolated_state() {
        let (mut svc, host, world) = make_service(RespawnConfig::default());
        let other = WorldId::new("the_end_2");
        host.add_world(other.clone(), Location::new(100.0, 60.0, 100.0));
        host.queue_stalls(&other, 1);

        svc.start_respawn(&world, RespawnTrigger::Join, PORTAL)
            .unwrap();
        svc.start_respawn(&other, RespawnTrigger::Join, Location::new(100.0, 60.0, 100.0))
            .unwrap();

        let stats = svc.stats();
        assert_eq!(stats.tracked_worlds, 2);
        assert_eq!(stats.running_sequences, 2);

        run_to(&mut svc, 700);
        assert_eq!(status(&svc, &world), RespawnStatus::Idle);
        assert_eq!(status(&svc, &other), RespawnStatus::Running);
        assert!(!calls(&host, &world).contains(&SimCall::BattleReset));
        assert!(calls(&host, &other).contains(&SimCall::BattleReset));

        let stats = svc.stats();
        assert_eq!(stats.running_sequences, 1);
        assert_eq!(stats.forced_restarts, 1);
        assert_eq!(stats.current_tick, 700);
    }
}
