//! Portal anchor slot tests: placement, presence and lookup
#![cfg(feature = "server")]

#[cfg(test)]
mod tests {
    use boss_respawn::battle::BattleProvider;
    use boss_respawn::error::RespawnError;
    use boss_respawn::host::WorldHost;
    use boss_respawn::service::RespawnService;
    use boss_respawn::sim::{SimCall, SimulatedHost};
    use boss_respawn::types::{AnchorSlot, Location, RespawnConfig, RespawnTrigger, WorldId};
    use std::sync::Arc;

    fn portal() -> Location {
        Location::new(10.0, 70.0, -5.0)
    }

    fn make_service() -> (RespawnService, SimulatedHost, WorldId) {
        let host = SimulatedHost::new();
        let world = WorldId::new("the_end");
        host.add_world(world.clone(), portal());
        let svc = RespawnService::new(
            RespawnConfig::default(),
            Arc::new(host.clone()),
            Arc::new(host.clone()),
        );
        (svc, host, world)
    }

    fn spawn_calls(host: &SimulatedHost, world: &WorldId) -> usize {
        host.inspect(world, |w| w.count_calls(|c| matches!(c, SimCall::AnchorSpawned(_))))
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // Positions
    // -----------------------------------------------------------------------

    #[test]
    fn slots_sit_around_the_battle_portal() {
        let (_svc, host, world) = make_service();
        let battle = host.battle_for_world(&world).unwrap();

        let positions: Vec<_> = AnchorSlot::ALL
            .iter()
            .map(|slot| slot.relative_to_portal(battle.as_ref(), 3.0, 3.0))
            .collect();
        assert_eq!(
            positions,
            vec![
                Location::new(13.0, 67.0, -5.0),
                Location::new(10.0, 67.0, -2.0),
                Location::new(7.0, 67.0, -5.0),
                Location::new(10.0, 67.0, -8.0),
            ]
        );
    }

    // -----------------------------------------------------------------------
    // Spawn, get, presence
    // -----------------------------------------------------------------------

    #[test]
    fn spawn_places_anchor_once_per_slot() {
        let (mut svc, host, world) = make_service();
        let anchors = svc.portal_anchors(&world).unwrap();
        assert!(!anchors.is_present(AnchorSlot::East));

        let placed = anchors.spawn(AnchorSlot::East, true).unwrap();
        assert_eq!(placed.position, Location::new(13.0, 67.0, -5.0));
        assert!(placed.invulnerable);
        assert!(!placed.show_base);

        assert!(anchors.is_present(AnchorSlot::East));
        assert_eq!(anchors.get(AnchorSlot::East), Some(placed));
        assert!(!anchors.is_present(AnchorSlot::West));

        // Occupied slot: nothing new is spawned.
        assert!(anchors.spawn(AnchorSlot::East, false).is_none());
        assert_eq!(spawn_calls(&host, &world), 1);
    }

    #[test]
    fn spawn_honours_invulnerability_flag() {
        let (mut svc, host, world) = make_service();
        let anchors = svc.portal_anchors(&world).unwrap();

        let placed = anchors.spawn(AnchorSlot::North, false).unwrap();
        assert!(!placed.invulnerable);

        let sim = host.inspect(&world, |w| w.anchors[0].clone()).unwrap();
        assert!(!sim.invulnerable);
        assert!(!sim.beam_locked);
        assert_eq!(host.neutralize_anchors(&world), 0);
    }

    #[test]
    fn lookup_tolerates_one_block_of_drift() {
        let (mut svc, host, world) = make_service();
        host.spawn_anchor(&world, Location::new(13.5, 67.0, -4.2), false, true);
        host.spawn_anchor(&world, Location::new(7.0, 67.0, -7.5), false, true);

        let anchors = svc.portal_anchors(&world).unwrap();
        assert!(anchors.is_present(AnchorSlot::East));
        assert!(!anchors.is_present(AnchorSlot::West));
        assert!(!anchors.is_present(AnchorSlot::North));
    }

    #[test]
    fn all_spawned_lists_occupied_slots_in_order() {
        let (mut svc, _host, world) = make_service();
        let anchors = svc.portal_anchors(&world).unwrap();
        anchors.spawn(AnchorSlot::West, true).unwrap();
        anchors.spawn(AnchorSlot::East, true).unwrap();

        let slots: Vec<_> = anchors
            .all_spawned()
            .into_iter()
            .map(|(slot, _)| slot)
            .collect();
        assert_eq!(slots, vec![AnchorSlot::East, AnchorSlot::West]);
    }

    // -----------------------------------------------------------------------
    // Interaction with the sequencer
    // -----------------------------------------------------------------------

    #[test]
    fn sequence_from_portal_fills_every_slot() {
        let (mut svc, host, world) = make_service();
        svc.start_respawn(&world, RespawnTrigger::Join, portal())
            .unwrap();
        while svc.current_tick() < 88 {
            svc.tick();
        }

        let anchors = svc.portal_anchors(&world).unwrap();
        assert_eq!(anchors.all_spawned().len(), 4);
        assert_eq!(host.anchors(&world).len(), 4);
        assert!(AnchorSlot::ALL.iter().all(|slot| anchors.is_present(*slot)));
    }

    #[test]
    fn unknown_world_has_no_anchor_view() {
        let (mut svc, _host, _world) = make_service();
        let err = svc
            .portal_anchors(&WorldId::new("overworld"))
            .err()
            .unwrap();
        assert!(matches!(err, RespawnError::UnsupportedWorld(_)));
    }
}
