use brisk_client::{DespawnEntityEvent, ErrorEvent, SpawnEntityEvent, UpdateEntityEvent};
use brisk_server::{DisconnectEvent, LevelEntity, ServerConfig};
use brisk_shared::{AssetId, EntityId, InstantiateRequest, Platform, Value, Vec3};
use brisk_test::{catalog, Harness, RawPeer, PLAYER, PLAYER_CONTROLLER};

const SHIP_ASSET: AssetId = AssetId::new(2);

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn ready_harness(clients: usize, config: ServerConfig) -> Harness {
    init();
    let mut harness = Harness::new(config);
    for _ in 0..clients {
        harness.add_client();
    }
    harness.run_until_ready();
    harness
}

fn with_players() -> ServerConfig {
    ServerConfig {
        player_prefab: Some(PLAYER.to_string()),
        ..Default::default()
    }
}

/// The one entity a client owns
fn player_of(harness: &mut Harness, client: usize) -> EntityId {
    let owned = harness.clients[client].owned_entity_ids();
    assert_eq!(owned.len(), 1);
    owned[0]
}

#[test]
fn catalog_sync_mirrors_names_and_blob() {
    let harness = ready_harness(1, ServerConfig::default());
    let client = &harness.clients[0];

    assert_eq!(client.catalog().name(1), "Alien");
    assert_eq!(client.catalog().name(2), "Ship");
    assert_eq!(client.catalog().id("Player"), 3);
    assert_eq!(Some(client.asset_blob()), catalog().blob(Platform::LINUX));
}

#[test]
fn identical_ticks_send_one_update() {
    let mut harness = ready_harness(1, ServerConfig::default());
    let ship = harness.server.spawn_entity(SHIP_ASSET).unwrap();
    harness
        .server
        .entity_mut(&ship)
        .unwrap()
        .set_position(Vec3::new(1.0, 2.0, 3.0));

    let mut updates = 0;
    for _ in 0..5 {
        updates += harness.step().client(0).read::<UpdateEntityEvent>().count();
    }
    assert_eq!(updates, 1);
    assert_eq!(
        harness.clients[0].entity(&ship).unwrap().position(),
        Vec3::new(1.0, 2.0, 3.0)
    );

    // a change is sent once
    harness
        .server
        .entity_mut(&ship)
        .unwrap()
        .set_position(Vec3::new(4.0, 2.0, 3.0));
    let mut updates = 0;
    for _ in 0..5 {
        updates += harness.step().client(0).read::<UpdateEntityEvent>().count();
    }
    assert_eq!(updates, 1);
}

#[test]
fn forced_sync_resends_unchanged_state() {
    let mut harness = ready_harness(1, ServerConfig::default());
    let ship = harness.server.spawn_entity(SHIP_ASSET).unwrap();
    harness.settle(3);

    assert!(harness.server.flag_sync(&ship));
    let mut updates = 0;
    for _ in 0..3 {
        updates += harness.step().client(0).read::<UpdateEntityEvent>().count();
    }
    assert_eq!(updates, 1);
}

#[test]
fn connection_that_never_gets_ready_sees_no_entity_traffic() {
    init();
    let mut harness = Harness::new(ServerConfig::default());
    harness.add_client();
    let mut lurker = RawPeer::connect(&harness.hub, &harness.server_address);
    harness.run_until_ready();

    let ship = harness.server.spawn_entity(SHIP_ASSET).unwrap();
    harness
        .server
        .entity_mut(&ship)
        .unwrap()
        .set_position(Vec3::ONE);
    harness.settle(4);
    lurker.drain();

    // the handshake went through, entity traffic did not
    assert!(!lurker.received().is_empty());
    assert_eq!(lurker.entity_traffic(), 0);
    assert_eq!(
        harness.clients[0].entity(&ship).unwrap().position(),
        Vec3::ONE
    );
}

#[test]
fn late_joiner_receives_a_snapshot() {
    init();
    let mut harness = Harness::new(ServerConfig::default());
    let ship = harness.server.spawn_entity(SHIP_ASSET).unwrap();
    harness
        .server
        .entity_mut(&ship)
        .unwrap()
        .set_scale(Vec3::new(2.0, 2.0, 2.0));
    harness.settle(2);

    harness.add_client();
    harness.run_until_ready();

    let entity = harness.clients[0].entity(&ship).unwrap();
    assert!(!entity.is_owned());
    assert_eq!(entity.scale(), Vec3::new(2.0, 2.0, 2.0));
}

#[test]
fn late_joiner_receives_the_loaded_level() {
    init();
    let mut harness = Harness::new(ServerConfig::default());
    let level = [
        LevelEntity::new("Ship", Vec3::new(10.0, 0.0, -4.0), Vec3::new(0.0, 90.0, 0.0)),
        LevelEntity::new("Boulder", Vec3::new(1.0, 1.0, 1.0), Vec3::ZERO),
        LevelEntity::new("Alien", Vec3::new(-2.0, 0.5, 3.0), Vec3::ZERO),
    ];
    let spawned = harness.server.load_level(&level);
    assert_eq!(spawned, vec![EntityId::new(1), EntityId::new(2)]);
    harness.settle(2);

    harness.add_client();
    harness.run_until_ready();

    let client = &mut harness.clients[0];
    assert_eq!(client.entity_ids().len(), 2);
    let ship = client.entity(&spawned[0]).unwrap();
    assert!(!ship.is_owned());
    assert_eq!(ship.asset_id(), SHIP_ASSET);
    assert_eq!(ship.position(), Vec3::new(10.0, 0.0, -4.0));
    assert_eq!(ship.rotation(), Vec3::new(0.0, 90.0, 0.0));
    let alien = client.entity(&spawned[1]).unwrap();
    assert_eq!(alien.asset_id(), AssetId::new(1));
    assert_eq!(alien.position(), Vec3::new(-2.0, 0.5, 3.0));
}

#[test]
fn repeated_destroy_is_a_no_op() {
    let mut harness = ready_harness(1, ServerConfig::default());
    let ids: Vec<EntityId> = (0..7)
        .map(|_| harness.server.spawn_entity(SHIP_ASSET).unwrap())
        .collect();
    assert_eq!(ids[6], EntityId::new(7));
    harness.settle(2);

    assert!(harness.server.despawn_entity(&EntityId::new(7)));
    assert!(!harness.server.despawn_entity(&EntityId::new(7)));

    let mut step = harness.step();
    assert_eq!(
        step.client(0).read::<DespawnEntityEvent>().collect::<Vec<_>>(),
        vec![EntityId::new(7)]
    );
    assert!(!step.client(0).has::<ErrorEvent>());
    assert!(harness.clients[0].entity(&EntityId::new(7)).is_none());
    assert_eq!(harness.clients[0].entity_ids().len(), 6);
}

#[test]
fn player_prefab_is_owned_by_its_connection_only() {
    let mut harness = ready_harness(2, with_players());
    let player_a = player_of(&mut harness, 0);
    let player_b = player_of(&mut harness, 1);
    assert_ne!(player_a, player_b);

    assert!(!harness.clients[1].entity(&player_a).unwrap().is_owned());
    assert!(!harness.clients[0].entity(&player_b).unwrap().is_owned());
    assert!(harness.server.entity_owner(&player_a).is_some());
    assert_ne!(
        harness.server.entity_owner(&player_a),
        harness.server.entity_owner(&player_b)
    );
}

#[test]
fn owner_updates_are_relayed_to_other_clients() {
    let mut harness = ready_harness(2, with_players());
    let player_a = player_of(&mut harness, 0);

    let entity = harness.clients[0].entity_mut(&player_a).unwrap();
    entity.set_position(Vec3::new(5.0, 0.0, 0.0));
    entity
        .set(PLAYER_CONTROLLER, "health", Value::U16(42))
        .unwrap();
    harness.settle(3);

    for entity in [
        harness.server.entity(&player_a).unwrap(),
        harness.clients[1].entity(&player_a).unwrap(),
    ] {
        assert_eq!(entity.position(), Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(
            entity.get(PLAYER_CONTROLLER, "health"),
            Some(&Value::U16(42))
        );
    }
}

#[test]
fn updates_from_a_non_owner_are_dropped() {
    let mut harness = ready_harness(2, with_players());
    let player_a = player_of(&mut harness, 0);
    harness.settle(2);

    // client 1 tries to push its own idea of client 0's player
    harness.clients[1]
        .entity_mut(&player_a)
        .unwrap()
        .set_position(Vec3::new(9.0, 9.0, 9.0));
    assert!(harness.clients[1].flag_sync(&player_a));
    harness.settle(3);

    assert_eq!(harness.server.entity(&player_a).unwrap().position(), Vec3::ZERO);
    assert_eq!(
        harness.clients[0].entity(&player_a).unwrap().position(),
        Vec3::ZERO
    );
}

#[test]
fn instantiate_spawns_a_server_owned_entity() {
    let mut harness = ready_harness(2, ServerConfig::default());
    harness.clients[0]
        .instantiate(InstantiateRequest {
            asset_id: SHIP_ASSET,
            position: Some(Vec3::new(0.0, 5.0, 0.0)),
            ..Default::default()
        })
        .unwrap();

    let mut step = harness.step();
    let spawned: Vec<_> = step
        .server
        .read::<brisk_server::SpawnEntityEvent>()
        .collect();
    assert_eq!(spawned.len(), 1);
    let entity_id = spawned[0].1;
    assert_eq!(harness.server.entity_owner(&entity_id), None);
    assert_eq!(
        step.client(1).read::<SpawnEntityEvent>().collect::<Vec<_>>(),
        vec![(entity_id, false)]
    );

    harness.settle(2);
    for client in &harness.clients {
        assert_eq!(
            client.entity(&entity_id).unwrap().position(),
            Vec3::new(0.0, 5.0, 0.0)
        );
    }
}

#[test]
fn owner_destroys_its_entity_everywhere() {
    let mut harness = ready_harness(2, with_players());
    let player_a = player_of(&mut harness, 0);

    // only the owner may destroy
    assert!(!harness.clients[1].destroy_owned(&player_a).unwrap());
    assert!(harness.clients[0].destroy_owned(&player_a).unwrap());
    assert!(!harness.clients[0].destroy_owned(&player_a).unwrap());

    let mut step = harness.step();
    let despawned: Vec<_> = step
        .server
        .read::<brisk_server::DespawnEntityEvent>()
        .map(|(_, entity_id)| entity_id)
        .collect();
    assert_eq!(despawned, vec![player_a]);
    assert!(harness.server.entity(&player_a).is_none());
    assert_eq!(
        step.client(1).read::<DespawnEntityEvent>().collect::<Vec<_>>(),
        vec![player_a]
    );
}

#[test]
fn disconnect_keeps_owned_entities() {
    let mut harness = ready_harness(2, with_players());
    let player_a = player_of(&mut harness, 0);
    let owner = harness.server.entity_owner(&player_a).unwrap();

    harness.clients[0].disconnect().unwrap();
    let mut step = harness.step();
    let disconnected: Vec<_> = step
        .server
        .read::<DisconnectEvent>()
        .map(|(user_key, _)| user_key)
        .collect();
    assert_eq!(disconnected, vec![owner]);

    assert_eq!(harness.server.users_count(), 1);
    assert!(harness.server.entity(&player_a).is_some());
    assert!(harness.clients[1].entity(&player_a).is_some());
    assert!(harness.clients[0].entity_ids().is_empty());
}
