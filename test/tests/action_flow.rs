use std::{cell::Cell, rc::Rc};

use brisk_client::{ClientError, ConnectionState};
use brisk_server::{ActionEvent, GlobalActionPolicy, ServerConfig, ServerError};
use brisk_shared::{
    ActionCall, ActionError, AssetId, BehaviourSchema, EntityId, InstantiateRequest, Value,
};
use brisk_test::{Harness, HarnessError, ACTION_DAMAGE, ACTION_PING, PLAYER, PLAYER_CONTROLLER};

const CONTROLLER_INDEX: u8 = 1;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Two ready clients, each with a player entity, and a damage handler on the server
fn setup(policy: GlobalActionPolicy) -> (Harness, EntityId) {
    init();
    let config = ServerConfig {
        player_prefab: Some(PLAYER.to_string()),
        global_action_policy: policy,
        ..Default::default()
    };
    let mut harness = Harness::new(config);
    harness.add_client();
    harness.add_client();
    harness.run_until_ready();

    harness
        .server
        .register_action(ACTION_DAMAGE, |context, args| {
            let amount = args.first().and_then(Value::as_i64).unwrap_or(0);
            let health = context
                .entity
                .get(PLAYER_CONTROLLER, "health")
                .and_then(Value::as_i64)
                .unwrap_or(0);
            let remaining = (health - amount).max(0) as u16;
            context
                .entity
                .set(PLAYER_CONTROLLER, "health", Value::U16(remaining))?;
            Ok(())
        })
        .unwrap();

    let player = harness.clients[0].owned_entity_ids()[0];
    (harness, player)
}

/// Counts how often each client's damage handler runs
fn count_client_damage(harness: &mut Harness) -> Vec<Rc<Cell<u32>>> {
    let mut counters = Vec::new();
    for client in &mut harness.clients {
        let counter = Rc::new(Cell::new(0));
        let handle = counter.clone();
        client
            .register_action(ACTION_DAMAGE, move |_, _| {
                handle.set(handle.get() + 1);
                Ok(())
            })
            .unwrap();
        counters.push(counter);
    }
    counters
}

fn damage(entity_id: EntityId, behaviour_index: u8, amount: u16) -> ActionCall {
    ActionCall::new(
        ACTION_DAMAGE,
        entity_id,
        behaviour_index,
        &[Value::U16(amount)],
    )
}

fn server_health(harness: &Harness, entity_id: &EntityId) -> Option<Value> {
    harness
        .server
        .entity(entity_id)
        .and_then(|entity| entity.get(PLAYER_CONTROLLER, "health"))
        .cloned()
}

#[test]
fn global_action_reaches_every_client_including_sender() {
    let (mut harness, player) = setup(GlobalActionPolicy::IncludeSender);
    let counters = count_client_damage(&mut harness);

    harness.clients[0]
        .action_global(damage(player, CONTROLLER_INDEX, 30))
        .unwrap();
    let mut step = harness.step();

    assert_eq!(server_health(&harness, &player), Some(Value::U16(70)));
    assert_eq!(step.server.read::<ActionEvent>().count(), 1);
    assert_eq!(counters[0].get(), 1);
    assert_eq!(counters[1].get(), 1);
    let relayed: Vec<ActionCall> = step.client(1).read::<brisk_client::ActionEvent>().collect();
    assert_eq!(relayed, vec![damage(player, CONTROLLER_INDEX, 30)]);
}

#[test]
fn global_action_can_skip_the_sender() {
    let (mut harness, player) = setup(GlobalActionPolicy::ExcludeSender);
    let counters = count_client_damage(&mut harness);

    harness.clients[0]
        .action_global(damage(player, CONTROLLER_INDEX, 30))
        .unwrap();
    harness.settle(2);

    assert_eq!(counters[0].get(), 0);
    assert_eq!(counters[1].get(), 1);
}

#[test]
fn local_action_runs_on_the_server_only() {
    let (mut harness, player) = setup(GlobalActionPolicy::IncludeSender);
    let counters = count_client_damage(&mut harness);

    harness.clients[1]
        .action_local(damage(player, CONTROLLER_INDEX, 100))
        .unwrap();
    let mut step = harness.step();
    harness.settle(1);

    assert_eq!(server_health(&harness, &player), Some(Value::U16(0)));
    assert_eq!(step.server.read::<ActionEvent>().count(), 1);
    assert_eq!(counters[0].get(), 0);
    assert_eq!(counters[1].get(), 0);
}

#[test]
fn unresolvable_actions_are_dropped_without_a_reply() {
    let (mut harness, player) = setup(GlobalActionPolicy::IncludeSender);
    let counters = count_client_damage(&mut harness);

    let calls = [
        // no such entity
        damage(EntityId::new(99), CONTROLLER_INDEX, 10),
        // behaviour index past the end
        damage(player, 5, 10),
        // index 0 is the transform, not the controller
        damage(player, 0, 10),
        // undeclared action
        ActionCall::new(42, player, CONTROLLER_INDEX, &[]),
        // missing argument
        ActionCall::new(ACTION_DAMAGE, player, CONTROLLER_INDEX, &[]),
    ];
    for call in calls {
        harness.clients[0].action_global(call).unwrap();
    }

    let mut step = harness.try_step().unwrap();
    assert!(!step.server.has::<ActionEvent>());
    assert!(!step.server.has::<brisk_server::ErrorEvent>());
    harness.settle(2);

    assert_eq!(server_health(&harness, &player), Some(Value::U16(100)));
    assert_eq!(counters[0].get(), 0);
    assert_eq!(counters[1].get(), 0);
}

#[test]
fn action_without_a_handler_is_still_relayed() {
    let (mut harness, player) = setup(GlobalActionPolicy::IncludeSender);
    let pings = Rc::new(Cell::new(0));
    let handle = pings.clone();
    harness.clients[1]
        .register_action(ACTION_PING, move |context, _| {
            assert_eq!(context.behaviour_index, 0);
            handle.set(handle.get() + 1);
            Ok(())
        })
        .unwrap();

    harness.clients[0]
        .action_global(ActionCall::new(ACTION_PING, player, 0, &[]))
        .unwrap();
    let mut step = harness.step();

    assert_eq!(step.server.read::<ActionEvent>().count(), 1);
    assert_eq!(pings.get(), 1);
}

#[test]
fn failing_server_handler_aborts_the_pump_and_keeps_events() {
    init();
    let mut harness = Harness::new(ServerConfig::default());
    harness.add_client();
    harness.run_until_ready();
    harness
        .server
        .register_action(ACTION_PING, |_, _| Err("ping refused".into()))
        .unwrap();
    let ship = harness.server.spawn_entity(AssetId::new(2)).unwrap();
    harness.settle(2);

    harness.clients[0]
        .instantiate(InstantiateRequest {
            asset_id: AssetId::new(2),
            ..Default::default()
        })
        .unwrap();
    harness.clients[0]
        .action_local(ActionCall::new(ACTION_PING, ship, 0, &[]))
        .unwrap();

    match harness.try_step() {
        Err(HarnessError::Server(ServerError::ActionHandler(ActionError::Handler {
            action_id,
            ..
        }))) => assert_eq!(action_id, ACTION_PING),
        other => panic!("expected a handler failure, got {:?}", other.err()),
    }

    // the spawn that came before the failing call is reported next time
    let mut step = harness.step();
    assert_eq!(
        step.server
            .read::<brisk_server::SpawnEntityEvent>()
            .count(),
        1
    );
}

#[test]
fn failing_client_handler_surfaces_from_receive() {
    let (mut harness, player) = setup(GlobalActionPolicy::IncludeSender);
    harness.clients[0]
        .register_action(ACTION_DAMAGE, |_, _| Err("no damage today".into()))
        .unwrap();
    let owner = harness.server.entity_owner(&player).unwrap();

    harness
        .server
        .action_client(&owner, damage(player, CONTROLLER_INDEX, 1))
        .unwrap();

    match harness.try_step() {
        Err(HarnessError::Client(ClientError::ActionHandler(ActionError::Handler {
            action_id,
            ..
        }))) => assert_eq!(action_id, ACTION_DAMAGE),
        other => panic!("expected a handler failure, got {:?}", other.err()),
    }
    assert!(harness.clients[0].is_ready());
}

#[test]
fn mismatched_protocol_is_refused() {
    init();
    let mut harness = Harness::new(ServerConfig::default());
    let mut protocol = brisk_test::protocol();
    protocol
        .add_behaviour(BehaviourSchema::new("Shield").reliable("points", Value::I32(5)))
        .unwrap();
    harness.add_client_with(protocol);

    let mut mismatch = false;
    let mut server_disconnects = 0;
    for _ in 0..5 {
        let mut step = harness.step();
        server_disconnects += step.server.read::<brisk_server::DisconnectEvent>().count();
        for error in step.client(0).read::<brisk_client::ErrorEvent>() {
            mismatch |= matches!(error, ClientError::ProtocolMismatch { .. });
        }
    }

    assert!(mismatch);
    assert_eq!(server_disconnects, 1);
    assert_eq!(harness.server.users_count(), 0);
    assert_eq!(
        harness.clients[0].connection_state(),
        ConnectionState::Disconnected
    );
}
