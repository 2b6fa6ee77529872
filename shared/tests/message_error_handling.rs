use brisk_shared::{
    ActionCall, AssetId, Channel, DeliveryMethod, EntityId, EntityUpdate, HostType,
    MessageError, NetMessage, NetOp, Value,
};

#[test]
fn test_truncated_payloads_are_malformed() {
    let message = NetMessage::StringsData {
        index: 1,
        name: "Alien".to_string(),
    };
    let bytes = message.to_bytes();

    for length in 1..bytes.len() {
        let result = NetMessage::read(&bytes[..length], HostType::Server);
        assert_eq!(
            result,
            Err(MessageError::Malformed {
                opcode: NetOp::StringsData
            }),
            "prefix of length {} should not decode",
            length
        );
    }
    assert_eq!(NetMessage::read(&bytes, HostType::Server), Ok(message));
}

#[test]
fn test_action_messages_keep_raw_arguments() {
    let call = ActionCall::new(9, EntityId::new(4), 2, &[Value::I32(-1), Value::Bool(true)]);
    let message = NetMessage::ActionGlobal(call.clone());
    let bytes = message.to_bytes();

    assert_eq!(bytes[0], 0xA1);
    assert_eq!(&bytes[1..5], &9u32.to_le_bytes());
    assert_eq!(&bytes[5..9], &4u32.to_le_bytes());
    assert_eq!(bytes[9], 2);
    assert_eq!(&bytes[10..], call.args.as_slice());

    let Ok(NetMessage::ActionGlobal(decoded)) = NetMessage::read(&bytes, HostType::Client) else {
        panic!("expected an ActionGlobal");
    };
    assert_eq!(decoded, call);
}

#[test]
fn test_client_actions_are_rejected_from_server() {
    let call = ActionCall::new(1, EntityId::new(1), 0, &[]);
    let bytes = NetMessage::ActionLocal(call).to_bytes();
    assert_eq!(
        NetMessage::read(&bytes, HostType::Server),
        Err(MessageError::WrongDirection {
            opcode: NetOp::ActionLocal,
            sender: HostType::Server
        })
    );
}

#[test]
fn test_entity_updates_travel_both_ways() {
    let update = NetMessage::EntityUpdate(EntityUpdate {
        entity_id: EntityId::new(12),
        channel: Channel::Reliable,
        payload: vec![1, 0, 0, 0],
    });
    let bytes = update.to_bytes();

    assert_eq!(NetMessage::read(&bytes, HostType::Server), Ok(update.clone()));
    assert_eq!(NetMessage::read(&bytes, HostType::Client), Ok(update.clone()));
    assert_eq!(update.delivery_method(), DeliveryMethod::ReliableOrdered);
}

#[test]
fn test_reliable_control_messages() {
    for message in [
        NetMessage::Ready,
        NetMessage::DestroyEntity {
            entity_id: EntityId::new(7),
        },
        NetMessage::NewEntity {
            asset_id: AssetId::new(1),
            entity_id: EntityId::new(7),
            is_owner: false,
        },
    ] {
        assert_eq!(message.delivery_method(), DeliveryMethod::ReliableOrdered);
    }
}

#[test]
fn test_invalid_bool_in_new_entity() {
    let mut bytes = NetMessage::NewEntity {
        asset_id: AssetId::new(1),
        entity_id: EntityId::new(2),
        is_owner: true,
    }
    .to_bytes();
    let last = bytes.len() - 1;
    bytes[last] = 2;
    assert_eq!(
        NetMessage::read(&bytes, HostType::Server),
        Err(MessageError::Malformed {
            opcode: NetOp::NewEntity
        })
    );
}
