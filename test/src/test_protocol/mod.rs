use brisk_shared::{AssetCatalog, BehaviourSchema, Platform, Protocol, Value, ValueKind, TRANSFORM_BEHAVIOUR};

pub const ALIEN: &str = "Alien";
pub const SHIP: &str = "Ship";
pub const PLAYER: &str = "Player";

pub const PLAYER_CONTROLLER: &str = "PlayerController";

/// `PlayerController`: takes `amount` off `health`
pub const ACTION_DAMAGE: u32 = 1;
/// Transform, no arguments
pub const ACTION_PING: u32 = 2;

/// Size of the asset blob served to Linux clients
pub const BLOB_SIZE: usize = 5_000;

pub fn protocol() -> Protocol {
    let mut protocol = Protocol::builder();
    protocol
        .add_behaviour(
            BehaviourSchema::new(PLAYER_CONTROLLER)
                .reliable("health", Value::U16(100))
                .reliable("name", Value::String(String::new()))
                .unreliable("speed", Value::F32(1.0)),
        )
        .unwrap()
        .add_prototype(ALIEN, &[PLAYER_CONTROLLER])
        .unwrap()
        .add_prototype(SHIP, &[])
        .unwrap()
        .add_prototype(PLAYER, &[PLAYER_CONTROLLER])
        .unwrap()
        .add_action(ACTION_DAMAGE, PLAYER_CONTROLLER, &[ValueKind::U16])
        .unwrap()
        .add_action(ACTION_PING, TRANSFORM_BEHAVIOUR, &[])
        .unwrap();
    protocol
}

/// `Alien` = 1, `Ship` = 2, `Player` = 3
pub fn catalog() -> AssetCatalog {
    let mut catalog = AssetCatalog::new();
    catalog.register_asset(ALIEN);
    catalog.register_asset(SHIP);
    catalog.register_asset(PLAYER);
    let blob = (0..BLOB_SIZE).map(|index| (index % 251) as u8).collect();
    catalog.set_blob(Platform::LINUX, blob);
    catalog
}
