//! # Brisk Shared
//! Wire protocol, catalog, schema, entity and replication primitives shared
//! between brisk-server & brisk-client.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

#[macro_use]
extern crate cfg_if;

pub use brisk_serde::{
    ByteCounter, ByteReader, ByteWrite, ByteWriter, ConstByteLength, OwnedByteReader, Serde,
    SerdeErr, UnsignedVariableInteger,
};

mod actions;
mod catalog;
mod messages;
mod protocol;
mod replication;
mod schema;
mod types;
mod world;
mod wrapping_number;

pub mod transport;

pub use actions::{
    action_call::ActionCall,
    dispatcher::{drop_recoverable, ActionContext, ActionDispatcher, ActionHandler, Dispatched},
    error::{ActionError, HandlerError},
};
pub use catalog::{
    asset_catalog::{AssetCatalog, ASSETS_ENDPOINT, STRINGS_ENDPOINT},
    catalog_receiver::{CatalogReceiver, MAX_BLOB_SIZE},
    error::CatalogError,
    paced_transfer::{BlobChunk, PacedTransfer, StringEntry},
    string_dictionary::StringDictionary,
};
pub use messages::{
    delivery::{Channel, DeliveryMethod},
    error::MessageError,
    net_message::{EntityUpdate, InstantiateRequest, NetMessage, ServerInfo},
    net_op::NetOp,
};
pub use protocol::{ActionSignature, BehaviourKind, Protocol, Prototype};
pub use replication::{
    replicator::{collect_updates, full_state},
    status::{StatusReport, StatusReporter},
    tick_timer::{TickTimer, MAX_TICK_INTERVAL},
};
pub use schema::{
    behaviour::{
        BehaviourSchema, BehaviourState, FieldSchema, POSITION_FIELD, ROTATION_FIELD,
        SCALE_FIELD, TRANSFORM_BEHAVIOUR,
    },
    error::SchemaError,
    value::{read_values, write_values, Value, ValueKind},
};
pub use transport::{
    ClientSocket, ServerSocket, SocketEvent, TransportError, CHUNK_HEADROOM, DEFAULT_MTU,
};
pub use types::{AssetId, EntityId, HostType, Platform, Vec3};
pub use world::{entity::Entity, entity_table::EntityTable, error::EntityError};
pub use wrapping_number::{sequence_greater_than, sequence_less_than};

cfg_if! {
    if #[cfg(feature = "transport_local")] {
        pub use transport::{
            conditioner::LinkConditionerConfig,
            local::{LocalClientSocket, LocalHub, LocalServerSocket},
        };
    }
}
