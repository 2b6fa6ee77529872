//! # Brisk Client
//! A client that discovers and connects to a Brisk server, mirrors its asset
//! catalog, then keeps a local table of the server's networked entities in
//! sync and replicates the entities it owns back to the server.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod shared {
    pub use brisk_shared::{
        ActionCall, ActionContext, AssetId, BehaviourSchema, Channel, ClientSocket, EntityId,
        HandlerError, InstantiateRequest, Platform, Protocol, Value, ValueKind, Vec3,
    };
}

cfg_if! {
    if #[cfg(feature = "transport_local")] {
        pub use brisk_shared::{LocalClientSocket, LocalHub};
    }
}

mod client;
mod error;
mod events;
mod handshake;

pub use client::{Client, ClientConfig};
pub use error::ClientError;
pub use events::{
    ActionEvent, ConnectEvent, ConnectionFailedEvent, DespawnEntityEvent, DisconnectEvent,
    ErrorEvent, Event, Events, ReadyEvent, SpawnEntityEvent, UpdateEntityEvent,
};
pub use handshake::ConnectionState;
