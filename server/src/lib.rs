//! # Brisk Server
//! An authoritative server that streams its asset catalog to connecting
//! clients, then replicates networked entities to every connection that has
//! finished syncing the catalog.

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
        ActionCall, ActionContext, AssetCatalog, AssetId, BehaviourSchema, Channel, EntityId,
        HandlerError, Platform, Protocol, ServerSocket, Value, ValueKind, Vec3,
    };
}

cfg_if! {
    if #[cfg(feature = "transport_local")] {
        pub use brisk_shared::{LocalHub, LocalServerSocket};
    }
}

mod error;
mod events;
mod handshake;
mod server;
mod user;

pub use error::ServerError;
pub use events::{
    ActionEvent, ConnectEvent, DespawnEntityEvent, DisconnectEvent, ErrorEvent, Event, Events,
    ReadyEvent, SpawnEntityEvent, UpdateEntityEvent,
};
pub use server::{GlobalActionPolicy, LevelEntity, Server, ServerConfig};
pub use user::{ConnectionState, User, UserKey};
