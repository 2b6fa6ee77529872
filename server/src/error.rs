use std::net::SocketAddr;

use brisk_shared::{ActionError, EntityError, MessageError, SchemaError, TransportError};
use thiserror::Error;

use crate::user::UserKey;

/// Errors that can occur while running the server
#[derive(Debug, Error)]
pub enum ServerError {
    /// Settings the server cannot start with
    #[error("Invalid server configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Protocol could not be finalized
    #[error("Protocol error: {0}")]
    Protocol(#[from] SchemaError),

    /// The game port could not be bound
    #[error("Cannot listen on port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: TransportError,
    },

    /// Operation needs a socket, but listen() has not been called
    #[error("Server is not listening. Call listen() first")]
    NotListening,

    /// Entity could not be created
    #[error("Entity error: {0}")]
    Entity(#[from] EntityError),

    /// Socket failed outside of any single message
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// A packet from a client could not be decoded. The packet is dropped.
    #[error("Malformed packet from {address}: {source}")]
    Message {
        address: SocketAddr,
        #[source]
        source: MessageError,
    },

    /// No connection is recorded under this key
    #[error("No user with key {0:?}")]
    UnknownUser(UserKey),

    /// An action handler failed. Events already collected are returned by the next receive()
    #[error("Action handler failed: {0}")]
    ActionHandler(#[source] ActionError),
}
