use brisk_shared::{ActionError, CatalogError, EntityError, MessageError, TransportError};
use thiserror::Error;

/// Errors that can occur while running the client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Settings the client cannot run with
    #[error("Invalid client configuration: {reason}")]
    InvalidConfig { reason: String },

    /// connect() was called while a session is already open or being opened
    #[error("Client is already connected or connecting")]
    AlreadyConnected,

    /// Operation needs an open session
    #[error("Client is not connected")]
    NotConnected,

    /// Operation needs a session that finished syncing the catalog
    #[error("Client is not ready. Wait for the ReadyEvent")]
    NotReady,

    /// Server was built from a different protocol; the session is refused
    #[error("Protocol mismatch: local fingerprint {local:#018x}, server fingerprint {remote:#018x}")]
    ProtocolMismatch { local: u64, remote: u64 },

    /// Server runs a different application; the session is refused
    #[error("Application mismatch: expected '{local}', server runs '{remote}'")]
    AppMismatch { local: String, remote: String },

    /// A packet from the server could not be decoded. The packet is dropped.
    #[error("Malformed packet from server: {0}")]
    Message(#[from] MessageError),

    /// Catalog data from the server was inconsistent
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Entity could not be mirrored or updated
    #[error("Entity error: {0}")]
    Entity(#[from] EntityError),

    /// Socket failed outside of any single message
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// An action handler failed. Events already collected are returned by the next receive()
    #[error("Action handler failed: {0}")]
    ActionHandler(#[source] ActionError),
}
