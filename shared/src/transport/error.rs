use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur in a transport implementation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Another socket is already listening on this address
    #[error("Address {address} is already in use")]
    AddressInUse { address: SocketAddr },

    /// Operation requires a listening socket
    #[error("Socket is not listening. Call listen() before using it")]
    NotListening,

    /// Operation requires an open connection
    #[error("Socket is not connected to a server")]
    NotConnected,

    /// No connection exists to this peer
    #[error("No connection to peer {address}")]
    UnknownPeer { address: SocketAddr },

    /// Shared transport state was poisoned by a panicking thread
    #[error("Transport state is poisoned")]
    Poisoned,
}
