use std::{net::SocketAddr, time::Duration};

use crate::messages::delivery::DeliveryMethod;

pub mod error;
pub use error::TransportError;

cfg_if! {
    if #[cfg(feature = "transport_local")] {
        pub mod conditioner;
        pub mod local;
    }
}

/// Largest datagram a transport carries by default
pub const DEFAULT_MTU: usize = 1408;
/// Room left in each datagram for headers when chunking the asset blob
pub const CHUNK_HEADROOM: usize = 100;

/// Something that happened on a socket since the last poll
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SocketEvent {
    Connected(SocketAddr),
    Disconnected(SocketAddr),
    Packet(SocketAddr, Box<[u8]>),
    /// A client looking for servers
    DiscoveryRequest(SocketAddr),
    /// A server answering a discovery request
    DiscoveryResponse {
        address: SocketAddr,
        server_name: String,
    },
}

/// Server side of a datagram transport
pub trait ServerSocket {
    fn listen(&mut self, port: u16) -> Result<SocketAddr, TransportError>;
    /// Next pending event; never blocks
    fn receive(&mut self) -> Result<Option<SocketEvent>, TransportError>;
    fn send(
        &mut self,
        address: &SocketAddr,
        method: DeliveryMethod,
        payload: &[u8],
    ) -> Result<(), TransportError>;
    fn respond_discovery(
        &mut self,
        address: &SocketAddr,
        server_name: &str,
    ) -> Result<(), TransportError>;
    fn disconnect(&mut self, address: &SocketAddr) -> Result<(), TransportError>;
    /// Current round-trip estimate for a peer, if the transport measures one
    fn rtt(&self, address: &SocketAddr) -> Option<Duration>;
    fn mtu(&self) -> usize {
        DEFAULT_MTU
    }
}

/// Client side of a datagram transport
pub trait ClientSocket {
    fn discover(&mut self, server: &SocketAddr) -> Result<(), TransportError>;
    fn connect(&mut self, server: &SocketAddr) -> Result<(), TransportError>;
    /// Next pending event; never blocks
    fn receive(&mut self) -> Result<Option<SocketEvent>, TransportError>;
    fn send(&mut self, method: DeliveryMethod, payload: &[u8]) -> Result<(), TransportError>;
    fn disconnect(&mut self) -> Result<(), TransportError>;
    fn rtt(&self) -> Option<Duration>;
    fn mtu(&self) -> usize {
        DEFAULT_MTU
    }
}
