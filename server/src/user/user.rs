use std::net::SocketAddr;

use brisk_shared::Platform;

use crate::handshake::CatalogUpload;

// UserKey
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, PartialOrd, Ord)]
pub struct UserKey(u32);

impl UserKey {
    pub(crate) fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Where a connection is in its lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Transport reported the connection, nothing sent yet
    Connecting,
    /// `SystemInfo` sent
    Connected,
    /// Catalog announced, waiting for the client to signal `Ready`
    AwaitingCatalog,
    /// Receives replication traffic
    Ready,
    /// Disconnect requested, waiting for the transport to confirm
    Disconnecting,
    Disconnected,
}

// User
pub struct User {
    address: SocketAddr,
    state: ConnectionState,
    platform: Option<Platform>,
    pub(crate) upload: CatalogUpload,
}

impl User {
    pub(crate) fn new(address: SocketAddr) -> Self {
        Self {
            address,
            state: ConnectionState::Connecting,
            platform: None,
            upload: CatalogUpload::new(),
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConnectionState::Ready
    }

    /// Platform the client reported, once it has
    pub fn platform(&self) -> Option<Platform> {
        self.platform
    }

    pub(crate) fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
    }

    pub(crate) fn set_platform(&mut self, platform: Platform) {
        self.platform = Some(platform);
    }
}
