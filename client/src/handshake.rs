use std::{net::SocketAddr, time::Instant};

use brisk_shared::{CatalogReceiver, ServerInfo};

use crate::ClientError;

/// Where the client is in its session with a server
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    /// Discovery request sent, waiting for the server to answer
    Discovering,
    /// Server answered, connection requested
    Connecting,
    /// Transport connected, waiting for `SystemInfo`
    Connected,
    /// Server accepted, catalog streaming in
    AwaitingCatalog,
    /// `Ready` sent; entity traffic flows
    Ready,
}

/// Session bookkeeping from discovery until `Ready`
pub(crate) struct Handshake {
    state: ConnectionState,
    server: Option<SocketAddr>,
    deadline: Option<Instant>,
    catalog: CatalogReceiver,
    server_info: Option<ServerInfo>,
}

impl Handshake {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            server: None,
            deadline: None,
            catalog: CatalogReceiver::new(),
            server_info: None,
        }
    }

    /// Starts a fresh session with `server`. Anything mirrored from an
    /// earlier session is discarded.
    pub fn begin(&mut self, server: SocketAddr, deadline: Instant) {
        *self = Self::new();
        self.state = ConnectionState::Discovering;
        self.server = Some(server);
        self.deadline = Some(deadline);
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        if !self.is_pending() {
            self.deadline = None;
        }
    }

    pub fn server(&self) -> Option<SocketAddr> {
        self.server
    }

    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.server_info.as_ref()
    }

    /// Still discovering or connecting
    pub fn is_pending(&self) -> bool {
        matches!(
            self.state,
            ConnectionState::Discovering | ConnectionState::Connecting
        )
    }

    pub fn timed_out(&self, now: &Instant) -> bool {
        self.is_pending()
            && self
                .deadline
                .map_or(false, |deadline| *now >= deadline)
    }

    /// Checks the server runs the same application and protocol as this client
    pub fn accept_server_info(
        &mut self,
        info: ServerInfo,
        app_name: &str,
        fingerprint: u64,
    ) -> Result<(), ClientError> {
        if info.protocol_fingerprint != fingerprint {
            return Err(ClientError::ProtocolMismatch {
                local: fingerprint,
                remote: info.protocol_fingerprint,
            });
        }
        if info.app_name != app_name {
            return Err(ClientError::AppMismatch {
                local: app_name.to_string(),
                remote: info.app_name,
            });
        }
        self.server_info = Some(info);
        self.set_state(ConnectionState::AwaitingCatalog);
        Ok(())
    }

    pub fn catalog(&self) -> &CatalogReceiver {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut CatalogReceiver {
        &mut self.catalog
    }

    /// The catalog mirror is complete and `Ready` has not been sent yet
    pub fn should_signal_ready(&self) -> bool {
        self.state == ConnectionState::AwaitingCatalog && self.catalog.is_ready()
    }
}
