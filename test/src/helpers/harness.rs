use std::{
    net::SocketAddr,
    time::{Duration, Instant},
};

use log::debug;

use brisk_client::{Client, ClientConfig, ClientError};
use brisk_server::{Server, ServerConfig, ServerError};
use brisk_shared::{AssetCatalog, LocalHub, Platform, Protocol};

use crate::test_protocol::{catalog, protocol};

/// Clock advance per step; longer than one tick at the default update rate
pub const TICK: Duration = Duration::from_millis(34);

/// Events collected by one step
pub struct Step {
    pub server: brisk_server::Events,
    pub clients: Vec<brisk_client::Events>,
}

impl Step {
    pub fn client(&mut self, index: usize) -> &mut brisk_client::Events {
        &mut self.clients[index]
    }
}

/// A server and its clients, all on one in-memory hub and one simulated clock
pub struct Harness {
    pub hub: LocalHub,
    pub server: Server,
    pub server_address: SocketAddr,
    pub clients: Vec<Client>,
    pub now: Instant,
}

impl Harness {
    pub fn new(config: ServerConfig) -> Self {
        Self::with_catalog(config, catalog())
    }

    pub fn with_catalog(config: ServerConfig, catalog: AssetCatalog) -> Self {
        let hub = LocalHub::new();
        let mut server = Server::new(config, protocol(), catalog).unwrap();
        let server_address = server.listen(hub.server_socket()).unwrap();
        Self {
            hub,
            server,
            server_address,
            clients: Vec::new(),
            now: Instant::now(),
        }
    }

    /// Starts connecting a client that uses the shared test protocol
    pub fn add_client(&mut self) -> usize {
        self.add_client_with(protocol())
    }

    pub fn add_client_with(&mut self, protocol: Protocol) -> usize {
        let config = ClientConfig {
            platform: Platform::LINUX,
            ..Default::default()
        };
        let mut client = Client::new(config, protocol).unwrap();
        client
            .connect(self.hub.client_socket().unwrap(), self.server_address, &self.now)
            .unwrap();
        self.clients.push(client);
        self.clients.len() - 1
    }

    /// Advances the clock by one tick, pumps the server then every client,
    /// then runs every replication tick
    pub fn try_step(&mut self) -> Result<Step, HarnessError> {
        self.now += TICK;
        let server = self.server.receive(&self.now)?;
        let mut clients = Vec::with_capacity(self.clients.len());
        for client in &mut self.clients {
            clients.push(client.receive(&self.now)?);
        }
        self.server.send_all_updates(&self.now)?;
        for client in &mut self.clients {
            client.send_all_updates(&self.now)?;
        }
        Ok(Step { server, clients })
    }

    pub fn step(&mut self) -> Step {
        self.try_step().unwrap()
    }

    /// Steps until every client has finished its handshake
    pub fn run_until_ready(&mut self) {
        for steps in 0..20 {
            if self.clients.iter().all(Client::is_ready) {
                debug!("{} clients ready after {} steps", self.clients.len(), steps);
                // one more step so the server sees the Ready messages
                self.step();
                return;
            }
            self.step();
        }
        panic!("clients did not become ready");
    }

    /// Steps `count` times, discarding events
    pub fn settle(&mut self, count: usize) {
        for _ in 0..count {
            self.step();
        }
    }
}

/// Whichever side of the harness failed
#[derive(Debug)]
pub enum HarnessError {
    Server(ServerError),
    Client(ClientError),
}

impl From<ServerError> for HarnessError {
    fn from(error: ServerError) -> Self {
        HarnessError::Server(error)
    }
}

impl From<ClientError> for HarnessError {
    fn from(error: ClientError) -> Self {
        HarnessError::Client(error)
    }
}
