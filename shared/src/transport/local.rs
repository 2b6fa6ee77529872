//! In-process transport: every socket created from one `LocalHub` can reach
//! every other. Reliable deliveries always arrive in order; unreliable ones
//! pass through the hub's link conditioner.

use std::{
    collections::{HashMap, HashSet, VecDeque},
    net::SocketAddr,
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use log::{debug, info};

use crate::{
    messages::delivery::DeliveryMethod,
    transport::{
        conditioner::LinkConditionerConfig, ClientSocket, ServerSocket, SocketEvent,
        TransportError,
    },
    wrapping_number::sequence_greater_than,
};

const FIRST_CLIENT_PORT: u16 = 50_000;

struct Datagram {
    event: SocketEvent,
    // sender and sequence of an unreliable-sequenced packet
    sequence: Option<(SocketAddr, u16)>,
}

#[derive(Default)]
struct Endpoint {
    inbox: VecDeque<Datagram>,
    outgoing_sequence: HashMap<SocketAddr, u16>,
    newest_received: HashMap<SocketAddr, u16>,
}

impl Endpoint {
    fn next_sequence(&mut self, to: &SocketAddr) -> u16 {
        let sequence = self.outgoing_sequence.entry(*to).or_insert(0);
        *sequence = sequence.wrapping_add(1);
        *sequence
    }

    fn push(&mut self, event: SocketEvent) {
        self.inbox.push_back(Datagram {
            event,
            sequence: None,
        });
    }

    /// Pops the next deliverable event, dropping stale sequenced packets
    fn pop(&mut self) -> Option<SocketEvent> {
        while let Some(datagram) = self.inbox.pop_front() {
            if let Some((from, sequence)) = datagram.sequence {
                match self.newest_received.get(&from) {
                    Some(newest) if !sequence_greater_than(sequence, *newest) => {
                        debug!("Dropping stale packet {} from {}", sequence, from);
                        continue;
                    }
                    _ => {
                        self.newest_received.insert(from, sequence);
                    }
                }
            }
            return Some(datagram.event);
        }
        None
    }
}

#[derive(Default)]
struct HubState {
    servers: HashMap<SocketAddr, Endpoint>,
    clients: HashMap<SocketAddr, Endpoint>,
    // (client, server)
    links: HashSet<(SocketAddr, SocketAddr)>,
    next_client_port: u16,
    conditioner: Option<LinkConditionerConfig>,
    rtt: Duration,
}

impl HubState {
    fn deliver(
        &mut self,
        from: SocketAddr,
        to: SocketAddr,
        to_server: bool,
        method: DeliveryMethod,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        let sequence = if method.is_sequenced() && !method.is_reliable() {
            let sender = if to_server {
                self.clients.get_mut(&from)
            } else {
                self.servers.get_mut(&from)
            };
            sender.map(|endpoint| (from, endpoint.next_sequence(&to)))
        } else {
            None
        };

        let mut copies = 1;
        if !method.is_reliable() {
            if let Some(conditioner) = &self.conditioner {
                if conditioner.should_drop() {
                    return Ok(());
                }
                if conditioner.should_duplicate() {
                    copies = 2;
                }
            }
        }

        let receiver = if to_server {
            self.servers.get_mut(&to)
        } else {
            self.clients.get_mut(&to)
        };
        let Some(receiver) = receiver else {
            return Err(TransportError::UnknownPeer { address: to });
        };
        for _ in 0..copies {
            receiver.inbox.push_back(Datagram {
                event: SocketEvent::Packet(from, payload.into()),
                sequence,
            });
        }
        Ok(())
    }
}

/// Shared medium connecting local server and client sockets
#[derive(Clone, Default)]
pub struct LocalHub {
    state: Arc<Mutex<HubState>>,
}

impl LocalHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conditioner(config: LinkConditionerConfig) -> Self {
        let hub = Self::new();
        if let Ok(mut state) = hub.state.lock() {
            state.conditioner = Some(config);
        }
        hub
    }

    /// Round-trip time every socket reports
    pub fn set_rtt(&self, rtt: Duration) -> Result<(), TransportError> {
        self.lock()?.rtt = rtt;
        Ok(())
    }

    pub fn server_socket(&self) -> LocalServerSocket {
        LocalServerSocket {
            hub: self.clone(),
            address: None,
        }
    }

    pub fn client_socket(&self) -> Result<LocalClientSocket, TransportError> {
        let mut state = self.lock()?;
        let port = FIRST_CLIENT_PORT.wrapping_add(state.next_client_port);
        state.next_client_port = state.next_client_port.wrapping_add(1);
        let address = SocketAddr::from(([127, 0, 0, 1], port));
        state.clients.insert(address, Endpoint::default());
        Ok(LocalClientSocket {
            hub: self.clone(),
            address,
            server: None,
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, HubState>, TransportError> {
        self.state.lock().map_err(|_| TransportError::Poisoned)
    }
}

pub struct LocalServerSocket {
    hub: LocalHub,
    address: Option<SocketAddr>,
}

impl LocalServerSocket {
    pub fn address(&self) -> Option<SocketAddr> {
        self.address
    }

    fn bound(&self) -> Result<SocketAddr, TransportError> {
        self.address.ok_or(TransportError::NotListening)
    }
}

impl ServerSocket for LocalServerSocket {
    fn listen(&mut self, port: u16) -> Result<SocketAddr, TransportError> {
        let address = SocketAddr::from(([127, 0, 0, 1], port));
        let mut state = self.hub.lock()?;
        if state.servers.contains_key(&address) {
            return Err(TransportError::AddressInUse { address });
        }
        state.servers.insert(address, Endpoint::default());
        self.address = Some(address);
        info!("Local server socket listening on {}", address);
        Ok(address)
    }

    fn receive(&mut self) -> Result<Option<SocketEvent>, TransportError> {
        let address = self.bound()?;
        let mut state = self.hub.lock()?;
        Ok(state
            .servers
            .get_mut(&address)
            .and_then(Endpoint::pop))
    }

    fn send(
        &mut self,
        address: &SocketAddr,
        method: DeliveryMethod,
        payload: &[u8],
    ) -> Result<(), TransportError> {
        let server = self.bound()?;
        let mut state = self.hub.lock()?;
        if !state.links.contains(&(*address, server)) {
            return Err(TransportError::UnknownPeer { address: *address });
        }
        state.deliver(server, *address, false, method, payload)
    }

    fn respond_discovery(
        &mut self,
        address: &SocketAddr,
        server_name: &str,
    ) -> Result<(), TransportError> {
        let server = self.bound()?;
        let mut state = self.hub.lock()?;
        let Some(client) = state.clients.get_mut(address) else {
            return Err(TransportError::UnknownPeer { address: *address });
        };
        client.push(SocketEvent::DiscoveryResponse {
            address: server,
            server_name: server_name.to_string(),
        });
        Ok(())
    }

    fn disconnect(&mut self, address: &SocketAddr) -> Result<(), TransportError> {
        let server = self.bound()?;
        let mut state = self.hub.lock()?;
        if !state.links.remove(&(*address, server)) {
            return Ok(());
        }
        if let Some(client) = state.clients.get_mut(address) {
            client.push(SocketEvent::Disconnected(server));
        }
        if let Some(endpoint) = state.servers.get_mut(&server) {
            endpoint.push(SocketEvent::Disconnected(*address));
        }
        Ok(())
    }

    fn rtt(&self, _address: &SocketAddr) -> Option<Duration> {
        self.hub.lock().ok().map(|state| state.rtt)
    }
}

pub struct LocalClientSocket {
    hub: LocalHub,
    address: SocketAddr,
    server: Option<SocketAddr>,
}

impl LocalClientSocket {
    pub fn address(&self) -> SocketAddr {
        self.address
    }
}

impl ClientSocket for LocalClientSocket {
    fn discover(&mut self, server: &SocketAddr) -> Result<(), TransportError> {
        let mut state = self.hub.lock()?;
        // nobody listening means nobody answers
        if let Some(endpoint) = state.servers.get_mut(server) {
            endpoint.push(SocketEvent::DiscoveryRequest(self.address));
        }
        Ok(())
    }

    fn connect(&mut self, server: &SocketAddr) -> Result<(), TransportError> {
        let mut state = self.hub.lock()?;
        let Some(endpoint) = state.servers.get_mut(server) else {
            return Ok(());
        };
        endpoint.push(SocketEvent::Connected(self.address));
        state.links.insert((self.address, *server));
        if let Some(client) = state.clients.get_mut(&self.address) {
            client.push(SocketEvent::Connected(*server));
        }
        self.server = Some(*server);
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<SocketEvent>, TransportError> {
        let mut state = self.hub.lock()?;
        let event = state.clients.get_mut(&self.address).and_then(Endpoint::pop);
        if let Some(SocketEvent::Disconnected(server)) = &event {
            if self.server == Some(*server) {
                self.server = None;
            }
        }
        Ok(event)
    }

    fn send(&mut self, method: DeliveryMethod, payload: &[u8]) -> Result<(), TransportError> {
        let server = self.server.ok_or(TransportError::NotConnected)?;
        let mut state = self.hub.lock()?;
        if !state.links.contains(&(self.address, server)) {
            return Err(TransportError::NotConnected);
        }
        state.deliver(self.address, server, true, method, payload)
    }

    fn disconnect(&mut self) -> Result<(), TransportError> {
        let Some(server) = self.server.take() else {
            return Ok(());
        };
        let mut state = self.hub.lock()?;
        if state.links.remove(&(self.address, server)) {
            if let Some(endpoint) = state.servers.get_mut(&server) {
                endpoint.push(SocketEvent::Disconnected(self.address));
            }
            if let Some(client) = state.clients.get_mut(&self.address) {
                client.push(SocketEvent::Disconnected(server));
            }
        }
        Ok(())
    }

    fn rtt(&self) -> Option<Duration> {
        self.server?;
        self.hub.lock().ok().map(|state| state.rtt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected_pair(hub: &LocalHub) -> (LocalServerSocket, LocalClientSocket, SocketAddr) {
        let mut server = hub.server_socket();
        let address = server.listen(3553).unwrap();
        let mut client = hub.client_socket().unwrap();
        client.connect(&address).unwrap();
        assert_eq!(
            server.receive().unwrap(),
            Some(SocketEvent::Connected(client.address()))
        );
        assert_eq!(
            client.receive().unwrap(),
            Some(SocketEvent::Connected(address))
        );
        (server, client, address)
    }

    #[test]
    fn second_listener_on_a_port_fails() {
        let hub = LocalHub::new();
        let mut first = hub.server_socket();
        first.listen(3553).unwrap();
        let mut second = hub.server_socket();
        assert!(matches!(
            second.listen(3553),
            Err(TransportError::AddressInUse { .. })
        ));
    }

    #[test]
    fn packets_flow_both_ways() {
        let hub = LocalHub::new();
        let (mut server, mut client, _) = connected_pair(&hub);

        client
            .send(DeliveryMethod::ReliableOrdered, &[1, 2, 3])
            .unwrap();
        assert_eq!(
            server.receive().unwrap(),
            Some(SocketEvent::Packet(client.address(), vec![1, 2, 3].into()))
        );

        server
            .send(&client.address(), DeliveryMethod::Unreliable, &[4])
            .unwrap();
        assert!(matches!(
            client.receive().unwrap(),
            Some(SocketEvent::Packet(_, payload)) if &*payload == [4]
        ));
        assert_eq!(client.receive().unwrap(), None);
    }

    #[test]
    fn discovery_reaches_listening_servers_only() {
        let hub = LocalHub::new();
        let mut client = hub.client_socket().unwrap();
        let nowhere = SocketAddr::from(([127, 0, 0, 1], 9));
        client.discover(&nowhere).unwrap();

        let mut server = hub.server_socket();
        let address = server.listen(3553).unwrap();
        client.discover(&address).unwrap();
        let Some(SocketEvent::DiscoveryRequest(from)) = server.receive().unwrap() else {
            panic!("expected a discovery request");
        };
        server.respond_discovery(&from, "arena").unwrap();
        assert_eq!(
            client.receive().unwrap(),
            Some(SocketEvent::DiscoveryResponse {
                address,
                server_name: "arena".to_string()
            })
        );
    }

    #[test]
    fn duplicated_sequenced_packets_are_dropped() {
        let hub = LocalHub::with_conditioner(LinkConditionerConfig::new(0.0, 1.0));
        let (mut server, mut client, _) = connected_pair(&hub);

        server
            .send(&client.address(), DeliveryMethod::UnreliableSequenced, &[1])
            .unwrap();
        server
            .send(&client.address(), DeliveryMethod::Unreliable, &[2])
            .unwrap();

        let mut payloads = Vec::new();
        while let Some(SocketEvent::Packet(_, payload)) = client.receive().unwrap() {
            payloads.push(payload.to_vec());
        }
        // the sequenced copy is filtered, the plain unreliable one is not
        assert_eq!(payloads, vec![vec![1], vec![2], vec![2]]);
    }

    #[test]
    fn total_loss_spares_reliable_packets() {
        let hub = LocalHub::with_conditioner(LinkConditionerConfig::new(1.0, 0.0));
        let (mut server, mut client, _) = connected_pair(&hub);

        client.send(DeliveryMethod::UnreliableSequenced, &[1]).unwrap();
        client.send(DeliveryMethod::ReliableOrdered, &[2]).unwrap();
        assert!(matches!(
            server.receive().unwrap(),
            Some(SocketEvent::Packet(_, payload)) if &*payload == [2]
        ));
        assert_eq!(server.receive().unwrap(), None);
    }

    #[test]
    fn disconnect_notifies_both_sides() {
        let hub = LocalHub::new();
        let (mut server, mut client, address) = connected_pair(&hub);

        client.disconnect().unwrap();
        assert_eq!(
            server.receive().unwrap(),
            Some(SocketEvent::Disconnected(client.address()))
        );
        assert_eq!(
            client.receive().unwrap(),
            Some(SocketEvent::Disconnected(address))
        );
        assert_eq!(
            client.send(DeliveryMethod::ReliableOrdered, &[1]),
            Err(TransportError::NotConnected)
        );
        assert!(server
            .send(&client.address(), DeliveryMethod::ReliableOrdered, &[1])
            .is_err());
    }
}
