use std::net::SocketAddr;

use brisk_shared::{
    ClientSocket, HostType, LocalClientSocket, LocalHub, NetMessage, SocketEvent,
};

/// A bare connection that speaks the wire protocol by hand. Useful for
/// watching exactly what the server sends to a peer that never finishes
/// its handshake.
pub struct RawPeer {
    socket: LocalClientSocket,
    received: Vec<NetMessage>,
}

impl RawPeer {
    pub fn connect(hub: &LocalHub, server: &SocketAddr) -> Self {
        let mut socket = hub.client_socket().unwrap();
        socket.connect(server).unwrap();
        Self {
            socket,
            received: Vec::new(),
        }
    }

    pub fn send(&mut self, message: NetMessage) {
        self.socket
            .send(message.delivery_method(), &message.to_bytes())
            .unwrap();
    }

    /// Reads everything pending into the log of received messages
    pub fn drain(&mut self) {
        while let Some(event) = self.socket.receive().unwrap() {
            if let SocketEvent::Packet(_, payload) = event {
                self.received
                    .push(NetMessage::read(&payload, HostType::Server).unwrap());
            }
        }
    }

    pub fn received(&self) -> &[NetMessage] {
        &self.received
    }

    /// Received `NewEntity` and `EntityUpdate` messages
    pub fn entity_traffic(&self) -> usize {
        self.received
            .iter()
            .filter(|message| {
                matches!(
                    message,
                    NetMessage::NewEntity { .. } | NetMessage::EntityUpdate(_)
                )
            })
            .count()
    }
}
