//! Drives a client against a hand-written server over the in-memory transport

use std::{net::SocketAddr, time::Instant};

use brisk_client::{
    Client, ClientConfig, ClientError, ConnectEvent, ConnectionState, DisconnectEvent,
    ErrorEvent, ReadyEvent, SpawnEntityEvent,
};
use brisk_shared::{
    AssetId, CatalogError, DeliveryMethod, EntityId, HostType, LocalHub, LocalServerSocket, NetMessage,
    Platform, Protocol, ServerInfo, ServerSocket, SocketEvent,
};

struct FakeServer {
    socket: LocalServerSocket,
    client: Option<SocketAddr>,
}

impl FakeServer {
    fn new(hub: &LocalHub) -> (Self, SocketAddr) {
        let mut socket = hub.server_socket();
        let address = socket.listen(3553).unwrap();
        (
            Self {
                socket,
                client: None,
            },
            address,
        )
    }

    /// Answers discovery, records connects, returns decoded client messages
    fn pump(&mut self) -> Vec<NetMessage> {
        let mut output = Vec::new();
        while let Some(event) = self.socket.receive().unwrap() {
            match event {
                SocketEvent::DiscoveryRequest(address) => {
                    self.socket.respond_discovery(&address, "fake").unwrap()
                }
                SocketEvent::Connected(address) => self.client = Some(address),
                SocketEvent::Packet(_, payload) => {
                    output.push(NetMessage::read(&payload, HostType::Client).unwrap())
                }
                _ => {}
            }
        }
        output
    }

    fn send(&mut self, message: NetMessage) {
        let client = self.client.unwrap();
        self.socket
            .send(&client, DeliveryMethod::ReliableOrdered, &message.to_bytes())
            .unwrap();
    }
}

fn protocol() -> Protocol {
    let mut protocol = Protocol::builder();
    protocol.add_prototype("Ship", &[]).unwrap();
    protocol
}

fn server_info(fingerprint: u64) -> NetMessage {
    NetMessage::ServerInfo(ServerInfo {
        app_name: ClientConfig::default().app_name,
        protocol_fingerprint: fingerprint,
        endpoints: Vec::new(),
    })
}

fn connected_client(hub: &LocalHub) -> (Client, FakeServer) {
    let (mut server, address) = FakeServer::new(hub);
    let config = ClientConfig {
        platform: Platform::LINUX,
        ..Default::default()
    };
    let mut client = Client::new(config, protocol()).unwrap();
    let now = Instant::now();
    client
        .connect(hub.client_socket().unwrap(), address, &now)
        .unwrap();

    assert_eq!(client.connection_state(), ConnectionState::Discovering);

    // answers discovery; the client connects within the same pump
    server.pump();
    let mut events = client.receive(&now).unwrap();
    assert_eq!(events.read::<ConnectEvent>().collect::<Vec<_>>(), vec![address]);
    assert_eq!(client.connection_state(), ConnectionState::Connected);
    server.pump();
    (client, server)
}

#[test]
fn full_catalog_sync_signals_ready_once() {
    let hub = LocalHub::new();
    let (mut client, mut server) = connected_client(&hub);
    let now = Instant::now();

    server.send(server_info(protocol().fingerprint()));
    server.send(NetMessage::StringsStart { count: 2 });
    client.receive(&now).unwrap();
    assert_eq!(
        server.pump(),
        vec![
            NetMessage::ClientInfo {
                platform: Platform::LINUX
            },
            NetMessage::StringsRequest
        ]
    );

    server.send(NetMessage::AssetsStart { size: 4 });
    server.send(NetMessage::StringsData {
        index: 1,
        name: "Alien".to_string(),
    });
    server.send(NetMessage::StringsData {
        index: 2,
        name: "Ship".to_string(),
    });
    server.send(NetMessage::AssetsData {
        offset: 0,
        bytes: vec![1, 2],
    });
    let mut events = client.receive(&now).unwrap();
    // half the blob is missing
    assert!(!events.has::<ReadyEvent>());
    assert_eq!(
        server.pump(),
        vec![NetMessage::AssetsRequest {
            platform: Platform::LINUX
        }]
    );

    server.send(NetMessage::AssetsData {
        offset: 2,
        bytes: vec![3, 4],
    });
    server.send(NetMessage::AssetsData {
        offset: 2,
        bytes: vec![3, 4],
    });
    let mut events = client.receive(&now).unwrap();
    assert_eq!(events.read::<ReadyEvent>().count(), 1);
    assert_eq!(server.pump(), vec![NetMessage::Ready]);
    assert_eq!(client.catalog().name(1), "Alien");
    assert_eq!(client.asset_id("Ship"), AssetId::new(2));
    assert_eq!(client.asset_blob(), &[1, 2, 3, 4]);

    server.send(NetMessage::NewEntity {
        asset_id: AssetId::new(2),
        entity_id: EntityId::new(7),
        is_owner: true,
    });
    let mut events = client.receive(&now).unwrap();
    assert_eq!(
        events.read::<SpawnEntityEvent>().collect::<Vec<_>>(),
        vec![(EntityId::new(7), true)]
    );
    assert_eq!(client.owned_entity_ids(), vec![EntityId::new(7)]);

    // a repeated destroy is a no-op
    server.send(NetMessage::DestroyEntity {
        entity_id: EntityId::new(7),
    });
    server.send(NetMessage::DestroyEntity {
        entity_id: EntityId::new(7),
    });
    let mut events = client.receive(&now).unwrap();
    assert!(client.entity(&EntityId::new(7)).is_none());
    assert!(!events.has::<ErrorEvent>());
    assert!(events.read::<ErrorEvent>().next().is_none());
}

#[test]
fn protocol_mismatch_refuses_the_session() {
    let hub = LocalHub::new();
    let (mut client, mut server) = connected_client(&hub);
    let now = Instant::now();

    server.send(server_info(protocol().fingerprint() ^ 1));
    let mut events = client.receive(&now).unwrap();
    let errors: Vec<ClientError> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [ClientError::ProtocolMismatch { .. }]
    ));
    assert_eq!(events.read::<DisconnectEvent>().count(), 1);
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    // nothing was requested from the refused server
    assert!(server.pump().is_empty());
}

#[test]
fn oversized_blob_announcement_ends_the_session() {
    let hub = LocalHub::new();
    let (mut client, mut server) = connected_client(&hub);
    let now = Instant::now();

    server.send(server_info(protocol().fingerprint()));
    server.send(NetMessage::StringsStart { count: 0 });
    client.receive(&now).unwrap();
    server.pump();

    server.send(NetMessage::AssetsStart { size: u32::MAX });
    let mut events = client.receive(&now).unwrap();
    let errors: Vec<ClientError> = events.read::<ErrorEvent>().collect();
    assert!(matches!(
        errors.as_slice(),
        [ClientError::Catalog(CatalogError::BlobTooLarge { .. })]
    ));
    assert!(!events.has::<ReadyEvent>());
    assert_eq!(events.read::<DisconnectEvent>().count(), 1);
    assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    // no asset request went out
    assert!(server.pump().is_empty());
}
