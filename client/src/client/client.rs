use std::{
    mem,
    net::SocketAddr,
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use brisk_shared::{
    collect_updates, drop_recoverable, ActionCall, ActionContext, ActionDispatcher, ActionError,
    AssetId, ClientSocket, DeliveryMethod, Entity, EntityId, EntityTable, EntityUpdate,
    HandlerError, HostType, InstantiateRequest, NetMessage, Protocol, ServerInfo, SocketEvent,
    StatusReporter, StringDictionary, TickTimer, Value,
};

use crate::{
    client::client_config::ClientConfig,
    events::Events,
    handshake::{ConnectionState, Handshake},
    ClientError,
};

/// Client can discover & connect to a Server, sync its asset catalog, then
/// mirror the Server's entities and replicate the ones it owns
pub struct Client {
    config: ClientConfig,
    protocol: Protocol,
    socket: Option<Box<dyn ClientSocket>>,
    handshake: Handshake,
    entities: EntityTable,
    actions: ActionDispatcher,
    tick_timer: TickTimer,
    status: StatusReporter,
    messages_sent: usize,
    incoming_events: Events,
}

impl Client {
    /// Create a new Client. The protocol is locked and must be identical to
    /// the server's, or the server will be refused.
    pub fn new(config: ClientConfig, mut protocol: Protocol) -> Result<Self, ClientError> {
        config.validate()?;
        protocol.lock();
        let tick_timer =
            TickTimer::new(config.update_rate).ok_or_else(|| ClientError::InvalidConfig {
                reason: format!("update_rate {} has no usable tick interval", config.update_rate),
            })?;

        Ok(Self {
            tick_timer,
            status: StatusReporter::new(config.status_report_interval),
            config,
            protocol,
            socket: None,
            handshake: Handshake::new(),
            entities: EntityTable::new(),
            actions: ActionDispatcher::new(),
            messages_sent: 0,
            incoming_events: Events::new(),
        })
    }

    /// Looks for a server at `server_address` and connects once it answers.
    /// If that has not happened by `now + connect_timeout`, a
    /// `ConnectionFailedEvent` is raised.
    pub fn connect<S: ClientSocket + 'static>(
        &mut self,
        mut socket: S,
        server_address: SocketAddr,
        now: &Instant,
    ) -> Result<(), ClientError> {
        if self.handshake.state() != ConnectionState::Disconnected {
            return Err(ClientError::AlreadyConnected);
        }
        socket.discover(&server_address)?;
        info!("Looking for server at {}", server_address);

        self.handshake
            .begin(server_address, *now + self.config.connect_timeout);
        self.entities = EntityTable::new();
        self.socket = Some(Box::new(socket));
        Ok(())
    }

    /// Closes the session. A `DisconnectEvent` follows once the transport confirms.
    pub fn disconnect(&mut self) -> Result<(), ClientError> {
        let Some(socket) = self.socket.as_mut() else {
            return Err(ClientError::NotConnected);
        };
        socket.disconnect()?;
        Ok(())
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.handshake.state()
    }

    pub fn is_connected(&self) -> bool {
        matches!(
            self.handshake.state(),
            ConnectionState::Connected | ConnectionState::AwaitingCatalog | ConnectionState::Ready
        )
    }

    pub fn is_ready(&self) -> bool {
        self.handshake.state() == ConnectionState::Ready
    }

    pub fn server_address(&self) -> Option<SocketAddr> {
        self.handshake.server()
    }

    /// What the server announced about itself, once accepted
    pub fn server_info(&self) -> Option<&ServerInfo> {
        self.handshake.server_info()
    }

    pub fn rtt(&self) -> Option<Duration> {
        self.socket.as_ref().and_then(|socket| socket.rtt())
    }

    /// Drains every pending socket event and returns the events collected.
    ///
    /// A failing action handler aborts the pump with
    /// `ClientError::ActionHandler`; events gathered so far are kept and
    /// returned by the next call.
    pub fn receive(&mut self, now: &Instant) -> Result<Events, ClientError> {
        self.maintain_socket()?;

        if self.handshake.timed_out(now) {
            if let Some(server) = self.handshake.server() {
                warn!("Connection to {} timed out", server);
                self.incoming_events.push_connection_failed(server);
            }
            self.handshake.set_state(ConnectionState::Disconnected);
        }

        Ok(mem::replace(&mut self.incoming_events, Events::new()))
    }

    /// Runs the replication tick for owned entities if one is due at `now`.
    /// Does nothing until the session is ready.
    pub fn send_all_updates(&mut self, now: &Instant) -> Result<(), ClientError> {
        if !self.is_ready() || !self.tick_timer.ready(now) {
            return Ok(());
        }

        let started = Instant::now();
        let sent_before = self.messages_sent;

        for update in collect_updates(&mut self.entities) {
            let method = update.delivery_method();
            self.send(method, &NetMessage::EntityUpdate(update));
        }

        let processing = started.elapsed();
        self.tick_timer.finish(now, processing);
        self.status
            .record_tick(processing, self.messages_sent - sent_before);
        if let Some(report) = self.status.poll(now, 1) {
            info!("Client status: {}", report);
        }
        Ok(())
    }

    // Catalog

    /// Names mirrored from the server's catalog
    pub fn catalog(&self) -> &StringDictionary {
        self.handshake.catalog().strings()
    }

    /// The server's asset blob for this client's platform
    pub fn asset_blob(&self) -> &[u8] {
        self.handshake.catalog().blob()
    }

    pub fn asset_id(&self, name: &str) -> AssetId {
        AssetId::new(self.catalog().id(name))
    }

    // Entities

    pub fn entity(&self, entity_id: &EntityId) -> Option<&Entity> {
        self.entities.get(entity_id)
    }

    /// Changes to an owned entity are sent on the next tick
    pub fn entity_mut(&mut self, entity_id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(entity_id)
    }

    pub fn entity_ids(&mut self) -> Vec<EntityId> {
        self.entities.ids()
    }

    pub fn owned_entity_ids(&mut self) -> Vec<EntityId> {
        self.entities.owned_ids()
    }

    /// Resend an owned entity's state on the next tick even if it did not change
    pub fn flag_sync(&mut self, entity_id: &EntityId) -> bool {
        self.entities.flag_sync(entity_id)
    }

    /// Asks the server to spawn an entity
    pub fn instantiate(&mut self, request: InstantiateRequest) -> Result<(), ClientError> {
        self.check_ready()?;
        self.send(
            DeliveryMethod::ReliableOrdered,
            &NetMessage::InstantiateEntity(request),
        );
        Ok(())
    }

    /// Destroys an entity this client owns, here and on the server.
    /// Returns false if the entity is not owned by this client.
    pub fn destroy_owned(&mut self, entity_id: &EntityId) -> Result<bool, ClientError> {
        self.check_ready()?;
        if !self.entities.get(entity_id).map_or(false, Entity::is_owned) {
            return Ok(false);
        }
        self.entities.remove(entity_id);
        self.send(
            DeliveryMethod::ReliableOrdered,
            &NetMessage::DestroyEntity {
                entity_id: *entity_id,
            },
        );
        Ok(true)
    }

    // Actions

    pub fn register_action<F>(&mut self, action_id: u32, handler: F) -> Result<(), ActionError>
    where
        F: FnMut(&mut ActionContext<'_>, &[Value]) -> Result<(), HandlerError> + 'static,
    {
        if self.protocol.action(action_id).is_none() {
            return Err(ActionError::UnknownAction { action_id });
        }
        self.actions.register(action_id, handler)
    }

    /// Invokes an action on the server only
    pub fn action_local(&mut self, call: ActionCall) -> Result<(), ClientError> {
        self.check_ready()?;
        self.send(DeliveryMethod::ReliableOrdered, &NetMessage::ActionLocal(call));
        Ok(())
    }

    /// Invokes an action on the server, which relays it to connected clients
    pub fn action_global(&mut self, call: ActionCall) -> Result<(), ClientError> {
        self.check_ready()?;
        self.send(DeliveryMethod::ReliableOrdered, &NetMessage::ActionGlobal(call));
        Ok(())
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // Private methods

    fn check_ready(&self) -> Result<(), ClientError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ClientError::NotReady)
        }
    }

    fn maintain_socket(&mut self) -> Result<(), ClientError> {
        loop {
            let Some(socket) = self.socket.as_mut() else {
                return Ok(());
            };
            let event = match socket.receive() {
                Ok(Some(event)) => event,
                Ok(None) => return Ok(()),
                Err(error) => {
                    warn!("Client socket error: {}", error);
                    self.incoming_events.push_error(error.into());
                    return Ok(());
                }
            };

            match event {
                SocketEvent::DiscoveryResponse {
                    address,
                    server_name,
                } => {
                    if self.handshake.state() != ConnectionState::Discovering
                        || self.handshake.server() != Some(address)
                    {
                        debug!("Ignoring discovery response from {}", address);
                        continue;
                    }
                    info!("Found server '{}' at {}", server_name, address);
                    if let Err(error) = socket.connect(&address) {
                        warn!("Cannot connect to {}: {}", address, error);
                        self.incoming_events.push_error(error.into());
                        continue;
                    }
                    self.handshake.set_state(ConnectionState::Connecting);
                }
                SocketEvent::Connected(address) => {
                    if self.handshake.state() != ConnectionState::Connecting {
                        debug!("Ignoring connect from {}", address);
                        continue;
                    }
                    info!("Connected to {}", address);
                    self.handshake.set_state(ConnectionState::Connected);
                    self.incoming_events.push_connection(address);
                }
                SocketEvent::Disconnected(address) => self.handle_disconnect(address),
                SocketEvent::Packet(_, payload) => self.handle_packet(&payload)?,
                SocketEvent::DiscoveryRequest(address) => {
                    debug!("Ignoring discovery request from {}", address);
                }
            }
        }
    }

    fn handle_disconnect(&mut self, address: SocketAddr) {
        let was_connected = self.is_connected();
        self.handshake.set_state(ConnectionState::Disconnected);
        self.socket = None;
        // the mirror is only meaningful while the session lasts
        self.entities = EntityTable::new();
        if was_connected {
            info!("Disconnected from {}", address);
            self.incoming_events.push_disconnection(address);
        }
    }

    fn handle_packet(&mut self, payload: &[u8]) -> Result<(), ClientError> {
        if !self.is_connected() {
            debug!("Dropping packet outside of a session");
            return Ok(());
        }
        let message = match NetMessage::read(payload, HostType::Server) {
            Ok(message) => message,
            Err(error) => {
                warn!("Dropping packet from server: {}", error);
                self.incoming_events.push_error(error.into());
                return Ok(());
            }
        };

        match message {
            NetMessage::ServerInfo(info) => self.handle_server_info(info),
            NetMessage::StringsStart { count } => {
                self.handshake.catalog_mut().begin_strings(count);
            }
            NetMessage::StringsData { index, name } => {
                if let Err(error) = self.handshake.catalog_mut().receive_string(index, &name) {
                    warn!("Dropping catalog string {}: {}", index, error);
                    self.incoming_events.push_error(error.into());
                }
            }
            NetMessage::AssetsStart { size } => {
                if let Err(error) = self.handshake.catalog_mut().begin_blob(size) {
                    // the catalog can never complete, so the session is over
                    warn!("Refusing asset blob: {}", error);
                    self.incoming_events.push_error(error.into());
                    if let Some(socket) = self.socket.as_mut() {
                        if let Err(error) = socket.disconnect() {
                            warn!("Cannot disconnect: {}", error);
                        }
                    }
                } else if size > 0 {
                    let platform = self.config.platform;
                    self.send(
                        DeliveryMethod::ReliableOrdered,
                        &NetMessage::AssetsRequest { platform },
                    );
                }
            }
            NetMessage::AssetsData { offset, bytes } => {
                if let Err(error) = self.handshake.catalog_mut().receive_chunk(offset, &bytes) {
                    warn!("Dropping asset chunk at {}: {}", offset, error);
                    self.incoming_events.push_error(error.into());
                }
            }
            NetMessage::NewEntity {
                asset_id,
                entity_id,
                is_owner,
            } => self.handle_new_entity(asset_id, entity_id, is_owner),
            NetMessage::EntityUpdate(update) => self.handle_entity_update(update),
            NetMessage::DestroyEntity { entity_id } => {
                // repeated destroys are no-ops
                if self.entities.remove(&entity_id).is_some() {
                    self.incoming_events.push_despawn(entity_id);
                }
            }
            NetMessage::Action(call) => self.handle_action(call)?,
            message => {
                debug!("Ignoring {} from server", message.net_op());
            }
        }

        if self.handshake.should_signal_ready() {
            self.signal_ready();
        }
        Ok(())
    }

    fn handle_server_info(&mut self, info: ServerInfo) {
        if self.handshake.state() != ConnectionState::Connected {
            debug!("Ignoring repeated SystemInfo");
            return;
        }
        let fingerprint = self.protocol.fingerprint();
        if let Err(error) =
            self.handshake
                .accept_server_info(info, &self.config.app_name, fingerprint)
        {
            warn!("Refusing server: {}", error);
            self.incoming_events.push_error(error);
            if let Some(socket) = self.socket.as_mut() {
                if let Err(error) = socket.disconnect() {
                    warn!("Cannot disconnect: {}", error);
                }
            }
            return;
        }

        let platform = self.config.platform;
        self.send(
            DeliveryMethod::ReliableOrdered,
            &NetMessage::ClientInfo { platform },
        );
        self.send(DeliveryMethod::ReliableOrdered, &NetMessage::StringsRequest);
    }

    fn signal_ready(&mut self) {
        self.send(DeliveryMethod::ReliableOrdered, &NetMessage::Ready);
        self.handshake.set_state(ConnectionState::Ready);
        if let Some(server) = self.handshake.server() {
            info!("Catalog synced, ready for entities from {}", server);
            self.incoming_events.push_ready(server);
        }
    }

    fn handle_new_entity(&mut self, asset_id: AssetId, entity_id: EntityId, is_owner: bool) {
        let result = self.entities.create_with_authority(
            &self.protocol,
            self.handshake.catalog().strings(),
            asset_id,
            Some(entity_id),
            is_owner,
        );
        match result {
            Ok(entity_id) => self.incoming_events.push_spawn(entity_id, is_owner),
            Err(error) => {
                warn!("Cannot mirror {}: {}", entity_id, error);
                self.incoming_events.push_error(error.into());
            }
        }
    }

    fn handle_entity_update(&mut self, update: EntityUpdate) {
        let Some(entity) = self.entities.get_mut(&update.entity_id) else {
            warn!("Dropping update for unknown {}", update.entity_id);
            return;
        };
        if entity.is_owned() {
            debug!("Ignoring server update for owned {}", update.entity_id);
            return;
        }
        if let Err(error) = entity.deserialize(update.channel, &update.payload) {
            warn!("Dropping update: {}", error);
            self.incoming_events.push_error(error.into());
            return;
        }
        self.incoming_events
            .push_update(update.entity_id, update.channel);
    }

    fn handle_action(&mut self, call: ActionCall) -> Result<(), ClientError> {
        let result = self
            .actions
            .dispatch(&self.protocol, &mut self.entities, &call);
        if drop_recoverable(result)
            .map_err(ClientError::ActionHandler)?
            .is_some()
        {
            self.incoming_events.push_action(call);
        }
        Ok(())
    }

    fn send(&mut self, method: DeliveryMethod, message: &NetMessage) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };
        match socket.send(method, &message.to_bytes()) {
            Ok(()) => self.messages_sent += 1,
            Err(error) => warn!("Cannot send {}: {}", message.net_op(), error),
        }
    }
}
