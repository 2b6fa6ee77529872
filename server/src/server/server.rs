use std::{
    collections::HashMap,
    mem,
    net::SocketAddr,
    time::{Duration, Instant},
};

use log::{debug, info, warn};

use brisk_shared::{
    collect_updates, drop_recoverable, full_state, ActionCall, ActionContext, ActionError,
    ActionDispatcher, AssetCatalog, AssetId, DeliveryMethod, Entity, EntityId, EntityTable,
    EntityUpdate, HandlerError, HostType, InstantiateRequest, NetMessage, PacedTransfer,
    Platform, Protocol, ServerInfo, ServerSocket, SocketEvent, StatusReporter, TickTimer, Value,
    CHUNK_HEADROOM,
};

use crate::{
    events::Events,
    server::{
        level::LevelEntity,
        server_config::{GlobalActionPolicy, ServerConfig},
    },
    user::{ConnectionState, User, UserKey},
    ServerError,
};

/// The authoritative host.
///
/// Drive it from one loop: `receive()` once per frame to drain the socket
/// and advance catalog uploads, `send_all_updates()` every frame to run the
/// replication tick when it is due.
pub struct Server {
    config: ServerConfig,
    protocol: Protocol,
    catalog: AssetCatalog,
    player_prefab: Option<AssetId>,
    socket: Option<Box<dyn ServerSocket>>,
    // Users
    users: HashMap<UserKey, User>,
    user_connections: HashMap<SocketAddr, UserKey>,
    last_user_key: u32,
    // Entities
    entities: EntityTable,
    entity_owners: HashMap<EntityId, UserKey>,
    actions: ActionDispatcher,
    // Replication
    tick_timer: TickTimer,
    status: StatusReporter,
    messages_sent: usize,
    incoming_events: Events,
}

impl Server {
    /// Create a new Server. The protocol is locked; it cannot change once
    /// clients may be fingerprinting it.
    pub fn new(
        config: ServerConfig,
        mut protocol: Protocol,
        catalog: AssetCatalog,
    ) -> Result<Self, ServerError> {
        config.validate()?;
        protocol.lock();

        let player_prefab = match &config.player_prefab {
            Some(name) => {
                let asset_id = catalog.asset_id(name);
                if asset_id.is_none() || protocol.prototype(name).is_none() {
                    return Err(ServerError::InvalidConfig {
                        reason: format!(
                            "player_prefab '{}' is not a registered asset with a prototype",
                            name
                        ),
                    });
                }
                Some(asset_id)
            }
            None => None,
        };

        let tick_timer =
            TickTimer::new(config.update_rate).ok_or_else(|| ServerError::InvalidConfig {
                reason: format!("update_rate {} has no usable tick interval", config.update_rate),
            })?;

        Ok(Self {
            tick_timer,
            status: StatusReporter::new(config.status_report_interval),
            config,
            protocol,
            catalog,
            player_prefab,
            socket: None,
            users: HashMap::new(),
            user_connections: HashMap::new(),
            last_user_key: 0,
            entities: EntityTable::new(),
            entity_owners: HashMap::new(),
            actions: ActionDispatcher::new(),
            messages_sent: 0,
            incoming_events: Events::new(),
        })
    }

    /// Listen on the configured game port
    pub fn listen<S: ServerSocket + 'static>(
        &mut self,
        mut socket: S,
    ) -> Result<SocketAddr, ServerError> {
        let port = self.config.port_game;
        let address = socket
            .listen(port)
            .map_err(|source| ServerError::Bind { port, source })?;
        info!(
            "Server '{}' listening on {}",
            self.config.app_name, address
        );
        self.socket = Some(Box::new(socket));
        Ok(address)
    }

    pub fn is_listening(&self) -> bool {
        self.socket.is_some()
    }

    /// Drains every pending socket event, then sends whatever catalog
    /// uploads are due. Returns the events collected.
    ///
    /// A failing action handler aborts the pump with
    /// `ServerError::ActionHandler`; events gathered so far are kept and
    /// returned by the next call.
    pub fn receive(&mut self, now: &Instant) -> Result<Events, ServerError> {
        self.maintain_socket(now)?;

        // return all received messages and reset the buffer
        Ok(mem::replace(&mut self.incoming_events, Events::new()))
    }

    /// Runs the replication tick if one is due at `now`
    pub fn send_all_updates(&mut self, now: &Instant) -> Result<(), ServerError> {
        if self.socket.is_none() {
            return Err(ServerError::NotListening);
        }
        if !self.tick_timer.ready(now) {
            return Ok(());
        }

        let started = Instant::now();
        let sent_before = self.messages_sent;

        let updates = collect_updates(&mut self.entities);
        if !updates.is_empty() {
            let users = self.ready_users(None);
            for update in updates {
                let method = update.delivery_method();
                let message = NetMessage::EntityUpdate(update);
                for (_, address) in &users {
                    self.send_to(address, method, &message);
                }
            }
        }

        let processing = started.elapsed();
        self.tick_timer.finish(now, processing);
        self.status
            .record_tick(processing, self.messages_sent - sent_before);
        if let Some(report) = self.status.poll(now, self.users.len()) {
            info!("Server status: {}", report);
        }
        Ok(())
    }

    // Entities

    /// Spawns a server-owned entity and announces it to every ready user
    pub fn spawn_entity(&mut self, asset_id: AssetId) -> Result<EntityId, ServerError> {
        let entity_id =
            self.entities
                .create(&self.protocol, self.catalog.strings(), asset_id, None)?;
        self.announce_entity(&entity_id);
        Ok(entity_id)
    }

    /// Spawns an entity whose state is driven by `user_key`'s client.
    /// Only that client is told it owns the entity.
    pub fn spawn_entity_for(
        &mut self,
        user_key: &UserKey,
        asset_id: AssetId,
    ) -> Result<EntityId, ServerError> {
        if !self.users.contains_key(user_key) {
            return Err(ServerError::UnknownUser(*user_key));
        }
        let entity_id = self.entities.create_with_authority(
            &self.protocol,
            self.catalog.strings(),
            asset_id,
            None,
            false,
        )?;
        self.entity_owners.insert(entity_id, *user_key);
        self.announce_entity(&entity_id);
        Ok(entity_id)
    }

    /// Removes the entity and tells every ready user. Returns false if it
    /// did not exist.
    pub fn despawn_entity(&mut self, entity_id: &EntityId) -> bool {
        self.entity_owners.remove(entity_id);
        if self.entities.remove(entity_id).is_none() {
            return false;
        }
        self.broadcast_destroy(entity_id, None);
        true
    }

    /// Spawns the server-owned objects of a level baseline at their
    /// placements. Entries whose asset is not in the catalog, or has no
    /// prototype, are logged and skipped. Returns the spawned ids in order.
    pub fn load_level(&mut self, level: &[LevelEntity]) -> Vec<EntityId> {
        let mut spawned = Vec::with_capacity(level.len());
        for placement in level {
            let asset_id = self.catalog.asset_id(&placement.asset);
            if asset_id.is_none() {
                warn!("Skipping level entity '{}': not in the catalog", placement.asset);
                continue;
            }
            let entity_id = match self.entities.create(
                &self.protocol,
                self.catalog.strings(),
                asset_id,
                None,
            ) {
                Ok(entity_id) => entity_id,
                Err(error) => {
                    warn!("Skipping level entity '{}': {}", placement.asset, error);
                    continue;
                }
            };
            if let Some(entity) = self.entities.get_mut(&entity_id) {
                entity.set_position(placement.position);
                entity.set_rotation(placement.rotation);
            }
            self.announce_entity(&entity_id);
            spawned.push(entity_id);
        }
        info!("Level loaded: {} of {} entities", spawned.len(), level.len());
        spawned
    }

    pub fn entity(&self, entity_id: &EntityId) -> Option<&Entity> {
        self.entities.get(entity_id)
    }

    pub fn entity_mut(&mut self, entity_id: &EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(entity_id)
    }

    pub fn entity_ids(&mut self) -> Vec<EntityId> {
        self.entities.ids()
    }

    /// The user whose client drives this entity, if it is not server-owned
    pub fn entity_owner(&self, entity_id: &EntityId) -> Option<UserKey> {
        self.entity_owners.get(entity_id).copied()
    }

    /// Resend the entity's state on the next tick even if it did not change
    pub fn flag_sync(&mut self, entity_id: &EntityId) -> bool {
        self.entities.flag_sync(entity_id)
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

    /// Sends an action to one ready user
    pub fn action_client(&mut self, user_key: &UserKey, call: ActionCall) -> Result<(), ServerError> {
        let Some(user) = self.users.get(user_key) else {
            return Err(ServerError::UnknownUser(*user_key));
        };
        if !user.is_ready() {
            warn!("Not sending action {} to {:?}: not ready", call.action_id, user_key);
            return Ok(());
        }
        let address = user.address();
        self.send_to(&address, DeliveryMethod::ReliableOrdered, &NetMessage::Action(call));
        Ok(())
    }

    /// Sends an action to every ready user
    pub fn broadcast_action(&mut self, call: ActionCall) {
        let message = NetMessage::Action(call);
        for (_, address) in self.ready_users(None) {
            self.send_to(&address, DeliveryMethod::ReliableOrdered, &message);
        }
    }

    // Users

    pub fn user(&self, user_key: &UserKey) -> Option<&User> {
        self.users.get(user_key)
    }

    pub fn user_keys(&self) -> Vec<UserKey> {
        let mut output: Vec<UserKey> = self.users.keys().copied().collect();
        output.sort();
        output
    }

    pub fn users_count(&self) -> usize {
        self.users.len()
    }

    pub fn is_ready(&self, user_key: &UserKey) -> bool {
        self.users.get(user_key).map_or(false, User::is_ready)
    }

    /// Asks the transport to close the connection. The user is removed once
    /// the transport confirms, which shows up as a `DisconnectEvent`.
    pub fn disconnect_user(&mut self, user_key: &UserKey) -> Result<(), ServerError> {
        let Some(user) = self.users.get_mut(user_key) else {
            return Err(ServerError::UnknownUser(*user_key));
        };
        user.set_state(ConnectionState::Disconnecting);
        let address = user.address();
        let socket = self.socket.as_mut().ok_or(ServerError::NotListening)?;
        socket.disconnect(&address)?;
        Ok(())
    }

    pub fn catalog(&self) -> &AssetCatalog {
        &self.catalog
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    // Private methods

    fn maintain_socket(&mut self, now: &Instant) -> Result<(), ServerError> {
        loop {
            let Some(socket) = self.socket.as_mut() else {
                return Err(ServerError::NotListening);
            };
            let event = match socket.receive() {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(error) => {
                    warn!("Server socket error: {}", error);
                    self.incoming_events.push_error(error.into());
                    break;
                }
            };

            match event {
                SocketEvent::DiscoveryRequest(address) => {
                    if let Err(error) = socket.respond_discovery(&address, &self.config.server_name)
                    {
                        warn!("Cannot answer discovery from {}: {}", address, error);
                    }
                }
                SocketEvent::Connected(address) => self.handle_connect(address),
                SocketEvent::Disconnected(address) => self.handle_disconnect(&address),
                SocketEvent::Packet(address, payload) => self.handle_packet(&address, &payload)?,
                SocketEvent::DiscoveryResponse { address, .. } => {
                    debug!("Ignoring discovery response from {}", address);
                }
            }
        }

        self.send_catalog_uploads(now);
        Ok(())
    }

    fn handle_connect(&mut self, address: SocketAddr) {
        if self.user_connections.contains_key(&address) {
            debug!("Duplicate connect from {}", address);
            return;
        }

        self.last_user_key = self.last_user_key.wrapping_add(1);
        let user_key = UserKey::new(self.last_user_key);
        self.users.insert(user_key, User::new(address));
        self.user_connections.insert(address, user_key);
        info!("User {:?} connected from {}", user_key, address);
        self.incoming_events.push_connection(&user_key);

        let info = NetMessage::ServerInfo(ServerInfo {
            app_name: self.config.app_name.clone(),
            protocol_fingerprint: self.protocol.fingerprint(),
            endpoints: AssetCatalog::endpoints(),
        });
        self.send_to(&address, DeliveryMethod::ReliableOrdered, &info);
        self.set_state(&user_key, ConnectionState::Connected);

        let count = self.catalog.strings().len() as u32;
        self.send_to(
            &address,
            DeliveryMethod::ReliableOrdered,
            &NetMessage::StringsStart { count },
        );
        self.set_state(&user_key, ConnectionState::AwaitingCatalog);
    }

    fn handle_disconnect(&mut self, address: &SocketAddr) {
        let Some(user_key) = self.user_connections.remove(address) else {
            return;
        };
        if let Some(mut user) = self.users.remove(&user_key) {
            user.set_state(ConnectionState::Disconnected);
        }
        // entities owned by this user stay until someone destroys them
        info!("User {:?} disconnected from {}", user_key, address);
        self.incoming_events.push_disconnection(&user_key, *address);
    }

    fn handle_packet(&mut self, address: &SocketAddr, payload: &[u8]) -> Result<(), ServerError> {
        let Some(user_key) = self.user_connections.get(address).copied() else {
            warn!("Dropping packet from unknown address {}", address);
            return Ok(());
        };
        let message = match NetMessage::read(payload, HostType::Client) {
            Ok(message) => message,
            Err(source) => {
                warn!("Dropping packet from {:?}: {}", user_key, source);
                self.incoming_events.push_error(ServerError::Message {
                    address: *address,
                    source,
                });
                return Ok(());
            }
        };

        match message {
            NetMessage::ClientInfo { platform } => self.handle_client_info(&user_key, platform),
            NetMessage::StringsRequest => self.handle_strings_request(&user_key),
            NetMessage::AssetsRequest { platform } => {
                self.handle_assets_request(&user_key, platform)
            }
            NetMessage::Ready => self.handle_ready(&user_key),
            message if !self.is_ready(&user_key) => {
                warn!(
                    "Dropping {} from {:?}: connection is not ready",
                    message.net_op(),
                    user_key
                );
            }
            NetMessage::EntityUpdate(update) => self.handle_entity_update(&user_key, update),
            NetMessage::InstantiateEntity(request) => self.handle_instantiate(&user_key, request),
            NetMessage::DestroyEntity { entity_id } => self.handle_destroy(&user_key, &entity_id),
            NetMessage::ActionLocal(call) => self.handle_action(&user_key, call, false)?,
            NetMessage::ActionGlobal(call) => self.handle_action(&user_key, call, true)?,
            message => {
                debug!("Ignoring {} from {:?}", message.net_op(), user_key);
            }
        }
        Ok(())
    }

    // Handshake

    fn handle_client_info(&mut self, user_key: &UserKey, platform: Platform) {
        let Some(user) = self.users.get_mut(user_key) else {
            return;
        };
        user.set_platform(platform);
        let address = user.address();
        let size = self.catalog.blob_size(platform);
        debug!(
            "User {:?} is on platform {}, asset blob is {} bytes",
            user_key,
            platform.value(),
            size
        );
        self.send_to(
            &address,
            DeliveryMethod::ReliableOrdered,
            &NetMessage::AssetsStart { size },
        );
    }

    fn handle_strings_request(&mut self, user_key: &UserKey) {
        let Some(address) = self.users.get(user_key).map(User::address) else {
            return;
        };
        let transfer = PacedTransfer::strings(self.catalog.strings(), self.pacing(&address));
        if let Some(user) = self.users.get_mut(user_key) {
            user.upload.start_strings(transfer);
        }
    }

    fn handle_assets_request(&mut self, user_key: &UserKey, platform: Platform) {
        let Some(address) = self.users.get(user_key).map(User::address) else {
            return;
        };
        let chunk_size = self
            .socket
            .as_ref()
            .map_or(0, |socket| socket.mtu())
            .saturating_sub(CHUNK_HEADROOM)
            .max(1);
        let transfer =
            PacedTransfer::blob(&self.catalog, platform, chunk_size, self.pacing(&address));
        if let Some(user) = self.users.get_mut(user_key) {
            user.set_platform(platform);
            user.upload.start_blob(transfer);
        }
    }

    /// Catalog items go out one per round trip, so a slow link is not flooded
    fn pacing(&self, address: &SocketAddr) -> Duration {
        self.socket
            .as_ref()
            .and_then(|socket| socket.rtt(address))
            .unwrap_or(self.config.default_rtt)
    }

    fn send_catalog_uploads(&mut self, now: &Instant) {
        let mut outgoing = Vec::new();
        for user in self.users.values_mut() {
            if !user.upload.is_active() {
                continue;
            }
            let address = user.address();
            let interval = self
                .socket
                .as_ref()
                .and_then(|socket| socket.rtt(&address))
                .unwrap_or(self.config.default_rtt);
            for message in user.upload.poll(now, interval) {
                outgoing.push((address, message));
            }
        }
        for (address, message) in outgoing {
            self.send_to(&address, DeliveryMethod::ReliableOrdered, &message);
        }
    }

    fn handle_ready(&mut self, user_key: &UserKey) {
        let Some(user) = self.users.get_mut(user_key) else {
            return;
        };
        match user.state() {
            ConnectionState::Ready => {
                debug!("User {:?} signalled Ready twice", user_key);
                return;
            }
            ConnectionState::Disconnecting | ConnectionState::Disconnected => return,
            _ => {}
        }
        user.set_state(ConnectionState::Ready);
        let address = user.address();
        info!("User {:?} is ready", user_key);

        self.send_snapshot(user_key, &address);
        if let Some(asset_id) = self.player_prefab {
            if let Err(error) = self.spawn_entity_for(user_key, asset_id) {
                warn!("Cannot spawn player entity for {:?}: {}", user_key, error);
            }
        }
        self.incoming_events.push_ready(user_key);
    }

    /// Every live entity and its full state, over the reliable channel
    fn send_snapshot(&mut self, user_key: &UserKey, address: &SocketAddr) {
        let mut messages = Vec::new();
        for entity_id in self.entities.ids() {
            let Some(entity) = self.entities.get(&entity_id) else {
                continue;
            };
            messages.push(NetMessage::NewEntity {
                asset_id: entity.asset_id(),
                entity_id,
                is_owner: self.entity_owners.get(&entity_id) == Some(user_key),
            });
            messages.extend(full_state(entity).into_iter().map(NetMessage::EntityUpdate));
        }
        debug!(
            "Sending {} snapshot messages to {:?}",
            messages.len(),
            user_key
        );
        for message in &messages {
            self.send_to(address, DeliveryMethod::ReliableOrdered, message);
        }
    }

    // Entity traffic

    fn handle_entity_update(&mut self, user_key: &UserKey, update: EntityUpdate) {
        let entity_id = update.entity_id;
        if self.entity_owners.get(&entity_id) != Some(user_key) {
            warn!(
                "Dropping update for {} from {:?}: not the owner",
                entity_id, user_key
            );
            return;
        }
        let Some(entity) = self.entities.get_mut(&entity_id) else {
            warn!("Dropping update for {}: no such entity", entity_id);
            return;
        };
        if let Err(error) = entity.deserialize(update.channel, &update.payload) {
            warn!("Dropping update from {:?}: {}", user_key, error);
            return;
        }

        let channel = update.channel;
        let method = update.delivery_method();
        let message = NetMessage::EntityUpdate(update);
        for (_, address) in self.ready_users(Some(user_key)) {
            self.send_to(&address, method, &message);
        }
        self.incoming_events
            .push_update(user_key, &entity_id, channel);
    }

    fn handle_instantiate(&mut self, user_key: &UserKey, request: InstantiateRequest) {
        let entity_id = match self.entities.create(
            &self.protocol,
            self.catalog.strings(),
            request.asset_id,
            None,
        ) {
            Ok(entity_id) => entity_id,
            Err(error) => {
                warn!("Cannot instantiate for {:?}: {}", user_key, error);
                self.incoming_events.push_error(error.into());
                return;
            }
        };
        if let Some(entity) = self.entities.get_mut(&entity_id) {
            if let Some(position) = request.position {
                entity.set_position(position);
            }
            if let Some(rotation) = request.rotation {
                entity.set_rotation(rotation);
            }
            if let Some(scale) = request.scale {
                entity.set_scale(scale);
            }
        }
        self.announce_entity(&entity_id);
        self.incoming_events.push_spawn(user_key, &entity_id);
    }

    fn handle_destroy(&mut self, user_key: &UserKey, entity_id: &EntityId) {
        if self.entity_owners.get(entity_id) != Some(user_key) {
            warn!(
                "Dropping destroy of {} from {:?}: not the owner",
                entity_id, user_key
            );
            return;
        }
        self.entity_owners.remove(entity_id);
        self.entities.remove(entity_id);
        self.broadcast_destroy(entity_id, Some(user_key));
        self.incoming_events.push_despawn(user_key, entity_id);
    }

    fn handle_action(
        &mut self,
        user_key: &UserKey,
        call: ActionCall,
        global: bool,
    ) -> Result<(), ServerError> {
        let result = self
            .actions
            .dispatch(&self.protocol, &mut self.entities, &call);
        if drop_recoverable(result)
            .map_err(ServerError::ActionHandler)?
            .is_none()
        {
            return Ok(());
        }

        if global {
            let except = match self.config.global_action_policy {
                GlobalActionPolicy::IncludeSender => None,
                GlobalActionPolicy::ExcludeSender => Some(user_key),
            };
            let message = NetMessage::Action(call.clone());
            for (_, address) in self.ready_users(except) {
                self.send_to(&address, DeliveryMethod::ReliableOrdered, &message);
            }
        }
        self.incoming_events.push_action(user_key, call);
        Ok(())
    }

    fn announce_entity(&mut self, entity_id: &EntityId) {
        let Some(asset_id) = self.entities.get(entity_id).map(Entity::asset_id) else {
            return;
        };
        let owner = self.entity_owners.get(entity_id).copied();
        for (user_key, address) in self.ready_users(None) {
            let message = NetMessage::NewEntity {
                asset_id,
                entity_id: *entity_id,
                is_owner: owner == Some(user_key),
            };
            self.send_to(&address, DeliveryMethod::ReliableOrdered, &message);
        }
    }

    fn broadcast_destroy(&mut self, entity_id: &EntityId, except: Option<&UserKey>) {
        let message = NetMessage::DestroyEntity {
            entity_id: *entity_id,
        };
        for (_, address) in self.ready_users(except) {
            self.send_to(&address, DeliveryMethod::ReliableOrdered, &message);
        }
    }

    // Sending

    /// Ready users, in random order so no connection is always served first
    fn ready_users(&self, except: Option<&UserKey>) -> Vec<(UserKey, SocketAddr)> {
        let mut output: Vec<(UserKey, SocketAddr)> = self
            .users
            .iter()
            .filter(|(user_key, user)| user.is_ready() && Some(*user_key) != except)
            .map(|(user_key, user)| (*user_key, user.address()))
            .collect();
        fastrand::shuffle(&mut output);
        output
    }

    fn send_to(&mut self, address: &SocketAddr, method: DeliveryMethod, message: &NetMessage) {
        let Some(socket) = self.socket.as_mut() else {
            return;
        };
        match socket.send(address, method, &message.to_bytes()) {
            Ok(()) => self.messages_sent += 1,
            Err(error) => warn!("Cannot send {} to {}: {}", message.net_op(), address, error),
        }
    }

    fn set_state(&mut self, user_key: &UserKey, state: ConnectionState) {
        if let Some(user) = self.users.get_mut(user_key) {
            user.set_state(state);
        }
    }
}
