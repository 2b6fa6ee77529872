use std::{mem, net::SocketAddr, vec::IntoIter};

use brisk_shared::{ActionCall, Channel, EntityId};

use crate::{user::UserKey, ServerError};

/// Everything that happened during one `Server::receive()` pump
pub struct Events {
    connections: Vec<UserKey>,
    ready: Vec<UserKey>,
    disconnections: Vec<(UserKey, SocketAddr)>,
    spawns: Vec<(UserKey, EntityId)>,
    despawns: Vec<(UserKey, EntityId)>,
    updates: Vec<(UserKey, EntityId, Channel)>,
    actions: Vec<(UserKey, ActionCall)>,
    errors: Vec<ServerError>,

    empty: bool,
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            ready: Vec::new(),
            disconnections: Vec::new(),
            spawns: Vec::new(),
            despawns: Vec::new(),
            updates: Vec::new(),
            actions: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self, user_key: &UserKey) {
        self.connections.push(*user_key);
        self.empty = false;
    }

    pub(crate) fn push_ready(&mut self, user_key: &UserKey) {
        self.ready.push(*user_key);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, user_key: &UserKey, address: SocketAddr) {
        self.disconnections.push((*user_key, address));
        self.empty = false;
    }

    pub(crate) fn push_spawn(&mut self, user_key: &UserKey, entity_id: &EntityId) {
        self.spawns.push((*user_key, *entity_id));
        self.empty = false;
    }

    pub(crate) fn push_despawn(&mut self, user_key: &UserKey, entity_id: &EntityId) {
        self.despawns.push((*user_key, *entity_id));
        self.empty = false;
    }

    pub(crate) fn push_update(&mut self, user_key: &UserKey, entity_id: &EntityId, channel: Channel) {
        self.updates.push((*user_key, *entity_id, channel));
        self.empty = false;
    }

    pub(crate) fn push_action(&mut self, user_key: &UserKey, call: ActionCall) {
        self.actions.push((*user_key, call));
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: ServerError) {
        self.errors.push(error);
        self.empty = false;
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut Events) -> Self::Iter;

    fn has(events: &Events) -> bool;
}

// ConnectEvent
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<UserKey>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.connections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.connections.is_empty()
    }
}

// ReadyEvent
/// A connection finished its catalog sync and now receives replication traffic
pub struct ReadyEvent;
impl Event for ReadyEvent {
    type Iter = IntoIter<UserKey>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.ready);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.ready.is_empty()
    }
}

// DisconnectEvent
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<(UserKey, SocketAddr)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.disconnections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.disconnections.is_empty()
    }
}

// SpawnEntityEvent
/// An entity spawned at a client's request
pub struct SpawnEntityEvent;
impl Event for SpawnEntityEvent {
    type Iter = IntoIter<(UserKey, EntityId)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.spawns);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.spawns.is_empty()
    }
}

// DespawnEntityEvent
/// An entity destroyed by its owning client
pub struct DespawnEntityEvent;
impl Event for DespawnEntityEvent {
    type Iter = IntoIter<(UserKey, EntityId)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.despawns);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.despawns.is_empty()
    }
}

// UpdateEntityEvent
/// State of a client-owned entity was applied and relayed
pub struct UpdateEntityEvent;
impl Event for UpdateEntityEvent {
    type Iter = IntoIter<(UserKey, EntityId, Channel)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.updates);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.updates.is_empty()
    }
}

// ActionEvent
/// An action that reached its target. Dropped actions never show up here.
pub struct ActionEvent;
impl Event for ActionEvent {
    type Iter = IntoIter<(UserKey, ActionCall)>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.actions);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.actions.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<ServerError>;

    fn iter(events: &mut Events) -> Self::Iter {
        let list = mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &Events) -> bool {
        !events.errors.is_empty()
    }
}
