use std::{mem, net::SocketAddr, vec::IntoIter};

use brisk_shared::{ActionCall, Channel, EntityId};

use crate::ClientError;

/// Everything that happened during one `Client::receive()` pump
pub struct Events {
    connections: Vec<SocketAddr>,
    failures: Vec<SocketAddr>,
    ready: Vec<SocketAddr>,
    disconnections: Vec<SocketAddr>,
    spawns: Vec<(EntityId, bool)>,
    despawns: Vec<EntityId>,
    updates: Vec<(EntityId, Channel)>,
    actions: Vec<ActionCall>,
    errors: Vec<ClientError>,

    empty: bool,
}

impl Default for Events {
    fn default() -> Self {
        Self::new()
    }
}

impl Events {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            failures: Vec::new(),
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

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    pub(crate) fn push_connection(&mut self, server: SocketAddr) {
        self.connections.push(server);
        self.empty = false;
    }

    pub(crate) fn push_connection_failed(&mut self, server: SocketAddr) {
        self.failures.push(server);
        self.empty = false;
    }

    pub(crate) fn push_ready(&mut self, server: SocketAddr) {
        self.ready.push(server);
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, server: SocketAddr) {
        self.disconnections.push(server);
        self.empty = false;
    }

    pub(crate) fn push_spawn(&mut self, entity_id: EntityId, is_owner: bool) {
        self.spawns.push((entity_id, is_owner));
        self.empty = false;
    }

    pub(crate) fn push_despawn(&mut self, entity_id: EntityId) {
        self.despawns.push(entity_id);
        self.empty = false;
    }

    pub(crate) fn push_update(&mut self, entity_id: EntityId, channel: Channel) {
        self.updates.push((entity_id, channel));
        self.empty = false;
    }

    pub(crate) fn push_action(&mut self, call: ActionCall) {
        self.actions.push(call);
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: ClientError) {
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

macro_rules! impl_event {
    ($(#[$meta:meta])* $name:ident, $field:ident, $item:ty) => {
        $(#[$meta])*
        pub struct $name;
        impl Event for $name {
            type Iter = IntoIter<$item>;

            fn iter(events: &mut Events) -> Self::Iter {
                let list = mem::take(&mut events.$field);
                IntoIterator::into_iter(list)
            }

            fn has(events: &Events) -> bool {
                !events.$field.is_empty()
            }
        }
    };
}

impl_event!(ConnectEvent, connections, SocketAddr);
impl_event!(
    /// Discovery or connection did not complete within `connect_timeout`
    ConnectionFailedEvent,
    failures,
    SocketAddr
);
impl_event!(
    /// The catalog is synced and `Ready` was sent; entity traffic follows
    ReadyEvent,
    ready,
    SocketAddr
);
impl_event!(DisconnectEvent, disconnections, SocketAddr);
impl_event!(
    /// An entity was mirrored. The flag is true if this client owns it.
    SpawnEntityEvent,
    spawns,
    (EntityId, bool)
);
impl_event!(DespawnEntityEvent, despawns, EntityId);
impl_event!(UpdateEntityEvent, updates, (EntityId, Channel));
impl_event!(ActionEvent, actions, ActionCall);
impl_event!(ErrorEvent, errors, ClientError);
