use std::collections::HashMap;

use log::debug;

use crate::{
    catalog::string_dictionary::StringDictionary,
    protocol::Protocol,
    types::{AssetId, EntityId},
    world::{entity::Entity, error::EntityError},
};

/// The live entities of one peer, authoritative on the server and
/// mirrored on clients.
///
/// Ids come from a counter that only moves forward, so a removed id is
/// never handed out again by the same table.
#[derive(Debug, Default)]
pub struct EntityTable {
    entities: HashMap<EntityId, Entity>,
    owned: Vec<EntityId>,
    last_id: u32,
}

impl EntityTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns an entity of `asset_id`. Without an `entity_id` (or with id 0)
    /// the next free id is allocated and the entity is owned by this peer.
    pub fn create(
        &mut self,
        protocol: &Protocol,
        catalog: &StringDictionary,
        asset_id: AssetId,
        entity_id: Option<EntityId>,
    ) -> Result<EntityId, EntityError> {
        let entity_id = entity_id.filter(|id| id.value() != 0);
        let owned = entity_id.is_none();
        self.create_with_authority(protocol, catalog, asset_id, entity_id, owned)
    }

    /// Like `create`, with ownership decided by the caller
    pub fn create_with_authority(
        &mut self,
        protocol: &Protocol,
        catalog: &StringDictionary,
        asset_id: AssetId,
        entity_id: Option<EntityId>,
        owned: bool,
    ) -> Result<EntityId, EntityError> {
        let asset = catalog.name(asset_id.value());
        if asset.is_empty() {
            return Err(EntityError::AssetNotFound { asset_id });
        }
        let Some(prototype) = protocol.prototype(asset) else {
            return Err(EntityError::MissingComponent {
                asset: asset.to_string(),
            });
        };

        let entity_id = match entity_id.filter(|id| id.value() != 0) {
            Some(entity_id) => {
                if self.entities.contains_key(&entity_id) {
                    return Err(EntityError::IdInUse { entity_id });
                }
                self.last_id = self.last_id.max(entity_id.value());
                entity_id
            }
            None => self.allocate_id(),
        };

        let entity = Entity::new(entity_id, asset_id, owned, protocol.instantiate(prototype));
        self.entities.insert(entity_id, entity);
        if owned {
            self.owned.push(entity_id);
        }
        debug!("Created {} from asset '{}'", entity_id, asset);
        Ok(entity_id)
    }

    fn allocate_id(&mut self) -> EntityId {
        loop {
            self.last_id = self.last_id.wrapping_add(1).max(1);
            let candidate = EntityId::new(self.last_id);
            if !self.entities.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    pub fn get(&self, entity_id: &EntityId) -> Option<&Entity> {
        self.entities
            .get(entity_id)
            .filter(|entity| !entity.is_destroyed())
    }

    pub fn get_mut(&mut self, entity_id: &EntityId) -> Option<&mut Entity> {
        self.entities
            .get_mut(entity_id)
            .filter(|entity| !entity.is_destroyed())
    }

    pub fn contains(&self, entity_id: &EntityId) -> bool {
        self.get(entity_id).is_some()
    }

    /// Drops the entry; a missing id is not an error
    pub fn remove(&mut self, entity_id: &EntityId) -> Option<Entity> {
        let entity = self.entities.remove(entity_id)?;
        if entity.is_owned() {
            self.owned.retain(|id| id != entity_id);
        }
        if entity.is_destroyed() {
            None
        } else {
            Some(entity)
        }
    }

    /// Records that the object behind `entity_id` went away outside the
    /// network layer. The entry is swept on the next iteration.
    pub fn mark_destroyed(&mut self, entity_id: &EntityId) -> bool {
        match self.entities.get_mut(entity_id) {
            Some(entity) if !entity.is_destroyed() => {
                entity.mark_destroyed();
                true
            }
            _ => false,
        }
    }

    /// Forces the next replication tick to resend this entity
    pub fn flag_sync(&mut self, entity_id: &EntityId) -> bool {
        match self.get_mut(entity_id) {
            Some(entity) => {
                entity.force_sync();
                true
            }
            None => false,
        }
    }

    /// Live entities, in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .values()
            .filter(|entity| !entity.is_destroyed())
    }

    /// Ids of every live entity in ascending order, sweeping destroyed entries
    pub fn ids(&mut self) -> Vec<EntityId> {
        self.sweep();
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Ids of the entities this peer owns, sweeping destroyed entries
    pub fn owned_ids(&mut self) -> Vec<EntityId> {
        let entities = &mut self.entities;
        self.owned.retain(|entity_id| {
            match entities.get(entity_id).map(Entity::is_destroyed) {
                Some(true) => {
                    entities.remove(entity_id);
                    false
                }
                Some(false) => true,
                None => false,
            }
        });
        self.owned.clone()
    }

    /// Owned entities plus any flagged for a forced resend
    pub fn sync_candidates(&mut self) -> Vec<EntityId> {
        let mut ids = self.owned_ids();
        let mut forced: Vec<EntityId> = self
            .iter()
            .filter(|entity| entity.is_sync_forced() && !entity.is_owned())
            .map(|entity| entity.id())
            .collect();
        forced.sort();
        ids.extend(forced);
        ids
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep(&mut self) {
        let before = self.entities.len();
        self.entities.retain(|_, entity| !entity.is_destroyed());
        if self.entities.len() != before {
            let entities = &self.entities;
            self.owned.retain(|entity_id| entities.contains_key(entity_id));
        }
    }
}
