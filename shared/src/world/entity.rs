use brisk_serde::{ByteReader, ByteWriter};

use crate::{
    messages::{delivery::Channel, net_message::EntityUpdate},
    schema::{
        behaviour::{BehaviourState, POSITION_FIELD, ROTATION_FIELD, SCALE_FIELD},
        error::SchemaError,
        value::Value,
    },
    types::{AssetId, EntityId, Vec3},
    world::error::EntityError,
};

/// A replicated network object: an id, the asset it was spawned from and
/// the ordered behaviour states its prototype declares.
#[derive(Clone, Debug)]
pub struct Entity {
    id: EntityId,
    asset_id: AssetId,
    owned: bool,
    behaviours: Vec<BehaviourState>,
    reliable_baseline: Option<Vec<u8>>,
    unreliable_baseline: Option<Vec<u8>>,
    force_sync: bool,
    destroyed: bool,
}

impl Entity {
    pub(crate) fn new(
        id: EntityId,
        asset_id: AssetId,
        owned: bool,
        behaviours: Vec<BehaviourState>,
    ) -> Self {
        Self {
            id,
            asset_id,
            owned,
            behaviours,
            reliable_baseline: None,
            unreliable_baseline: None,
            force_sync: false,
            destroyed: false,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn asset_id(&self) -> AssetId {
        self.asset_id
    }

    /// True on the peer holding write authority
    pub fn is_owned(&self) -> bool {
        self.owned
    }

    pub fn behaviours(&self) -> &[BehaviourState] {
        &self.behaviours
    }

    pub fn behaviour(&self, index: usize) -> Option<&BehaviourState> {
        self.behaviours.get(index)
    }

    pub fn behaviour_mut(&mut self, index: usize) -> Option<&mut BehaviourState> {
        self.behaviours.get_mut(index)
    }

    pub fn behaviour_by_name(&self, name: &str) -> Option<&BehaviourState> {
        self.behaviours.iter().find(|state| state.name() == name)
    }

    pub fn behaviour_by_name_mut(&mut self, name: &str) -> Option<&mut BehaviourState> {
        self.behaviours.iter_mut().find(|state| state.name() == name)
    }

    /// Sets one field of a named behaviour
    pub fn set(&mut self, behaviour: &str, field: &str, value: Value) -> Result<(), EntityError> {
        let entity_id = self.id;
        let Some(state) = self.behaviour_by_name_mut(behaviour) else {
            return Err(EntityError::Schema {
                entity_id,
                source: SchemaError::UnknownBehaviour {
                    name: behaviour.to_string(),
                },
            });
        };
        state
            .set(field, value)
            .map_err(|source| EntityError::Schema { entity_id, source })
    }

    pub fn get(&self, behaviour: &str, field: &str) -> Option<&Value> {
        self.behaviour_by_name(behaviour)?.get(field)
    }

    // Transform

    pub fn position(&self) -> Vec3 {
        self.transform_field(POSITION_FIELD).unwrap_or(Vec3::ZERO)
    }

    pub fn rotation(&self) -> Vec3 {
        self.transform_field(ROTATION_FIELD).unwrap_or(Vec3::ZERO)
    }

    pub fn scale(&self) -> Vec3 {
        self.transform_field(SCALE_FIELD).unwrap_or(Vec3::ONE)
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.set_transform_field(POSITION_FIELD, position);
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.set_transform_field(ROTATION_FIELD, rotation);
    }

    pub fn set_scale(&mut self, scale: Vec3) {
        self.set_transform_field(SCALE_FIELD, scale);
    }

    fn transform_field(&self, field: &str) -> Option<Vec3> {
        self.behaviours.first()?.get(field)?.as_vec3()
    }

    fn set_transform_field(&mut self, field: &str, value: Vec3) {
        if let Some(transform) = self.behaviours.first_mut() {
            // the transform schema is fixed, so this cannot mismatch
            let _ = transform.set(field, Value::Vec3(value));
        }
    }

    // Serialization

    /// Every behaviour's fields for `channel`, in behaviour then field order
    pub fn serialize(&self, channel: Channel) -> Result<Vec<u8>, EntityError> {
        let mut writer = ByteWriter::new();
        for state in &self.behaviours {
            state
                .write_channel(channel, &mut writer)
                .map_err(|source| EntityError::Schema {
                    entity_id: self.id,
                    source,
                })?;
        }
        Ok(writer.to_bytes())
    }

    /// Applies a payload produced by `serialize` on another peer.
    /// Nothing is applied unless the whole payload decodes and is fully consumed.
    pub fn deserialize(&mut self, channel: Channel, payload: &[u8]) -> Result<(), EntityError> {
        let entity_id = self.id;
        let malformed = || EntityError::MalformedUpdate {
            entity_id,
            channel: channel_name(channel),
        };
        let mut reader = ByteReader::new(payload);
        let mut decoded = Vec::with_capacity(self.behaviours.len());
        for state in &self.behaviours {
            decoded.push(state.read_channel(channel, &mut reader).map_err(|_| malformed())?);
        }
        if !reader.is_exhausted() {
            return Err(malformed());
        }
        for (state, values) in self.behaviours.iter_mut().zip(decoded) {
            state.apply(values);
        }
        Ok(())
    }

    /// Full current state of one channel as an update message
    pub fn full_update(&self, channel: Channel) -> Result<EntityUpdate, EntityError> {
        Ok(EntityUpdate {
            entity_id: self.id,
            channel,
            payload: self.serialize(channel)?,
        })
    }

    // Delta tracking

    pub fn baseline(&self, channel: Channel) -> Option<&[u8]> {
        match channel {
            Channel::Reliable => self.reliable_baseline.as_deref(),
            Channel::Unreliable => self.unreliable_baseline.as_deref(),
        }
    }

    pub(crate) fn set_baseline(&mut self, channel: Channel, bytes: Vec<u8>) {
        match channel {
            Channel::Reliable => self.reliable_baseline = Some(bytes),
            Channel::Unreliable => self.unreliable_baseline = Some(bytes),
        }
    }

    /// True when some channel's state differs from what was last sent
    pub fn is_dirty(&self) -> bool {
        Channel::ALL.iter().any(|channel| match self.serialize(*channel) {
            Ok(bytes) => self.baseline(*channel) != Some(bytes.as_slice()),
            Err(_) => false,
        })
    }

    pub fn is_sync_forced(&self) -> bool {
        self.force_sync
    }

    pub(crate) fn force_sync(&mut self) {
        self.force_sync = true;
    }

    pub(crate) fn clear_force_sync(&mut self) {
        self.force_sync = false;
    }

    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn mark_destroyed(&mut self) {
        self.destroyed = true;
    }
}

fn channel_name(channel: Channel) -> &'static str {
    match channel {
        Channel::Reliable => "reliable",
        Channel::Unreliable => "unreliable",
    }
}
