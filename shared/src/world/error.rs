use thiserror::Error;

use crate::{
    schema::error::SchemaError,
    types::{AssetId, EntityId},
};

/// Errors that can occur while creating, updating or resolving entities
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntityError {
    /// Asset id has no catalog entry
    #[error("{asset_id} has no catalog entry")]
    AssetNotFound { asset_id: AssetId },

    /// Asset resolved, but the protocol declares no prototype for it
    #[error("Asset '{asset}' has no networked prototype in the protocol")]
    MissingComponent { asset: String },

    /// Caller-supplied id belongs to a live entity
    #[error("{entity_id} is already in use")]
    IdInUse { entity_id: EntityId },

    /// Id does not resolve to a live entity
    #[error("{entity_id} does not exist")]
    EntityNotFound { entity_id: EntityId },

    /// Update payload did not match the entity's schema
    #[error("Malformed {channel} update payload for {entity_id}")]
    MalformedUpdate {
        entity_id: EntityId,
        channel: &'static str,
    },

    /// A behaviour value failed schema validation
    #[error("{entity_id}: {source}")]
    Schema {
        entity_id: EntityId,
        #[source]
        source: SchemaError,
    },
}
