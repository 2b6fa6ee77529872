use thiserror::Error;

/// Errors that can occur while building or mirroring a catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Id 0 is reserved for "not found"
    #[error("Catalog id 0 is reserved and cannot be assigned to '{name}'")]
    ReservedId { name: String },

    /// Id already maps to a different name
    #[error("Catalog id {id} already maps to '{existing}', cannot remap it to '{name}'")]
    IdConflict {
        id: u32,
        existing: String,
        name: String,
    },

    /// Name already maps to a different id
    #[error("Catalog name '{name}' already has id {existing}, cannot remap it to {id}")]
    NameConflict { name: String, existing: u32, id: u32 },

    /// Blob chunk arrived before its size was announced
    #[error("Received an asset chunk at offset {offset} before the blob size was announced")]
    BlobNotStarted { offset: u32 },

    /// Blob chunk does not fit inside the announced size
    #[error("Asset chunk [{offset}, {offset}+{length}) exceeds the announced blob size of {total} bytes")]
    ChunkOutOfBounds { offset: u32, length: u32, total: u32 },

    /// Announced blob is larger than a client will mirror
    #[error("Announced asset blob of {length} bytes exceeds the limit of {max} bytes")]
    BlobTooLarge { length: u32, max: u32 },

    /// Blob chunk carries no bytes
    #[error("Received an empty asset chunk at offset {offset}")]
    EmptyChunk { offset: u32 },

    /// Serialized dictionary could not be decoded
    #[error("Serialized string dictionary is malformed")]
    Malformed,
}
