use thiserror::Error;

/// Returned when a [`crate::ByteReader`] cannot produce the requested value,
/// either because the buffer ran out or because the bytes are not a valid
/// encoding of the type being read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("malformed or truncated payload")]
pub struct SerdeErr;
