use thiserror::Error;

use crate::schema::value::ValueKind;

/// Errors raised while declaring schemas or reading and writing values against them
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Protocol is locked and cannot be modified
    #[error("Protocol is already locked and cannot be modified. Protocol.lock() has been called and no further changes are allowed")]
    AlreadyLocked,

    /// A behaviour, field or prototype was declared without a name
    #[error("Schema names must not be empty")]
    EmptyName,

    /// Two behaviours share a name
    #[error("Behaviour '{name}' is declared twice")]
    DuplicateBehaviour { name: String },

    /// Two fields of one behaviour share a name
    #[error("Field '{field}' is declared twice on behaviour '{behaviour}'")]
    DuplicateField { behaviour: String, field: String },

    /// Two prototypes share a name
    #[error("Prototype '{name}' is declared twice")]
    DuplicatePrototype { name: String },

    /// Two actions share an id
    #[error("Action {action_id} is declared twice")]
    DuplicateAction { action_id: u32 },

    /// Reference to a behaviour that was never declared
    #[error("Behaviour '{name}' is not declared in the protocol")]
    UnknownBehaviour { name: String },

    /// Reference to a field the behaviour does not have
    #[error("Behaviour '{behaviour}' has no field '{field}'")]
    UnknownField { behaviour: String, field: String },

    /// A value of the wrong kind was written to a typed slot
    #[error("Expected a {expected:?} value for '{field}' but got {found:?}")]
    KindMismatch {
        field: String,
        expected: ValueKind,
        found: ValueKind,
    },
}
