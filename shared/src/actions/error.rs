use std::error::Error as StdError;

use thiserror::Error;

use crate::types::EntityId;

pub type HandlerError = Box<dyn StdError + Send + Sync>;

/// Errors that can occur while dispatching an action
#[derive(Debug, Error)]
pub enum ActionError {
    /// Target entity is not in the table
    #[error("Action {action_id} targets {entity_id}, which does not exist")]
    EntityNotFound { action_id: u32, entity_id: EntityId },

    /// Behaviour index is past the end of the entity's behaviour list
    #[error("Action {action_id} targets behaviour {index} of {entity_id}, which only has {count}")]
    BehaviourOutOfRange {
        action_id: u32,
        entity_id: EntityId,
        index: u8,
        count: usize,
    },

    /// Action id is not declared in the protocol
    #[error("Action {action_id} is not declared in the protocol")]
    UnknownAction { action_id: u32 },

    /// Behaviour at the given index is not the one the action belongs to
    #[error("Action {action_id} belongs to behaviour '{expected}', but index {index} is '{found}'")]
    BehaviourMismatch {
        action_id: u32,
        index: u8,
        expected: String,
        found: String,
    },

    /// Argument bytes did not match the declared parameter kinds
    #[error("Malformed arguments for action {action_id}")]
    MalformedArguments { action_id: u32 },

    /// A handler is already registered for this action
    #[error("Action {action_id} already has a handler")]
    HandlerExists { action_id: u32 },

    /// The handler itself failed
    #[error("Handler for action {action_id} failed: {source}")]
    Handler {
        action_id: u32,
        #[source]
        source: HandlerError,
    },
}

impl ActionError {
    /// Everything except a failing handler is logged and dropped by the pump
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, ActionError::Handler { .. })
    }
}
