use std::collections::HashMap;

use log::{debug, warn};

use crate::{
    actions::{
        action_call::ActionCall,
        error::{ActionError, HandlerError},
    },
    protocol::Protocol,
    schema::value::{read_values, Value},
    world::{entity::Entity, entity_table::EntityTable},
};

/// What a handler gets to work with
pub struct ActionContext<'a> {
    pub entity: &'a mut Entity,
    pub behaviour_index: usize,
}

pub type ActionHandler = Box<dyn FnMut(&mut ActionContext<'_>, &[Value]) -> Result<(), HandlerError>>;

/// Outcome of a dispatch that reached a valid target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispatched {
    /// A handler ran
    Handled,
    /// The call was valid but no handler is registered on this peer
    Unhandled,
}

/// Routes incoming `ActionCall`s to registered handlers
#[derive(Default)]
pub struct ActionDispatcher {
    handlers: HashMap<u32, ActionHandler>,
}

impl ActionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, action_id: u32, handler: F) -> Result<(), ActionError>
    where
        F: FnMut(&mut ActionContext<'_>, &[Value]) -> Result<(), HandlerError> + 'static,
    {
        if self.handlers.contains_key(&action_id) {
            return Err(ActionError::HandlerExists { action_id });
        }
        self.handlers.insert(action_id, Box::new(handler));
        Ok(())
    }

    pub fn has_handler(&self, action_id: u32) -> bool {
        self.handlers.contains_key(&action_id)
    }

    /// Resolves the target, decodes the arguments and runs the handler.
    /// Resolution failures are recoverable; a failing handler is returned
    /// as `ActionError::Handler` for the caller to deal with.
    pub fn dispatch(
        &mut self,
        protocol: &Protocol,
        entities: &mut EntityTable,
        call: &ActionCall,
    ) -> Result<Dispatched, ActionError> {
        let action_id = call.action_id;
        let Some(signature) = protocol.action(action_id) else {
            return Err(ActionError::UnknownAction { action_id });
        };
        let Some(entity) = entities.get_mut(&call.entity_id) else {
            return Err(ActionError::EntityNotFound {
                action_id,
                entity_id: call.entity_id,
            });
        };

        let index = usize::from(call.behaviour_index);
        let count = entity.behaviours().len();
        let Some(state) = entity.behaviour(index) else {
            return Err(ActionError::BehaviourOutOfRange {
                action_id,
                entity_id: call.entity_id,
                index: call.behaviour_index,
                count,
            });
        };
        let expected = protocol
            .behaviour(signature.behaviour)
            .map(|schema| schema.name().to_string())
            .unwrap_or_default();
        if state.name() != expected {
            return Err(ActionError::BehaviourMismatch {
                action_id,
                index: call.behaviour_index,
                expected,
                found: state.name().to_string(),
            });
        }

        let args = read_values(&signature.params, &call.args)
            .map_err(|_| ActionError::MalformedArguments { action_id })?;

        let Some(handler) = self.handlers.get_mut(&action_id) else {
            debug!("No handler for action {} on {}", action_id, call.entity_id);
            return Ok(Dispatched::Unhandled);
        };
        let mut context = ActionContext {
            entity,
            behaviour_index: index,
        };
        handler(&mut context, &args).map_err(|source| ActionError::Handler { action_id, source })?;
        Ok(Dispatched::Handled)
    }
}

/// Logs a recoverable dispatch failure and drops the call;
/// hands a handler failure back to the caller
pub fn drop_recoverable(
    result: Result<Dispatched, ActionError>,
) -> Result<Option<Dispatched>, ActionError> {
    match result {
        Ok(dispatched) => Ok(Some(dispatched)),
        Err(error) if error.is_recoverable() => {
            warn!("Dropping action: {}", error);
            Ok(None)
        }
        Err(error) => Err(error),
    }
}
