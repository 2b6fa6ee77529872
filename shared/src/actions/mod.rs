pub mod action_call;
pub mod dispatcher;
pub mod error;

pub use action_call::ActionCall;
