pub mod delivery;
pub mod error;
pub mod net_message;
pub mod net_op;
