pub mod behaviour;
pub mod error;
pub mod value;
