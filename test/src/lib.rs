//! Shared fixtures for the end-to-end tests: one protocol and catalog used by
//! every peer, and a harness that runs a server and its clients over the
//! in-memory transport.

pub mod helpers;
pub mod test_protocol;

pub use helpers::*;
pub use test_protocol::{
    catalog, protocol, ACTION_DAMAGE, ACTION_PING, ALIEN, BLOB_SIZE, PLAYER, PLAYER_CONTROLLER,
    SHIP,
};
