pub mod harness;
pub mod raw_peer;

pub use harness::{Harness, HarnessError, Step, TICK};
pub use raw_peer::RawPeer;
