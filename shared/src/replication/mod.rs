pub mod replicator;
pub mod status;
pub mod tick_timer;
