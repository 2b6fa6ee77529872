use std::{default::Default, time::Duration};

use brisk_shared::TickTimer;

use crate::error::ServerError;

/// Who receives the rebroadcast of a global action
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlobalActionPolicy {
    /// Every ready connection, the caller included
    IncludeSender,
    /// Every ready connection except the caller
    ExcludeSender,
}

/// Contains Config properties which will be used by the Server
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Application identifier sent to clients in `SystemInfo`
    pub app_name: String,
    /// Name returned to discovery requests
    pub server_name: String,
    /// Port the game socket listens on
    pub port_game: u16,
    /// Port the out-of-band catalog endpoints are served on
    pub port_web: u16,
    /// Replication ticks per second
    pub update_rate: f32,
    /// How often tick statistics are logged
    pub status_report_interval: Duration,
    pub global_action_policy: GlobalActionPolicy,
    /// Pacing used for catalog transfers when the transport reports no round-trip time
    pub default_rtt: Duration,
    /// Asset spawned for, and owned by, each connection once it is ready
    pub player_prefab: Option<String>,
}

impl ServerConfig {
    /// Rejects settings the server cannot start with
    pub fn validate(&self) -> Result<(), ServerError> {
        let reason = if self.app_name.is_empty() {
            "app_name must not be empty"
        } else if self.port_game == 0 {
            "port_game must not be 0"
        } else if TickTimer::interval_for(self.update_rate).is_none() {
            "update_rate must be a positive number of ticks per second, at least one per hour"
        } else if matches!(&self.player_prefab, Some(prefab) if prefab.is_empty()) {
            "player_prefab must not be an empty name"
        } else {
            return Ok(());
        };
        Err(ServerError::InvalidConfig {
            reason: reason.to_string(),
        })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            app_name: "brisk".to_string(),
            server_name: "brisk server".to_string(),
            port_game: 3553,
            port_web: 3550,
            update_rate: 30.0,
            status_report_interval: Duration::from_secs(2),
            global_action_policy: GlobalActionPolicy::IncludeSender,
            default_rtt: Duration::from_millis(50),
            player_prefab: None,
        }
    }
}
