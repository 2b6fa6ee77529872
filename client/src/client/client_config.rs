use std::{default::Default, time::Duration};

use brisk_shared::{Platform, TickTimer};

use crate::ClientError;

/// Contains Config properties which will be used by a Client
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Must match the server's application name
    pub app_name: String,
    /// Replication ticks per second for entities this client owns
    pub update_rate: f32,
    /// How often tick statistics are logged
    pub status_report_interval: Duration,
    /// How long discovery and connection may take before a
    /// `ConnectionFailedEvent` is raised. Connecting is never retried.
    pub connect_timeout: Duration,
    /// Selects which asset blob the server streams
    pub platform: Platform,
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        let reason = if self.app_name.is_empty() {
            "app_name must not be empty"
        } else if TickTimer::interval_for(self.update_rate).is_none() {
            "update_rate must be a positive number of ticks per second, at least one per hour"
        } else {
            return Ok(());
        };
        Err(ClientError::InvalidConfig {
            reason: reason.to_string(),
        })
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_name: "brisk".to_string(),
            update_rate: 30.0,
            status_report_interval: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(10),
            platform: Platform::current(),
        }
    }
}
