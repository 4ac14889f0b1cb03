use std::time::Duration;

use serde::{
    Deserialize,
    Serialize,
};

use message::{
    Address,
    RfParameters,
};

/// Settings applied to the modem once at initialization and used by the
/// delivery state machine for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    pub address:        Address,
    pub peer:           Address,
    pub network_id:     u8,
    pub band:           u32,
    pub parameters:     RfParameters,
    /// Drop inbound traffic whose source is not `peer`.
    pub filter_foreign: bool,
    /// Send `AT+FACTORY` before configuring.
    pub factory_reset:  bool,
    pub retry:          RetryPolicy,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            address:        1,
            peer:           2,
            network_id:     6,
            band:           915_000_000,
            parameters:     RfParameters::default(),
            filter_foreign: true,
            factory_reset:  false,
            retry:          RetryPolicy::default(),
        }
    }
}

impl LinkConfig {
    #[inline]
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total transmissions per `send_packet`, first one included.
    pub attempts:           u32,
    pub ack_timeout_ms:     u64,
    pub retry_delay_ms:     u64,
    pub command_timeout_ms: u64,
    /// Pause between configuration commands.
    pub command_delay_ms:   u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts:           3,
            ack_timeout_ms:     5000,
            retry_delay_ms:     1000,
            command_timeout_ms: 1000,
            command_delay_ms:   100,
        }
    }
}

impl RetryPolicy {
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.attempts.max(1)
    }

    #[inline]
    pub fn ack_timeout(&self) -> Duration {
        Duration::from_millis(self.ack_timeout_ms)
    }

    #[inline]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    #[inline]
    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }

    #[inline]
    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }
}
