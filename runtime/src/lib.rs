//! Reliable packet delivery over a LoRa AT-command modem.

pub mod ack;
pub mod config;
pub mod endpoint;
pub mod health;
pub mod serial;
pub mod stats;
pub mod transport;

pub use config::{
    LinkConfig,
    RetryPolicy,
};
pub use endpoint::Endpoint;
pub use health::{
    Fault,
    Health,
    HealthMonitor,
    Operation,
};
pub use serial::SerialModem;
pub use stats::LinkStats;
pub use transport::Transport;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] transport::Error),

    #[error("invalid payload: {reason}")]
    InvalidPayload { reason: String },
}

impl Error {
    #[inline]
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Transport(e) => e.is_fatal(),
            Error::InvalidPayload { .. } => false,
        }
    }
}
