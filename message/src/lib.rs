//! Text formats spoken across the serial link to the radio module and over
//! the air between endpoints.

pub mod ack;
pub mod checksum;
pub mod command;
pub mod notification;
pub mod packet;
pub mod reply;

pub use ack::Ack;
pub use checksum::{
    Checksum,
    PayloadCrc,
};
pub use command::{
    Command,
    RfParameters,
};
pub use notification::Notification;
pub use packet::{
    DecodeError,
    Packet,
    MAX_PAYLOAD_LEN,
};
pub use reply::Reply;

/// Radio module address.
pub type Address = u16;

/// Packet sequence number, wrapping mod 256.
pub type Seq = u8;
