use std::fmt::{
    Display,
    Formatter,
};

use crate::{
    packet::{
        parse_decimal,
        FIELD_SEPARATOR,
    },
    Seq,
};

pub const ACK_TAG: &str = "ACK";

/// Delivery confirmation for one sequence number. Sent once, never acknowledged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ack {
    pub seq: Seq,
}

impl Ack {
    #[inline]
    pub const fn new(seq: Seq) -> Self {
        Self {
            seq,
        }
    }

    /// Accepts exactly `ACK|<digits>`.
    pub fn parse(payload: &str) -> Option<Self> {
        let (tag, seq) = payload.split_once(FIELD_SEPARATOR)?;

        if tag != ACK_TAG {
            return None;
        }

        Some(Self::new(parse_decimal(seq)?))
    }
}

impl Display for Ack {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}{}", ACK_TAG, FIELD_SEPARATOR, self.seq)
    }
}
