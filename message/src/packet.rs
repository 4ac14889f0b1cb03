use std::fmt::{
    Display,
    Formatter,
};

use crate::{
    checksum::{
        Checksum,
        PayloadCrc,
    },
    Seq,
};

pub const FIELD_SEPARATOR: char = '|';

/// Largest data field the modem accepts in a single `AT+SEND`.
pub const MAX_PAYLOAD_LEN: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed packet: expected seq|payload|crc")]
    Malformed,

    #[error("invalid sequence number field")]
    Sequence,

    #[error("invalid checksum field")]
    Checksum,
}

/// A data packet as it appears in the `AT+SEND` data field: `SEQ|PAYLOAD|CRC32`.
///
/// The checksum covers the payload only. A corrupted sequence field therefore
/// passes verification; this matches what deployed devices send.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Packet {
    pub seq:     Seq,
    pub payload: String,
    pub crc:     u32,
}

impl Packet {
    #[inline]
    pub fn new(seq: Seq, payload: impl Into<String>) -> Self {
        let payload = payload.into();
        let crc = PayloadCrc::checksum(payload.as_bytes());

        Self {
            seq,
            payload,
            crc,
        }
    }

    #[inline]
    pub fn encode(&self) -> String {
        self.to_string()
    }

    /// Split a wire string into its fields without checking the checksum.
    ///
    /// The sequence ends at the first separator and the checksum starts after
    /// the last one, so a payload may itself contain separators.
    pub fn decode(wire: &str) -> Result<Self, DecodeError> {
        let (seq, rest) = wire.split_once(FIELD_SEPARATOR).ok_or(DecodeError::Malformed)?;
        let (payload, crc) = rest.rsplit_once(FIELD_SEPARATOR).ok_or(DecodeError::Malformed)?;

        Ok(Self {
            seq:     parse_decimal(seq).ok_or(DecodeError::Sequence)?,
            payload: payload.to_owned(),
            crc:     parse_decimal(crc).ok_or(DecodeError::Checksum)?,
        })
    }

    #[inline]
    pub fn verify(&self) -> bool {
        verify(&self.payload, self.crc)
    }
}

impl Display for Packet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.seq,
            self.payload,
            self.crc,
            sep = FIELD_SEPARATOR
        )
    }
}

#[inline]
pub fn verify(payload: &str, crc: u32) -> bool {
    PayloadCrc::verify(payload.as_bytes(), crc)
}

/// Plain unsigned decimal only: `str::parse` would also take a leading `+`.
pub(crate) fn parse_decimal<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    s.parse().ok()
}
