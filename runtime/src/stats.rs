use serde::Serialize;

/// Running totals for one endpoint.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LinkStats {
    /// Transmissions the modem accepted, retries included.
    pub sent:              u64,
    pub acked:             u64,
    pub retransmissions:   u64,
    /// `send_packet` calls that ran out of attempts.
    pub exhausted:         u64,

    pub delivered:         u64,
    pub duplicates:        u64,
    pub checksum_failures: u64,
    pub malformed:         u64,
    pub foreign:           u64,
    pub acks_sent:         u64,
}

impl LinkStats {
    /// Acknowledged fraction of accepted transmissions.
    pub fn ack_ratio(&self) -> Option<f64> {
        if self.sent == 0 {
            return None;
        }

        Some(self.acked as f64 / self.sent as f64)
    }
}
