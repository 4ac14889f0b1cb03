use std::fmt::{
    Display,
    Formatter,
};

use crate::Address;

pub const RCV_PREFIX: &str = "+RCV=";

/// Unsolicited receive report: `+RCV=<source>,<length>,<payload>,<rssi>,<snr>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Notification {
    pub source:  Address,
    pub length:  usize,
    pub payload: String,
    pub rssi:    i16,
    pub snr:     i16,
}

impl Notification {
    /// Locate and parse the first receive report in `text`, ignoring anything
    /// around it on the line.
    ///
    /// The payload is everything between the second comma and the
    /// second-to-last comma, so payloads with commas survive. The advertised
    /// length is kept but not used to slice.
    pub fn find(text: &str) -> Option<Self> {
        let start = text.find(RCV_PREFIX)? + RCV_PREFIX.len();
        let body = &text[start..];
        let body = body.split(['\r', '\n']).next().unwrap_or(body).trim_end();

        let mut head = body.splitn(3, ',');
        let source = head.next()?.trim().parse().ok()?;
        let length = head.next()?.trim().parse().ok()?;
        let rest = head.next()?;

        let mut tail = rest.rsplitn(3, ',');
        let snr = tail.next()?.trim().parse().ok()?;
        let rssi = tail.next()?.trim().parse().ok()?;
        let payload = tail.next()?;

        if payload.len() != length {
            tracing::trace!(advertised = length, actual = payload.len(), "receive report length mismatch");
        }

        Some(Self {
            source,
            length,
            payload: payload.to_owned(),
            rssi,
            snr,
        })
    }
}

impl Display for Notification {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}{},{},{},{},{}",
            RCV_PREFIX, self.source, self.length, self.payload, self.rssi, self.snr
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_ack_report() {
        let n = Notification::find("+RCV=2,9,ACK|1,-40,9").unwrap();

        assert_eq!(n.source, 2);
        assert_eq!(n.length, 9);
        assert_eq!(n.payload, "ACK|1");
        assert_eq!(n.rssi, -40);
        assert_eq!(n.snr, 9);
    }

    #[test]
    fn surrounding_noise() {
        let n = Notification::find("\r\n\0garbage+RCV=1,18,5|HELLO|3242484790,-55,10\r\n+OK").unwrap();

        assert_eq!(n.source, 1);
        assert_eq!(n.payload, "5|HELLO|3242484790");
        assert_eq!(n.rssi, -55);
        assert_eq!(n.snr, 10);
    }

    #[test]
    fn payload_with_commas() {
        let n = Notification::find("+RCV=7,12,3|a,b,c|0,-101,-3").unwrap();

        assert_eq!(n.payload, "3|a,b,c|0");
        assert_eq!(n.rssi, -101);
        assert_eq!(n.snr, -3);
    }

    #[test]
    fn rejects_incomplete() {
        assert_eq!(Notification::find("+OK"), None);
        assert_eq!(Notification::find("+RCV=1,3,bad"), None);
        assert_eq!(Notification::find("+RCV=x,3,bad,-55,10"), None);
        assert_eq!(Notification::find("+RCV=1,3,bad,loud,10"), None);
    }

    #[test]
    fn display_round_trip() {
        let line = "+RCV=1,3,bad,-55,10";
        assert_eq!(Notification::find(line).unwrap().to_string(), line);
    }
}
