use crate::notification::RCV_PREFIX;

/// One line of modem output, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reply<'a> {
    Ok,
    Err(u8),
    Ready,
    Notification,
    /// `+NAME=value` answering a query such as `AT+VER?`.
    Value { name: &'a str, value: &'a str },
    Other(&'a str),
}

impl<'a> Reply<'a> {
    pub fn classify(line: &'a str) -> Self {
        let line = line.trim();

        match line {
            "+OK" | "OK" => return Reply::Ok,
            "+READY" => return Reply::Ready,
            _ => {},
        }

        // a report can follow line noise without a line break of its own
        if line.contains(RCV_PREFIX) {
            return Reply::Notification;
        }

        if let Some(code) = line.strip_prefix("+ERR=") {
            return match code.trim().parse() {
                Ok(code) => Reply::Err(code),
                Err(_) => Reply::Other(line),
            };
        }

        if let Some((name, value)) = line.strip_prefix('+').and_then(|rest| rest.split_once('=')) {
            return Reply::Value {
                name,
                value,
            };
        }

        Reply::Other(line)
    }

    /// Whether this line ends the modem's answer to a command.
    #[inline]
    pub fn is_final(&self) -> bool {
        matches!(self, Reply::Ok | Reply::Err(_) | Reply::Ready | Reply::Value { .. })
    }
}

/// Whether a collected command response contains an affirmative reply.
#[inline]
pub fn is_ok(response: &str) -> bool {
    response.contains("+OK") || response.lines().any(|line| line.trim() == "OK")
}

/// First `+ERR=<code>` found in a collected command response.
pub fn error_code(response: &str) -> Option<u8> {
    response.lines().find_map(|line| match Reply::classify(line) {
        Reply::Err(code) => Some(code),
        _ => None,
    })
}

pub fn describe_error(code: u8) -> &'static str {
    match code {
        1 => "missing CR LF at end of command",
        2 => "command does not start with AT",
        4 => "unknown command",
        5 => "data length does not match",
        10 => "transmit timed out",
        12 => "CRC error",
        13 => "transmit data exceeds 240 bytes",
        14 => "failed to write flash memory",
        15 => "unknown failure",
        17 => "last transmission not completed",
        18 => "preamble value not allowed",
        19 => "receive failed, header error",
        20 => "invalid smart receiving power saving time",
        _ => "unrecognized error code",
    }
}
