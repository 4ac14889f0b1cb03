use std::{
    fmt::{
        Display,
        Formatter,
    },
    str::FromStr,
};

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

use crate::Address;

/// RF settings sent with `AT+PARAMETER=<sf>,<bw>,<cr>,<preamble>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RfParameters {
    pub spreading_factor: u8,
    pub bandwidth:        u8,
    pub coding_rate:      u8,
    pub preamble:         u16,
}

impl Default for RfParameters {
    fn default() -> Self {
        Self {
            spreading_factor: 9,
            bandwidth:        7,
            coding_rate:      1,
            preamble:         12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("expected 4 comma-separated fields, got {0}")]
    FieldCount(usize),

    #[error("invalid {field}: {value:?}")]
    Field { field: &'static str, value: String },
}

impl FromStr for RfParameters {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields = s.split(',').map(str::trim).collect::<Vec<_>>();

        let &[sf, bw, cr, preamble] = &fields[..] else {
            return Err(ParseError::FieldCount(fields.len()));
        };

        fn field<T: FromStr>(name: &'static str, value: &str) -> Result<T, ParseError> {
            value.parse().map_err(|_| ParseError::Field {
                field: name,
                value: value.to_owned(),
            })
        }

        Ok(Self {
            spreading_factor: field("spreading factor", sf)?,
            bandwidth:        field("bandwidth", bw)?,
            coding_rate:      field("coding rate", cr)?,
            preamble:         field("preamble", preamble)?,
        })
    }
}

impl Display for RfParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{},{},{},{}", self.spreading_factor, self.bandwidth, self.coding_rate, self.preamble)
    }
}

impl Serialize for RfParameters {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RfParameters {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// AT commands understood by the radio module. `Display` renders the command
/// line without its terminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Command {
    Attention,
    Address(Address),
    NetworkId(u8),
    Band(u32),
    Parameter(RfParameters),
    Send { destination: Address, data: String },
    Factory,
    Reset,
    Version,
}

impl Command {
    #[inline]
    pub fn send(destination: Address, data: impl Into<String>) -> Self {
        Self::Send {
            destination,
            data: data.into(),
        }
    }
}

impl Display for Command {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Attention => f.write_str("AT"),
            Command::Address(address) => write!(f, "AT+ADDRESS={}", address),
            Command::NetworkId(id) => write!(f, "AT+NETWORKID={}", id),
            Command::Band(hz) => write!(f, "AT+BAND={}", hz),
            Command::Parameter(params) => write!(f, "AT+PARAMETER={}", params),
            Command::Send {
                destination,
                data,
            } => write!(f, "AT+SEND={},{},{}", destination, data.len(), data),
            Command::Factory => f.write_str("AT+FACTORY"),
            Command::Reset => f.write_str("AT+RESET"),
            Command::Version => f.write_str("AT+VER?"),
        }
    }
}
