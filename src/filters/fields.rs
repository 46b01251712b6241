use std::collections::HashMap;
use std::num::IntErrorKind;
use thiserror::Error;

use crate::models::filter::{FilterAction, FilterMatch, FilterRecord, PortDirection, Transport};

/// Form field carrying the filter kind (`PF`, `ET` or `IT`)
pub const FIELD_KIND: &str = "filter_type";
/// Form field carrying the action (`K` or `D`)
pub const FIELD_ACTION: &str = "action";
/// Form field carrying the transport of a port filter (`T` or `U`)
pub const FIELD_TRANSPORT: &str = "protocol";
/// Form field carrying the direction of a port filter (`SP` or `DP`)
pub const FIELD_DIRECTION: &str = "direction";
/// Form field carrying the decimal port number
pub const FIELD_PORT: &str = "port_number";
/// Form field carrying the hexadecimal ethernet type
pub const FIELD_ETH_TYPE: &str = "ether_type";
/// Form field carrying the IP protocol number
pub const FIELD_IP_PROTO: &str = "ip_proto";

/// Errors while reading editor form fields
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("missing field '{0}'")]
    Missing(&'static str),

    #[error("invalid value '{value}' for field '{field}'")]
    Invalid { field: &'static str, value: String },

    #[error("unknown filter type '{0}'")]
    UnknownKind(String),
}

/// Match criteria as typed by the operator, before range checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateMatch {
    Port {
        port: u32,
        direction: PortDirection,
        transport: Transport,
    },
    EthType {
        eth_type: u32,
    },
    IpType {
        protocol: u32,
    },
}

/// A filter submitted by the editor, not yet validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterCandidate {
    pub action: FilterAction,
    pub filter: CandidateMatch,
}

impl FilterCandidate {
    pub fn new(action: FilterAction, filter: CandidateMatch) -> Self {
        Self { action, filter }
    }

    /// Turn a stored record back into a candidate, `None` for the terminator
    pub fn from_record(record: &FilterRecord) -> Option<Self> {
        let filter = match record.filter {
            FilterMatch::Port {
                port,
                direction,
                transport,
            } => CandidateMatch::Port {
                port: port.into(),
                direction,
                transport,
            },
            FilterMatch::EthType { eth_type } => CandidateMatch::EthType {
                eth_type: eth_type.into(),
            },
            FilterMatch::IpType { protocol } => CandidateMatch::IpType {
                protocol: protocol.into(),
            },
            FilterMatch::Sentinel => return None,
        };
        Some(Self::new(record.action, filter))
    }

    /// Parse the key/value pairs posted by the filter form.
    ///
    /// Only the fields relevant to the selected kind are read, the form
    /// posts the others with placeholder values.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Self, FieldError> {
        let kind = required(fields, FIELD_KIND)?;
        let action = match required(fields, FIELD_ACTION)? {
            "K" => FilterAction::Keep,
            "D" => FilterAction::Discard,
            other => return Err(invalid(FIELD_ACTION, other)),
        };

        let filter = match kind {
            "PF" => {
                let transport = match required(fields, FIELD_TRANSPORT)? {
                    "T" => Transport::Tcp,
                    "U" => Transport::Udp,
                    other => return Err(invalid(FIELD_TRANSPORT, other)),
                };
                let direction = match required(fields, FIELD_DIRECTION)? {
                    "SP" => PortDirection::Source,
                    "DP" => PortDirection::Destination,
                    other => return Err(invalid(FIELD_DIRECTION, other)),
                };
                let raw = required(fields, FIELD_PORT)?;
                let port = parse_radix(raw, 10).ok_or_else(|| invalid(FIELD_PORT, raw))?;
                CandidateMatch::Port {
                    port,
                    direction,
                    transport,
                }
            }
            "ET" => {
                let raw = required(fields, FIELD_ETH_TYPE)?;
                let digits = raw
                    .strip_prefix("0x")
                    .or_else(|| raw.strip_prefix("0X"))
                    .unwrap_or(raw);
                let eth_type =
                    parse_radix(digits, 16).ok_or_else(|| invalid(FIELD_ETH_TYPE, raw))?;
                CandidateMatch::EthType { eth_type }
            }
            "IT" => {
                let raw = required(fields, FIELD_IP_PROTO)?;
                let protocol = parse_number(raw).ok_or_else(|| invalid(FIELD_IP_PROTO, raw))?;
                CandidateMatch::IpType { protocol }
            }
            other => return Err(FieldError::UnknownKind(other.to_string())),
        };

        Ok(Self { action, filter })
    }
}

fn required<'a>(
    fields: &'a HashMap<String, String>,
    name: &'static str,
) -> Result<&'a str, FieldError> {
    fields
        .get(name)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .ok_or(FieldError::Missing(name))
}

fn invalid(field: &'static str, value: &str) -> FieldError {
    FieldError::Invalid {
        field,
        value: value.to_string(),
    }
}

/// `0x`-prefixed hexadecimal or plain decimal
fn parse_number(raw: &str) -> Option<u32> {
    match raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        Some(hex) => parse_radix(hex, 16),
        None => parse_radix(raw, 10),
    }
}

/// Numbers too large for `u32` saturate, the range check rejects them later
fn parse_radix(digits: &str, radix: u32) -> Option<u32> {
    match u32::from_str_radix(digits, radix) {
        Ok(value) => Some(value),
        Err(e) if *e.kind() == IntErrorKind::PosOverflow => Some(u32::MAX),
        Err(_) => None,
    }
}
