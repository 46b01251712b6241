//! Policy checks run before a filter enters the pending list.
//!
//! The checks run in a fixed order: action homogeneity, then field ranges,
//! then uniqueness. The first failing check decides the reported reason.

use serde::Serialize;
use thiserror::Error;

use crate::filters::buffer::FilterBuffer;
use crate::filters::fields::{CandidateMatch, FilterCandidate};
use crate::models::filter::{FilterAction, FilterId, FilterMatch};

pub const MIN_ETH_TYPE: u32 = 0x0800;
pub const MAX_ETH_TYPE: u32 = 0xFFFF;
pub const MIN_IP_PROTOCOL: u32 = 0x01;
pub const MAX_IP_PROTOCOL: u32 = 0xFF;
pub const MAX_PORT: u32 = 0xFFFF;

/// Why a filter was refused
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum RejectReason {
    /// A discard filter is staged, the list accepts nothing more
    #[error("the pending list contains a discard filter, no further filters are allowed")]
    DiscardListLocked,

    /// Keep and discard filters cannot share a list
    #[error("keep and discard filters cannot be combined")]
    ActionMismatch,

    #[error("{field} {value:#x} is out of range {min:#x}-{max:#x}")]
    OutOfRange {
        field: &'static str,
        value: u32,
        min: u32,
        max: u32,
    },

    #[error("filter duplicates pending filter {existing}")]
    Duplicate { existing: FilterId },
}

/// Check `candidate` against the pending list
pub fn validate(candidate: &FilterCandidate, pending: &FilterBuffer) -> Result<(), RejectReason> {
    check_action(candidate.action, pending)?;
    let filter = resolve(candidate)?;
    check_unique(&filter, pending)
}

/// Range-check the typed values and convert them into match criteria
pub fn resolve(candidate: &FilterCandidate) -> Result<FilterMatch, RejectReason> {
    let filter = match candidate.filter {
        CandidateMatch::Port {
            port,
            direction,
            transport,
        } => FilterMatch::Port {
            port: in_range("port", port, 0, MAX_PORT)? as u16,
            direction,
            transport,
        },
        CandidateMatch::EthType { eth_type } => FilterMatch::EthType {
            eth_type: in_range("ethernet type", eth_type, MIN_ETH_TYPE, MAX_ETH_TYPE)? as u16,
        },
        CandidateMatch::IpType { protocol } => FilterMatch::IpType {
            protocol: in_range("IP protocol", protocol, MIN_IP_PROTOCOL, MAX_IP_PROTOCOL)? as u8,
        },
    };
    Ok(filter)
}

fn check_action(action: FilterAction, pending: &FilterBuffer) -> Result<(), RejectReason> {
    if pending.contains_discard() {
        return Err(RejectReason::DiscardListLocked);
    }
    // pending is keep-only at this point
    if !pending.is_empty() && action == FilterAction::Discard {
        return Err(RejectReason::ActionMismatch);
    }
    Ok(())
}

fn check_unique(filter: &FilterMatch, pending: &FilterBuffer) -> Result<(), RejectReason> {
    match pending.iter().find(|record| record.same_match(filter)) {
        Some(existing) => Err(RejectReason::Duplicate {
            existing: existing.id,
        }),
        None => Ok(()),
    }
}

fn in_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<u32, RejectReason> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(RejectReason::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}
