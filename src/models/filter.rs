use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Identifier of a filter inside one list
pub type FilterId = u8;

/// What the offload does with a packet that matches a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterAction {
    /// Packet is passed up to the host
    #[default]
    Keep,

    /// Packet is dropped by the offload
    Discard,
}

/// Which port of the packet a port filter looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDirection {
    Source,
    Destination,
}

/// Transport protocol of a port filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    Tcp,
    Udp,
}

/// Power states in which a filter is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityFlags(u8);

impl ActivityFlags {
    /// Filter applies while the host sleeps
    pub const SLEEP: Self = Self(0x01);

    /// Filter applies while the host is awake
    pub const WAKE: Self = Self(0x02);

    #[cfg(test)]
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn all() -> Self {
        Self::SLEEP | Self::WAKE
    }

    #[cfg(test)]
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for ActivityFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Kind of a filter record, without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    Port,
    EthType,
    IpType,
    Sentinel,
}

/// Match criteria of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterMatch {
    /// TCP or UDP port number
    Port {
        port: u16,
        direction: PortDirection,
        transport: Transport,
    },

    /// Ethernet frame type
    EthType { eth_type: u16 },

    /// IP protocol number
    IpType { protocol: u8 },

    /// End of the list
    #[default]
    Sentinel,
}

impl FilterMatch {
    pub fn kind(&self) -> FilterKind {
        match self {
            FilterMatch::Port { .. } => FilterKind::Port,
            FilterMatch::EthType { .. } => FilterKind::EthType,
            FilterMatch::IpType { .. } => FilterKind::IpType,
            FilterMatch::Sentinel => FilterKind::Sentinel,
        }
    }
}

/// A single packet filter as stored in a filter list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterRecord {
    /// Identifier, unique within one list
    pub id: FilterId,

    /// Keep or discard matching packets
    pub action: FilterAction,

    /// Power states the filter is active in
    #[serde(default = "ActivityFlags::all")]
    pub flags: ActivityFlags,

    /// Match criteria
    #[serde(flatten)]
    pub filter: FilterMatch,
}

impl FilterRecord {
    /// Create a filter that is active while sleeping and awake
    pub fn new(id: FilterId, action: FilterAction, filter: FilterMatch) -> Self {
        Self {
            id,
            action,
            flags: ActivityFlags::all(),
            filter,
        }
    }

    /// The zeroed terminator record
    pub fn sentinel() -> Self {
        Self::default()
    }

    pub fn is_sentinel(&self) -> bool {
        self.filter == FilterMatch::Sentinel
    }

    pub fn kind(&self) -> FilterKind {
        self.filter.kind()
    }

    pub fn is_discard(&self) -> bool {
        self.action == FilterAction::Discard
    }

    /// Whether both records describe the same traffic, whatever their action
    pub fn same_match(&self, other: &FilterMatch) -> bool {
        !self.is_sentinel() && self.filter == *other
    }
}

impl fmt::Display for FilterAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterAction::Keep => f.write_str("Keep"),
            FilterAction::Discard => f.write_str("Discard"),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Tcp => f.write_str("TCP"),
            Transport::Udp => f.write_str("UDP"),
        }
    }
}

impl fmt::Display for PortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortDirection::Source => f.write_str("Source Port"),
            PortDirection::Destination => f.write_str("Destination Port"),
        }
    }
}
