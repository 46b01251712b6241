use std::fmt;

use crate::filters::buffer::FilterBuffer;
use crate::models::filter::{FilterMatch, FilterRecord};

/// One paragraph per filter, followed by a blank line. The terminator renders as nothing.
impl fmt::Display for FilterRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.filter {
            FilterMatch::Port {
                port,
                direction,
                transport,
            } => {
                writeln!(f, "ID {}[Port Filter]:", self.id)?;
                writeln!(f, "\tPort = {},", port)?;
                writeln!(f, "\tAction = {},", self.action)?;
                writeln!(f, "\tProtocol = {},", transport)?;
                writeln!(f, "\tDirection = {}", direction)?;
            }
            FilterMatch::EthType { eth_type } => {
                writeln!(f, "ID {}[Eth Type]:", self.id)?;
                writeln!(f, "\tPacket Type = 0x{:x},", eth_type)?;
                writeln!(f, "\tAction = {}", self.action)?;
            }
            FilterMatch::IpType { protocol } => {
                writeln!(f, "ID {}[IP Type]:", self.id)?;
                writeln!(f, "\tPacket Type = 0x{:x},", protocol)?;
                writeln!(f, "\tAction = {}", self.action)?;
            }
            FilterMatch::Sentinel => return Ok(()),
        }
        writeln!(f)
    }
}

/// Text listing of every filter in the list
pub fn render_list(list: &FilterBuffer) -> String {
    list.iter().map(ToString::to_string).collect()
}
