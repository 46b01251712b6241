use log::info;

use crate::filters::buffer::FilterBuffer;
use crate::models::filter::{
    ActivityFlags, FilterAction, FilterMatch, FilterRecord, PortDirection, Transport,
};
use crate::offload::FilterEngine;

/// Filtering engine that translates the active list into a BPF expression.
///
/// A keep list lets only matching packets through, a discard list drops
/// matching packets. An empty list compiles to an empty expression, which
/// accepts everything.
pub struct BpfFilterEngine {
    interface: String,
    program: Option<String>,
    generation: u64,
}

impl BpfFilterEngine {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            program: None,
            generation: 0,
        }
    }

    /// Number of times the engine has been (re)initialized
    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl FilterEngine for BpfFilterEngine {
    fn reinitialize(&mut self, active: &FilterBuffer) {
        let program = compile(active);
        self.generation += 1;
        info!(
            "Filter engine on {} restarted with {} filters (generation {}): '{}'",
            self.interface,
            active.len(),
            self.generation,
            program
        );
        self.program = Some(program);
    }

    fn program(&self) -> Option<String> {
        self.program.clone()
    }
}

/// Compile a filter list into a BPF filter expression.
///
/// Filters without `WAKE` are left out.
pub fn compile(list: &FilterBuffer) -> String {
    let clauses: Vec<String> = list
        .iter()
        .filter(|record| record.flags.contains(ActivityFlags::WAKE))
        .filter_map(clause)
        .collect();
    if clauses.is_empty() {
        return String::new();
    }

    let joined = clauses.join(" or ");
    match list.action() {
        Some(FilterAction::Discard) => format!("not ({})", joined),
        _ => joined,
    }
}

fn clause(record: &FilterRecord) -> Option<String> {
    match record.filter {
        FilterMatch::Port {
            port,
            direction,
            transport,
        } => {
            let transport = match transport {
                Transport::Tcp => "tcp",
                Transport::Udp => "udp",
            };
            let direction = match direction {
                PortDirection::Source => "src",
                PortDirection::Destination => "dst",
            };
            Some(format!("{} {} port {}", transport, direction, port))
        }
        FilterMatch::EthType { eth_type } => Some(format!("ether proto 0x{:04x}", eth_type)),
        FilterMatch::IpType { protocol } => Some(format!("ip proto {}", protocol)),
        FilterMatch::Sentinel => None,
    }
}
