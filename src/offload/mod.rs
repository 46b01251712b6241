//! Collaborators the commit protocol drives: the network link whose teardown
//! releases the offload, and the filtering engine that applies the active list.

pub mod engine;
pub mod link;

#[cfg(test)]
pub mod testing;

use thiserror::Error;

use crate::filters::buffer::FilterBuffer;
use crate::models::config::Credentials;

/// Link level failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    #[error("interface {0} not found")]
    InterfaceNotFound(String),

    #[error("interface {0} is down")]
    InterfaceDown(String),

    #[error("no network name configured")]
    MissingSsid,

    #[error("link is still associated")]
    StillAssociated,
}

/// Connection of the offloading device to its network.
///
/// Disconnecting is what makes the filtering engine let go of the active
/// filter list, so it has to complete before the lists are swapped.
pub trait NetworkLink: Send {
    fn disconnect(&mut self) -> Result<(), LinkError>;

    /// Associate again, blocking until done or failed
    fn connect(&mut self, credentials: &Credentials) -> Result<(), LinkError>;

    fn is_disconnected(&self) -> bool;
}

/// Packet filtering engine fed with the active list
pub trait FilterEngine: Send {
    /// Restart the engine with `active`; the engine keeps no reference to it
    fn reinitialize(&mut self, active: &FilterBuffer);

    /// Human readable form of what the engine currently applies
    fn program(&self) -> Option<String>;
}
