//! In-memory link and engine that record the calls made on them.

use parking_lot::Mutex;
use std::sync::Arc;

use crate::filters::buffer::FilterBuffer;
use crate::models::config::Credentials;
use crate::models::filter::FilterRecord;
use crate::offload::{FilterEngine, LinkError, NetworkLink};

/// Calls seen by the doubles, shared so ordering across both can be checked
pub type EventLog = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
pub struct RecordingLink {
    events: EventLog,

    /// `disconnect` reports an error (the link still goes down)
    pub fail_disconnect: bool,

    /// `connect` reports an error
    pub fail_connect: bool,

    /// `disconnect` leaves the link associated
    pub stay_connected: bool,

    connected: bool,
}

impl RecordingLink {
    /// Create a link that starts associated
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            connected: true,
            ..Default::default()
        }
    }
}

impl NetworkLink for RecordingLink {
    fn disconnect(&mut self) -> Result<(), LinkError> {
        self.events.lock().push("disconnect".to_string());
        if !self.stay_connected {
            self.connected = false;
        }
        if self.fail_disconnect {
            return Err(LinkError::InterfaceDown("test0".to_string()));
        }
        Ok(())
    }

    fn connect(&mut self, credentials: &Credentials) -> Result<(), LinkError> {
        self.events
            .lock()
            .push(format!("connect {}", credentials.ssid));
        if self.fail_connect {
            return Err(LinkError::InterfaceNotFound("test0".to_string()));
        }
        self.connected = true;
        Ok(())
    }

    fn is_disconnected(&self) -> bool {
        !self.connected
    }
}

#[derive(Default)]
pub struct RecordingEngine {
    events: EventLog,
    loaded: Vec<FilterRecord>,
}

impl RecordingEngine {
    pub fn new(events: EventLog) -> Self {
        Self {
            events,
            loaded: Vec::new(),
        }
    }
}

impl FilterEngine for RecordingEngine {
    fn reinitialize(&mut self, active: &FilterBuffer) {
        self.events
            .lock()
            .push(format!("reinitialize {}", active.len()));
        self.loaded = active.to_vec();
    }

    fn program(&self) -> Option<String> {
        let ids: Vec<String> = self.loaded.iter().map(|r| r.id.to_string()).collect();
        Some(ids.join(","))
    }
}
