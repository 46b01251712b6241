use serde::Serialize;

use crate::filters::buffer::FilterBuffer;
use crate::models::filter::FilterId;

/// Where the active filter list comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveSource {
    /// A list committed from the editor
    Staged,

    /// The factory default descriptor
    FactoryDefaults,
}

/// Ping-pong pair of filter lists.
///
/// One list is pending and may be edited, the other one (or the factory
/// defaults) is active and only read by the filtering engine. Roles move by
/// flipping the selector, the active list is never written in place.
#[derive(Debug, Clone)]
pub struct DoubleBufferStore {
    buffers: [FilterBuffer; 2],
    pending: usize,
    active: ActiveSource,
    factory_defaults: FilterBuffer,
}

impl DoubleBufferStore {
    /// Create a store that starts out with the factory defaults active
    pub fn new(capacity: usize, factory_defaults: FilterBuffer) -> Self {
        Self {
            buffers: [
                FilterBuffer::with_capacity(capacity),
                FilterBuffer::with_capacity(capacity),
            ],
            pending: 0,
            active: ActiveSource::FactoryDefaults,
            factory_defaults,
        }
    }

    /// The list the filtering engine is configured with
    pub fn get_active(&self) -> &FilterBuffer {
        match self.active {
            ActiveSource::Staged => &self.buffers[1 - self.pending],
            ActiveSource::FactoryDefaults => &self.factory_defaults,
        }
    }

    /// The only list editor operations may change
    pub fn get_pending(&mut self) -> &mut FilterBuffer {
        &mut self.buffers[self.pending]
    }

    pub fn pending(&self) -> &FilterBuffer {
        &self.buffers[self.pending]
    }

    pub fn factory_defaults(&self) -> &FilterBuffer {
        &self.factory_defaults
    }

    pub fn active_source(&self) -> ActiveSource {
        self.active
    }

    /// Index of the pending buffer, for logging
    pub fn pending_index(&self) -> usize {
        self.pending
    }

    /// Promote the pending list to active and hand out a fresh pending list.
    ///
    /// Must only be called once the engine stopped reading the active list.
    /// Returns the displaced contents of the buffer that became pending.
    pub fn swap_pending_to_active(&mut self) -> FilterBuffer {
        let capacity = self.buffers[self.pending].capacity();
        self.pending = 1 - self.pending;
        self.active = ActiveSource::Staged;
        std::mem::replace(
            &mut self.buffers[self.pending],
            FilterBuffer::with_capacity(capacity),
        )
    }

    /// Point the active view at the factory defaults
    pub fn activate_factory_defaults(&mut self) {
        self.active = ActiveSource::FactoryDefaults;
    }

    /// Copy the factory defaults into the pending list, returning the next free id
    pub fn import_factory_defaults(&mut self) -> FilterId {
        let Self {
            buffers,
            pending,
            factory_defaults,
            ..
        } = self;
        buffers[*pending].import(factory_defaults)
    }
}
