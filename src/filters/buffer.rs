use thiserror::Error;

use crate::models::filter::{FilterAction, FilterId, FilterRecord};

/// 10 usable filters plus the terminator slot
pub const DEFAULT_CAPACITY: usize = 11;

/// Capacity errors of a filter list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("filter list is full")]
    Full,

    #[error("filter list is empty")]
    Empty,
}

/// Fixed-capacity, sentinel-terminated list of filters.
///
/// Every slot at or after the cursor holds a sentinel record. The last slot
/// is reserved for the terminator, so at most `capacity - 1` real filters fit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterBuffer {
    slots: Box<[FilterRecord]>,
    cursor: usize,
}

impl FilterBuffer {
    /// Create an empty list. A capacity below 1 is raised to 1.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: vec![FilterRecord::sentinel(); capacity.max(1)].into_boxed_slice(),
            cursor: 0,
        }
    }

    /// Build a list from records in order
    pub fn from_records<I>(capacity: usize, records: I) -> Result<Self, BufferError>
    where
        I: IntoIterator<Item = FilterRecord>,
    {
        let mut buffer = Self::with_capacity(capacity);
        for record in records {
            buffer.append(record)?;
        }
        Ok(buffer)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of real filters the list can hold
    pub fn max_filters(&self) -> usize {
        self.capacity() - 1
    }

    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor >= self.max_filters()
    }

    /// Cursor moved past the terminator slot
    pub fn is_overflowed(&self) -> bool {
        self.cursor > self.max_filters()
    }

    /// Add a record at the end of the list
    pub fn append(&mut self, record: FilterRecord) -> Result<(), BufferError> {
        if self.is_full() {
            return Err(BufferError::Full);
        }
        self.slots[self.cursor] = record;
        self.cursor += 1;
        self.slots[self.cursor] = FilterRecord::sentinel();
        Ok(())
    }

    /// Drop the most recently added record and return it
    pub fn remove_last(&mut self) -> Result<FilterRecord, BufferError> {
        if self.is_empty() {
            return Err(BufferError::Empty);
        }
        let last = self.cursor - 1;
        let removed = std::mem::take(&mut self.slots[last]);
        self.slots[self.cursor] = FilterRecord::sentinel();
        self.cursor = last;
        Ok(removed)
    }

    /// Overwrite the whole list with the contents of `source`.
    ///
    /// Returns the id the next added filter should get.
    pub fn import(&mut self, source: &FilterBuffer) -> FilterId {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            *slot = source
                .slots
                .get(index)
                .copied()
                .unwrap_or_else(FilterRecord::sentinel);
        }

        let last = self.max_filters();
        self.slots[last] = FilterRecord::sentinel();
        self.cursor = self
            .slots
            .iter()
            .position(FilterRecord::is_sentinel)
            .unwrap_or(last);
        for slot in self.slots[self.cursor..].iter_mut() {
            *slot = FilterRecord::sentinel();
        }

        let count = FilterId::try_from(self.cursor).unwrap_or(FilterId::MAX);
        self.iter()
            .map(|record| record.id.saturating_add(1))
            .fold(count, FilterId::max)
    }

    /// Write the terminator at the cursor
    pub fn terminate(&mut self) {
        if let Some(slot) = self.slots.get_mut(self.cursor) {
            *slot = FilterRecord::sentinel();
        }
    }

    /// Reset every slot to the terminator
    pub fn clear(&mut self) {
        self.slots.fill(FilterRecord::sentinel());
        self.cursor = 0;
    }

    /// Real records in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &FilterRecord> + '_ {
        self.slots.iter().take_while(|record| !record.is_sentinel())
    }

    pub fn contains_discard(&self) -> bool {
        self.iter().any(FilterRecord::is_discard)
    }

    pub fn contains_id(&self, id: FilterId) -> bool {
        self.iter().any(|record| record.id == id)
    }

    /// Action shared by every filter in the list, `None` when empty
    pub fn action(&self) -> Option<FilterAction> {
        self.iter().next().map(|record| record.action)
    }

    pub fn to_vec(&self) -> Vec<FilterRecord> {
        self.iter().copied().collect()
    }
}

impl Default for FilterBuffer {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}
