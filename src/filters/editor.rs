use log::{debug, info, warn};
use std::collections::HashMap;
use thiserror::Error;

use crate::filters::buffer::BufferError;
use crate::filters::fields::{FieldError, FilterCandidate};
use crate::filters::store::DoubleBufferStore;
use crate::filters::validator::{self, RejectReason};
use crate::models::filter::{FilterId, FilterRecord};

/// Errors returned by editor operations; none of them change the pending list
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Rejected(#[from] RejectReason),

    #[error(transparent)]
    Buffer(#[from] BufferError),
}

/// Edits the pending filter list and hands out filter ids
#[derive(Debug)]
pub struct FilterEditor {
    store: DoubleBufferStore,
    next_id: FilterId,
}

impl FilterEditor {
    pub fn new(store: DoubleBufferStore) -> Self {
        Self { store, next_id: 0 }
    }

    /// Parse posted form fields and add the filter they describe
    pub fn add(&mut self, fields: &HashMap<String, String>) -> Result<FilterId, EditError> {
        let candidate = FilterCandidate::from_fields(fields).map_err(|e| {
            warn!("Rejected filter form: {}", e);
            e
        })?;
        self.add_candidate(&candidate)
    }

    /// Validate a candidate and append it to the pending list
    pub fn add_candidate(&mut self, candidate: &FilterCandidate) -> Result<FilterId, EditError> {
        let pending = self.store.pending();
        if pending.is_full() {
            warn!("Max number of entries {} reached", pending.max_filters());
            return Err(BufferError::Full.into());
        }

        if let Err(reason) = validator::validate(candidate, pending) {
            warn!("Filter rejected: {}", reason);
            return Err(reason.into());
        }
        let filter = validator::resolve(candidate)?;

        let id = self.free_id();
        let record = FilterRecord::new(id, candidate.action, filter);
        self.store.get_pending().append(record)?;
        self.next_id = id.wrapping_add(1);

        info!("Added {:?} filter {} to pending list: {:?}", record.kind(), id, record.filter);
        Ok(id)
    }

    /// Drop the most recently added pending filter
    pub fn remove_last(&mut self) -> Result<FilterRecord, EditError> {
        let removed = self.store.get_pending().remove_last()?;
        self.next_id = self.next_id.saturating_sub(1);
        info!("Removed filter {} from pending list", removed.id);
        Ok(removed)
    }

    /// Replace the pending list with the factory defaults
    pub fn import_factory_defaults(&mut self) -> usize {
        self.next_id = self.store.import_factory_defaults();
        let count = self.store.pending().len();
        info!(
            "Imported {} factory default filters, next id {}",
            count, self.next_id
        );
        count
    }

    pub fn next_id(&self) -> FilterId {
        self.next_id
    }

    pub fn store(&self) -> &DoubleBufferStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut DoubleBufferStore {
        &mut self.store
    }

    // Skip ids still present in the pending list, e.g. after an import.
    // Ids wrap past 255; a list never holds every id, so one is always free.
    fn free_id(&self) -> FilterId {
        let pending = self.store.pending();
        let mut id = self.next_id;
        for _ in 0..=FilterId::MAX {
            if !pending.contains_id(id) {
                break;
            }
            debug!("Filter id {} already in pending list", id);
            id = id.wrapping_add(1);
        }
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::buffer::DEFAULT_CAPACITY;
    use crate::filters::defaults::board_defaults;
    use crate::filters::fields::CandidateMatch;
    use crate::models::filter::{FilterAction, PortDirection, Transport};

    fn editor() -> FilterEditor {
        let defaults = board_defaults(DEFAULT_CAPACITY).unwrap();
        FilterEditor::new(DoubleBufferStore::new(DEFAULT_CAPACITY, defaults))
    }

    fn port(action: FilterAction, port: u32) -> FilterCandidate {
        FilterCandidate::new(
            action,
            CandidateMatch::Port {
                port,
                direction: PortDirection::Destination,
                transport: Transport::Tcp,
            },
        )
    }

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn add_assigns_sequential_ids() {
        let mut editor = editor();
        assert_eq!(editor.add_candidate(&port(FilterAction::Keep, 80)), Ok(0));
        assert_eq!(editor.add_candidate(&port(FilterAction::Keep, 443)), Ok(1));
        assert_eq!(editor.next_id(), 2);
    }

    #[test]
    fn every_port_is_accepted_once() {
        for value in [0, 1, 80, 8080, 65535] {
            let mut editor = editor();
            assert!(editor.add_candidate(&port(FilterAction::Keep, value)).is_ok());
            assert!(matches!(
                editor.add_candidate(&port(FilterAction::Keep, value)),
                Err(EditError::Rejected(RejectReason::Duplicate { .. }))
            ));
        }
    }

    #[test]
    fn rejection_leaves_state_untouched() {
        let mut editor = editor();
        editor.add_candidate(&port(FilterAction::Keep, 80)).unwrap();
        let before = editor.store().pending().clone();

        let result = editor.add_candidate(&port(FilterAction::Discard, 81));

        assert_eq!(result, Err(EditError::Rejected(RejectReason::ActionMismatch)));
        assert_eq!(editor.store().pending(), &before);
        assert_eq!(editor.next_id(), 1);
    }

    #[test]
    fn discard_locks_further_adds() {
        let mut editor = editor();
        editor.add_candidate(&port(FilterAction::Discard, 23)).unwrap();

        for action in [FilterAction::Keep, FilterAction::Discard] {
            assert_eq!(
                editor.add_candidate(&port(action, 24)),
                Err(EditError::Rejected(RejectReason::DiscardListLocked))
            );
        }
    }

    #[test]
    fn eleventh_filter_does_not_fit() {
        let mut editor = editor();
        for value in 1..=10 {
            editor.add_candidate(&port(FilterAction::Keep, value)).unwrap();
        }
        assert_eq!(
            editor.add_candidate(&port(FilterAction::Keep, 11)),
            Err(EditError::Buffer(BufferError::Full))
        );
        assert_eq!(editor.store().pending().len(), 10);
    }

    #[test]
    fn remove_last_removes_latest_and_decrements_id() {
        let mut editor = editor();
        editor.add_candidate(&port(FilterAction::Keep, 80)).unwrap();
        editor.add_candidate(&port(FilterAction::Keep, 443)).unwrap();

        let removed = editor.remove_last().unwrap();

        assert_eq!(removed.id, 1);
        assert_eq!(editor.next_id(), 1);
        assert_eq!(editor.store().pending().len(), 1);
        assert_eq!(editor.store().pending().to_vec()[0].id, 0);
    }

    #[test]
    fn remove_last_on_empty_list() {
        let mut editor = editor();
        assert_eq!(
            editor.remove_last(),
            Err(EditError::Buffer(BufferError::Empty))
        );
        assert_eq!(editor.next_id(), 0);
        assert!(editor.store().pending().is_empty());
    }

    #[test]
    fn add_after_import_gets_higher_id() {
        let mut editor = editor();
        assert_eq!(editor.import_factory_defaults(), 5);

        let id = editor.add_candidate(&port(FilterAction::Keep, 8080)).unwrap();

        let highest = editor
            .store()
            .factory_defaults()
            .iter()
            .map(|record| record.id)
            .max()
            .unwrap();
        assert!(id > highest);
    }

    #[test]
    fn id_skips_values_already_in_list() {
        let mut editor = editor();
        editor.import_factory_defaults();
        // rewind the counter below the imported ids
        editor.remove_last().unwrap();
        editor.remove_last().unwrap();
        assert_eq!(editor.next_id(), 3);
        editor.next_id = 1;

        let id = editor.add_candidate(&port(FilterAction::Keep, 9000)).unwrap();
        assert_eq!(id, 3);
    }

    #[test]
    fn ids_wrap_after_255() {
        let mut editor = editor();
        editor.next_id = 254;

        assert_eq!(editor.add_candidate(&port(FilterAction::Keep, 1)), Ok(254));
        assert_eq!(editor.add_candidate(&port(FilterAction::Keep, 2)), Ok(255));
        assert_eq!(editor.add_candidate(&port(FilterAction::Keep, 3)), Ok(0));
        assert_eq!(editor.next_id(), 1);
    }

    #[test]
    fn wrapped_ids_skip_imported_ones() {
        let mut editor = editor();
        editor.import_factory_defaults();
        editor.next_id = FilterId::MAX;

        let first = editor.add_candidate(&port(FilterAction::Keep, 8080)).unwrap();
        let second = editor.add_candidate(&port(FilterAction::Keep, 8081)).unwrap();

        assert_eq!((first, second), (255, 5));
        let ids: Vec<_> = editor.store().pending().iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4, 255, 5]);
    }

    #[test]
    fn ids_stay_unique_across_many_commits() {
        let mut editor = editor();
        for round in 0..30u32 {
            let mut ids = Vec::new();
            for value in 0..10 {
                ids.push(editor.add_candidate(&port(FilterAction::Keep, round * 10 + value)).unwrap());
            }
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), 10);
            editor.store_mut().swap_pending_to_active();
        }
    }

    #[test]
    fn oversized_form_value_is_out_of_range() {
        let mut editor = editor();
        let err = editor
            .add(&form(&[("filter_type", "ET"), ("action", "K"), ("ether_type", "0x100000000")]))
            .unwrap_err();
        assert!(matches!(
            err,
            EditError::Rejected(RejectReason::OutOfRange { value: u32::MAX, .. })
        ));

        let err = editor
            .add(&form(&[
                ("filter_type", "PF"),
                ("action", "K"),
                ("protocol", "U"),
                ("direction", "SP"),
                ("port_number", "99999999999"),
            ]))
            .unwrap_err();
        assert!(matches!(
            err,
            EditError::Rejected(RejectReason::OutOfRange { field: "port", .. })
        ));
        assert!(editor.store().pending().is_empty());
    }

    #[test]
    fn add_parses_form_fields() {
        let mut editor = editor();
        let id = editor
            .add(&form(&[("filter_type", "IT"), ("action", "K"), ("ip_proto", "0x06")]))
            .unwrap();
        assert_eq!(id, 0);

        let err = editor
            .add(&form(&[("filter_type", "IT"), ("action", "K"), ("ip_proto", "zz")]))
            .unwrap_err();
        assert!(matches!(err, EditError::Field(FieldError::Invalid { .. })));
        assert_eq!(editor.next_id(), 1);
    }
}
