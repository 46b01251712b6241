use serde::Serialize;
use std::collections::HashMap;

use crate::filters::buffer::FilterBuffer;
use crate::filters::commit::{CommitController, CommitError, CommitMonitor, CommitReport};
use crate::filters::editor::{EditError, FilterEditor};
use crate::filters::format::render_list;
use crate::filters::store::ActiveSource;
use crate::models::filter::{FilterId, FilterRecord};

/// One filter list as shown to the operator
#[derive(Debug, Clone, Serialize)]
pub struct ListView {
    pub records: Vec<FilterRecord>,

    /// Text rendering of the records
    pub text: String,
}

impl From<&FilterBuffer> for ListView {
    fn from(list: &FilterBuffer) -> Self {
        Self {
            records: list.to_vec(),
            text: render_list(list),
        }
    }
}

/// Both filter lists and the editor state
#[derive(Debug, Clone, Serialize)]
pub struct FilterSnapshot {
    pub active: ListView,
    pub active_source: ActiveSource,
    pub pending: ListView,
    pub next_id: FilterId,
    pub max_filters: usize,

    /// What the filtering engine currently applies
    pub program: Option<String>,
}

/// Owns the filter lists and the commit controller.
///
/// The API keeps exactly one of these behind a mutex, which makes every
/// editor and commit operation run alone.
pub struct FilterManager {
    editor: FilterEditor,
    controller: CommitController,
}

impl FilterManager {
    pub fn new(editor: FilterEditor, controller: CommitController) -> Self {
        Self { editor, controller }
    }

    /// Apply the active list (the factory defaults at boot) and associate
    pub fn start(&mut self) -> Result<(), CommitError> {
        self.controller.start(self.editor.store().get_active())
    }

    pub fn add(&mut self, fields: &HashMap<String, String>) -> Result<FilterId, EditError> {
        self.editor.add(fields)
    }

    pub fn remove_last(&mut self) -> Result<FilterRecord, EditError> {
        self.editor.remove_last()
    }

    pub fn import_factory_defaults(&mut self) -> usize {
        self.editor.import_factory_defaults()
    }

    /// Commit the pending list, or the factory defaults when `restore` is set
    pub fn commit(&mut self, restore: bool) -> Result<CommitReport, CommitError> {
        self.controller.commit(self.editor.store_mut(), restore)
    }

    pub fn snapshot(&self) -> FilterSnapshot {
        let store = self.editor.store();
        FilterSnapshot {
            active: store.get_active().into(),
            active_source: store.active_source(),
            pending: store.pending().into(),
            next_id: self.editor.next_id(),
            max_filters: store.pending().max_filters(),
            program: self.controller.engine().program(),
        }
    }

    pub fn monitor(&self) -> CommitMonitor {
        self.controller.monitor()
    }
}
