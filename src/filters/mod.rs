//! Filter lists: editing the pending list, validation and the commit protocol
//! that hands a new list to the filtering engine.

pub mod buffer;
pub mod commit;
pub mod defaults;
pub mod editor;
pub mod fields;
pub mod format;
pub mod manager;
pub mod store;
pub mod validator;
