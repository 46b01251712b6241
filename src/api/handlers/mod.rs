pub mod commit;
pub mod filters;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::filters::manager::FilterManager;

/// The single filter manager, one request at a time
pub type SharedManager = Arc<Mutex<FilterManager>>;

#[cfg(test)]
pub(crate) mod tests {
    use actix_web::web;

    use super::*;
    use crate::filters::commit::CommitMonitor;
    use crate::filters::manager::tests::manager;

    /// App data over a manager with recording link and engine
    pub(crate) fn state() -> (web::Data<SharedManager>, web::Data<CommitMonitor>) {
        let manager = manager();
        let monitor = manager.monitor();
        (
            web::Data::new(Arc::new(Mutex::new(manager))),
            web::Data::new(monitor),
        )
    }
}
