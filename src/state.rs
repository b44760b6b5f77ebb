use std::sync::Arc;

use crate::database::RecordStore;

/// Shared handler state. The store is PostgreSQL in the binary and the
/// in-memory store in tests.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &dyn RecordStore {
        self.store.as_ref()
    }
}
