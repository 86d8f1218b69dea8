use std::sync::Arc;

use crate::config::AppConfig;
use crate::store::Store;

/// Process-wide dependencies, built once in `main` and shared read-only by every request
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: AppConfig) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }
}
