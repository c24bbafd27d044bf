use std::sync::Arc;
use edapt_core::{Config, JobDispatcher, Publisher, SanitizedConfig, SessionStore};

/// Shared application state
pub struct AppState {
    config: Config,
    store: Arc<dyn SessionStore>,
    dispatcher: JobDispatcher,
    publisher: Arc<Publisher>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn SessionStore>,
        dispatcher: JobDispatcher,
        publisher: Arc<Publisher>,
    ) -> Self {
        Self {
            config,
            store,
            dispatcher,
            publisher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub fn dispatcher(&self) -> &JobDispatcher {
        &self.dispatcher
    }

    pub fn publisher(&self) -> &Publisher {
        self.publisher.as_ref()
    }
}
