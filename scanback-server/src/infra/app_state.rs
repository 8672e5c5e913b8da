use std::{fmt, sync::Arc};

use scanback_config::Config;
use scanback_core::ScanQueueHandle;

use crate::auth::CredentialGate;

/// Shared, read-only request context. Cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub gate: Arc<CredentialGate>,
    pub queue: ScanQueueHandle,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

impl AppState {
    pub fn new(config: Arc<Config>, queue: ScanQueueHandle) -> Self {
        let gate = Arc::new(CredentialGate::new(&config.auth));
        Self {
            config,
            gate,
            queue,
        }
    }
}
