//! Application state and dependency injection.

use std::time::Instant;

use docqa_rig::RagService;
use jiff::Timestamp;

use super::{ServiceConfig, SessionStore};

/// Process start time.
#[derive(Debug, Clone, Copy)]
pub struct Uptime {
    started_at: Timestamp,
    started: Instant,
}

impl Uptime {
    /// Starts counting now.
    pub fn now() -> Self {
        Self {
            started_at: Timestamp::now(),
            started: Instant::now(),
        }
    }

    /// Wall-clock start time.
    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Whole seconds since start.
    pub fn elapsed_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    rag: RagService,
    sessions: SessionStore,
    uptime: Uptime,
}

impl ServiceState {
    /// Creates the state around an initialized [`RagService`].
    pub fn new(config: &ServiceConfig, rag: RagService) -> Self {
        Self {
            rag,
            sessions: SessionStore::new(config.session_ttl()),
            uptime: Uptime::now(),
        }
    }

    /// Returns the pipeline service.
    pub fn rag(&self) -> &RagService {
        &self.rag
    }

    /// Returns the session store.
    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(rag: RagService);
impl_di!(sessions: SessionStore);
impl_di!(uptime: Uptime);
