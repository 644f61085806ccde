//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::DispatchConfig;
use crate::services::DispatchService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DispatchConfig,
    pool: PgPool,
    dispatch: DispatchService,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Dispatch configuration
    /// * `pool` - `PostgreSQL` connection pool, used for readiness checks
    /// * `dispatch` - Dispatch service wired to its source and geocode cache
    #[must_use]
    pub fn new(config: DispatchConfig, pool: PgPool, dispatch: DispatchService) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                dispatch,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    #[must_use]
    pub fn dispatch(&self) -> &DispatchService {
        &self.inner.dispatch
    }
}
