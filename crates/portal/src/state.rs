//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::PortalConfig;
use crate::gateway::IdentityGateway;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the configuration and the identity gateway.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    gateway: Arc<dyn IdentityGateway>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Portal configuration
    /// * `gateway` - Identity gateway (hosted client, or in-memory in tests)
    #[must_use]
    pub fn new(config: PortalConfig, gateway: Arc<dyn IdentityGateway>) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, gateway }),
        }
    }

    /// Get a reference to the portal configuration.
    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    /// Get a reference to the identity gateway.
    #[must_use]
    pub fn gateway(&self) -> &dyn IdentityGateway {
        self.inner.gateway.as_ref()
    }
}
