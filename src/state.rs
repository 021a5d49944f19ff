use std::sync::Arc;
use std::time::{Instant, SystemTime};

use crate::backend::hosted::HostedBackend;
use crate::backend::memory::InMemoryBackend;
use crate::backend::{AuthService, BackendError, WordStore};
use crate::config::{BackendMode, Config};
use crate::cookies::CookieOptions;
use crate::session::AuthContext;

#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    started_at_system: SystemTime,
    config: Arc<Config>,
    auth: Arc<AuthContext>,
    store: Arc<dyn WordStore>,
}

impl AppState {
    pub fn new(config: Config, auth: Arc<dyn AuthService>, store: Arc<dyn WordStore>) -> Self {
        let auth = Arc::new(AuthContext::new(auth, config.session_idle_ttl));
        Self {
            started_at: Instant::now(),
            started_at_system: SystemTime::now(),
            config: Arc::new(config),
            auth,
            store,
        }
    }

    /// Wires the backend selected by `config.backend_mode`.
    pub fn from_config(config: Config) -> Result<Self, BackendError> {
        match (config.backend_mode, config.hosted.clone()) {
            (BackendMode::Hosted, Some(hosted)) => {
                let backend = Arc::new(HostedBackend::new(hosted)?);
                Ok(Self::new(config, backend.clone(), backend))
            }
            (BackendMode::Hosted, None) => Err(BackendError::NotConfigured("SUPABASE_URL")),
            (BackendMode::Memory, _) => {
                tracing::warn!("using in-memory backend; data is lost on restart");
                let backend = Arc::new(InMemoryBackend::new());
                Ok(Self::new(config, backend.clone(), backend))
            }
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn started_at_system(&self) -> SystemTime {
        self.started_at_system
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn auth(&self) -> Arc<AuthContext> {
        Arc::clone(&self.auth)
    }

    pub fn store(&self) -> Arc<dyn WordStore> {
        Arc::clone(&self.store)
    }

    pub fn cookie_options(&self) -> CookieOptions {
        CookieOptions {
            secure: self.config.secure_cookies,
        }
    }
}
