use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use redis::aio::ConnectionManager;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::Result;
use crate::services::session::SessionManager;
use crate::store::memory::MemorySessionStore;
use crate::store::postgres::PostgresCredentialStore;
use crate::store::redis::RedisSessionStore;
use crate::store::{CredentialStore, SessionStore};

/// Failed-login attempts allowed per identity inside one window.
pub const MAX_FAILED_LOGINS: u32 = 5;
/// The failed-login counting window.
pub const FAILED_LOGIN_WINDOW: Duration = Duration::from_secs(900);

struct FailureWindow {
    count: u32,
    started: Instant,
}

/// Tracks failed login attempts per identity token.
#[derive(Clone)]
pub struct LoginThrottle {
    attempts: Arc<RwLock<HashMap<String, FailureWindow>>>,
}

impl LoginThrottle {
    /// Creates a new `LoginThrottle`.
    pub fn new() -> Self {
        Self {
            attempts: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Returns `true` while the identity is under the failure limit.
    pub async fn allow(&self, key: &str) -> bool {
        let attempts = self.attempts.read().await;
        match attempts.get(key) {
            Some(window) if window.started.elapsed() < FAILED_LOGIN_WINDOW => {
                window.count < MAX_FAILED_LOGINS
            }
            _ => true,
        }
    }

    /// Counts one failed attempt against the identity.
    pub async fn record_failure(&self, key: &str) {
        let mut attempts = self.attempts.write().await;
        let entry = attempts.entry(key.to_string()).or_insert(FailureWindow {
            count: 0,
            started: Instant::now(),
        });

        if entry.started.elapsed() >= FAILED_LOGIN_WINDOW {
            entry.count = 0;
            entry.started = Instant::now();
        }
        entry.count += 1;
    }

    /// Clears the failure count after a successful login.
    pub async fn clear(&self, key: &str) {
        let mut attempts = self.attempts.write().await;
        attempts.remove(key);
    }
}

impl Default for LoginThrottle {
    fn default() -> Self {
        Self::new()
    }
}

/// The application's state.
#[derive(Clone)]
pub struct AppState {
    /// The credential store.
    pub credentials: Arc<dyn CredentialStore>,
    /// The session manager.
    pub sessions: SessionManager,
    /// The failed-login throttle.
    pub throttle: LoginThrottle,
    /// The application's configuration.
    pub config: Config,
}

impl AppState {
    /// Creates the production `AppState`: PostgreSQL-backed credentials and
    /// Redis-backed sessions.
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = crate::db::create_pool(&config.database_url)?;
        tracing::info!("✅ PostgreSQL pool initialized with deadpool-postgres");

        let redis_client = redis::Client::open(config.redis_url.as_str())?;
        let redis = ConnectionManager::new(redis_client).await?;
        tracing::info!("✅ Redis connection manager initialized (pooled)");

        Ok(Self::with_stores(
            Arc::new(PostgresCredentialStore::new(pool)),
            Arc::new(RedisSessionStore::new(redis)),
            config.clone(),
        ))
    }

    /// Creates an `AppState` over explicit store implementations.
    pub fn with_stores(
        credentials: Arc<dyn CredentialStore>,
        session_store: Arc<dyn SessionStore>,
        config: Config,
    ) -> Self {
        let sessions = SessionManager::new(session_store, config.session_ttl_minutes);
        AppState {
            credentials,
            sessions,
            throttle: LoginThrottle::new(),
            config,
        }
    }

    /// Creates an `AppState` held entirely in memory.
    pub fn in_memory(config: Config) -> Self {
        Self::with_stores(
            Arc::new(crate::store::memory::MemoryCredentialStore::new()),
            Arc::new(MemorySessionStore::new()),
            config,
        )
    }
}
