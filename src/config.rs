use std::env;
use anyhow::{Context, Result};

/// The application's configuration.
///
/// There is deliberately no master key here: the server side of the
/// protocol never holds key material, only hashed identities, verifiers
/// and opaque envelopes.
#[derive(Clone)]
pub struct Config {
    /// The URL of the PostgreSQL database.
    pub database_url: String,
    /// The URL of the Redis server.
    pub redis_url: String,
    /// The lifetime of a session in minutes.
    pub session_ttl_minutes: i64,
}

impl Config {
    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let session_ttl_minutes: i64 = env::var("SESSION_TTL_MINUTES")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("Invalid SESSION_TTL_MINUTES")?;

        if session_ttl_minutes <= 0 {
            anyhow::bail!("SESSION_TTL_MINUTES must be positive");
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string()),
            session_ttl_minutes,
        })
    }
}
