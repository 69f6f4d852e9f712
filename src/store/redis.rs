//! Redis-backed session store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::session::Session;
use crate::store::SessionStore;

/// A session store backed by a Redis connection manager.
///
/// Sessions live under `session:{token}` keys with a ttl matching the
/// session's own expiry, so Redis reclaims stale entries on its own.
#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
}

impl RedisSessionStore {
    /// Creates a new `RedisSessionStore`.
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    fn key(token: Uuid) -> String {
        format!("session:{}", token)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put(&self, token: Uuid, session: &Session, ttl: Duration) -> Result<()> {
        let session_json = sonic_rs::to_string(session)
            .map_err(|e| AppError::Internal(format!("Session serialization failed: {}", e)))?;

        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(Self::key(token), session_json, ttl.as_secs())
            .await?;

        Ok(())
    }

    async fn get(&self, token: Uuid) -> Result<Option<Session>> {
        let mut conn = self.conn.clone();
        let session_json: Option<String> = conn.get(Self::key(token)).await?;

        match session_json {
            Some(json) => {
                let session: Session = sonic_rs::from_str(&json).map_err(|e| {
                    AppError::Internal(format!("Invalid session JSON: {}", e))
                })?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, token: Uuid) -> Result<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(Self::key(token)).await?;
        Ok(())
    }
}
