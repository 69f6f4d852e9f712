//! In-memory store implementations.
//!
//! Used by the test suite and small single-process deployments. Both stores
//! keep their maps behind a `tokio` RwLock; `put`'s uniqueness check runs
//! inside one write-lock critical section, which gives the same atomicity
//! the PostgreSQL primary key provides.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::credential::CredentialRecord;
use crate::models::session::Session;
use crate::store::{CredentialStore, SessionStore};

/// An in-memory credential store.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    records: Arc<RwLock<HashMap<String, CredentialRecord>>>,
}

impl MemoryCredentialStore {
    /// Creates an empty `MemoryCredentialStore`.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn put(&self, record: &CredentialRecord) -> Result<()> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.identity_token) {
            return Err(AppError::DuplicateIdentity);
        }
        records.insert(record.identity_token.clone(), record.clone());
        Ok(())
    }

    async fn get_by_token(&self, identity_token: &str) -> Result<Option<CredentialRecord>> {
        let records = self.records.read().await;
        Ok(records.get(identity_token).cloned())
    }
}

/// An in-memory session store.
///
/// The storage-level ttl is ignored; expiry is enforced by the session
/// manager against the session's own `expires_at`.
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Session>>>,
}

impl MemorySessionStore {
    /// Creates an empty `MemorySessionStore`.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn put(&self, token: Uuid, session: &Session, _ttl: Duration) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(token, session.clone());
        Ok(())
    }

    async fn get(&self, token: Uuid) -> Result<Option<Session>> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(&token).cloned())
    }

    async fn delete(&self, token: Uuid) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(&token);
        Ok(())
    }
}
