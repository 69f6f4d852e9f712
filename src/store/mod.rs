//! Persistence boundaries for credential records and sessions.
//!
//! The core treats both stores as external collaborators with single-record
//! `get` / `put-if-absent` semantics; whether they are backed by PostgreSQL,
//! Redis or a map in memory is irrelevant to the protocol.

pub mod memory;
pub mod postgres;
pub mod redis;

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::credential::CredentialRecord;
use crate::models::session::Session;

/// Lookup-by-hashed-identity persistence for credential records.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Persists a record, failing with [`crate::error::AppError::DuplicateIdentity`]
    /// when a record with the same identity token already exists. The
    /// uniqueness check is atomic with the insert, even under concurrent
    /// provisioning of the same identity.
    async fn put(&self, record: &CredentialRecord) -> Result<()>;

    /// Fetches the record for an identity token. Exact-match lookup only;
    /// the token is a hash, so partial matching is meaningless.
    async fn get_by_token(&self, identity_token: &str) -> Result<Option<CredentialRecord>>;
}

/// Token-keyed storage of active sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores a session under a token, with a storage-level ttl where the
    /// backend supports one.
    async fn put(&self, token: Uuid, session: &Session, ttl: Duration) -> Result<()>;

    /// Fetches the session for a token, if any.
    async fn get(&self, token: Uuid) -> Result<Option<Session>>;

    /// Removes the session for a token. Removing an absent token is not an
    /// error.
    async fn delete(&self, token: Uuid) -> Result<()>;
}
