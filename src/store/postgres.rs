//! PostgreSQL-backed credential store.
//!
//! Expects the following table, with the identity token as primary key:
//!
//! ```sql
//! CREATE TABLE credentials (
//!     identity_token      TEXT PRIMARY KEY,
//!     password_verifier   TEXT NOT NULL,
//!     salt                BYTEA NOT NULL,
//!     envelope_iv         BYTEA NOT NULL,
//!     envelope_ciphertext BYTEA NOT NULL,
//!     created_at          TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use async_trait::async_trait;
use deadpool_postgres::Pool;
use tokio_postgres::Row;

use crate::error::{AppError, Result};
use crate::models::credential::{CredentialRecord, Envelope};
use crate::store::CredentialStore;

/// A credential store backed by a PostgreSQL pool.
#[derive(Clone)]
pub struct PostgresCredentialStore {
    pool: Pool,
}

impl PostgresCredentialStore {
    /// Creates a new `PostgresCredentialStore`.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

/// A helper function to map a `tokio_postgres::Row` to a `CredentialRecord`.
fn row_to_record(row: &Row) -> Result<CredentialRecord> {
    Ok(CredentialRecord {
        identity_token: row
            .try_get("identity_token")
            .map_err(|e| AppError::Internal(format!("credentials row: {}", e)))?,
        password_verifier: row
            .try_get("password_verifier")
            .map_err(|e| AppError::Internal(format!("credentials row: {}", e)))?,
        salt: row
            .try_get("salt")
            .map_err(|e| AppError::Internal(format!("credentials row: {}", e)))?,
        envelope: Envelope {
            iv: row
                .try_get("envelope_iv")
                .map_err(|e| AppError::Internal(format!("credentials row: {}", e)))?,
            ciphertext: row
                .try_get("envelope_ciphertext")
                .map_err(|e| AppError::Internal(format!("credentials row: {}", e)))?,
        },
    })
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn put(&self, record: &CredentialRecord) -> Result<()> {
        let client = self.pool.get().await?;

        // ON CONFLICT DO NOTHING on the primary key makes the uniqueness
        // check and the insert one atomic statement; an affected-row count
        // of zero means the identity was already provisioned.
        let rows = client
            .execute(
                r#"
                INSERT INTO credentials
                    (identity_token, password_verifier, salt, envelope_iv, envelope_ciphertext)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (identity_token) DO NOTHING
                "#,
                &[
                    &record.identity_token,
                    &record.password_verifier,
                    &record.salt,
                    &record.envelope.iv,
                    &record.envelope.ciphertext,
                ],
            )
            .await?;

        if rows == 0 {
            return Err(AppError::DuplicateIdentity);
        }

        Ok(())
    }

    async fn get_by_token(&self, identity_token: &str) -> Result<Option<CredentialRecord>> {
        // Idempotent read, the one class of operation eligible for a retry
        // on a transient store failure.
        let mut last_err: Option<AppError> = None;

        for attempt in 0..2 {
            let fetched = async {
                let client = self.pool.get().await?;
                let row = client
                    .query_opt(
                        r#"
                        SELECT identity_token, password_verifier, salt,
                               envelope_iv, envelope_ciphertext
                        FROM credentials
                        WHERE identity_token = $1
                        "#,
                        &[&identity_token],
                    )
                    .await?;
                row.map(|r| row_to_record(&r)).transpose()
            }
            .await;

            match fetched {
                Ok(record) => return Ok(record),
                Err(e @ AppError::StoreUnavailable(_)) => {
                    tracing::warn!("Credential lookup attempt {} failed: {}", attempt + 1, e);
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| {
            AppError::StoreUnavailable("credential lookup failed".to_string())
        }))
    }
}
