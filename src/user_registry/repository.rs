//! User registry repository - database operations
//!
//! Expects the `principals` table with a unique key on `username` and a
//! unique key on `asset_id` (one device account per asset).

use super::types::{NewPrincipal, Principal, PrincipalKind};
use crate::error::{Error, Result};
use sqlx::MySqlPool;
use uuid::Uuid;

/// Durable principal storage.
#[async_trait::async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>>;
    async fn find_by_asset(&self, asset_id: i64) -> Result<Option<Principal>>;
    /// Insert a new principal. A unique-key collision surfaces as
    /// [`Error::Database`]; callers re-read for idempotency.
    async fn insert(&self, new: NewPrincipal) -> Result<Principal>;
}

#[derive(Debug, sqlx::FromRow)]
struct PrincipalRow {
    pub id: i64,
    pub external_id: String,
    pub username: String,
    pub full_name: String,
    pub kind: PrincipalKind,
    pub verified: bool,
    pub asset_id: Option<i64>,
}

impl From<PrincipalRow> for Principal {
    fn from(r: PrincipalRow) -> Self {
        Principal {
            id: r.id,
            external_id: r.external_id,
            username: r.username,
            full_name: r.full_name,
            kind: r.kind,
            verified: r.verified,
            asset_id: r.asset_id,
        }
    }
}

/// MySQL-backed principal store
#[derive(Clone)]
pub struct SqlPrincipalStore {
    pool: MySqlPool,
}

impl SqlPrincipalStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str =
    "id, external_id, username, full_name, kind, verified, asset_id";

#[async_trait::async_trait]
impl PrincipalStore for SqlPrincipalStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<Principal>> {
        let row: Option<PrincipalRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM principals WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.map(Principal::from))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Principal>> {
        let row: Option<PrincipalRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM principals WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.map(Principal::from))
    }

    async fn find_by_asset(&self, asset_id: i64) -> Result<Option<Principal>> {
        let row: Option<PrincipalRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM principals WHERE asset_id = ?"
        ))
        .bind(asset_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.map(Principal::from))
    }

    async fn insert(&self, new: NewPrincipal) -> Result<Principal> {
        let external_id = Uuid::new_v4().to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO principals
                (external_id, username, full_name, kind, verified, password_hash, asset_id)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&external_id)
        .bind(&new.username)
        .bind(&new.full_name)
        .bind(new.kind)
        .bind(new.verified)
        .bind(&new.password_hash)
        .bind(new.asset_id)
        .execute(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(Principal {
            id: result.last_insert_id() as i64,
            external_id,
            username: new.username,
            full_name: new.full_name,
            kind: new.kind,
            verified: new.verified,
            asset_id: new.asset_id,
        })
    }
}
