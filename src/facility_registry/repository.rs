//! Facility registry repository - database operations
//!
//! Expects the `facilities` and `assets` tables; assets reference their
//! owning facility by id.

use super::types::{Asset, Facility};
use crate::error::{Error, Result};
use sqlx::MySqlPool;

/// Read access to facilities and assets.
#[async_trait::async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn facility_by_external_id(&self, external_id: &str) -> Result<Option<Facility>>;
    async fn asset_by_external_id(&self, external_id: &str) -> Result<Option<Asset>>;
}

#[derive(Debug, sqlx::FromRow)]
struct FacilityRow {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub middleware_address: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
struct AssetRow {
    pub id: i64,
    pub external_id: String,
    pub name: String,
    pub facility_id: i64,
}

/// MySQL-backed directory store
#[derive(Clone)]
pub struct SqlDirectoryStore {
    pool: MySqlPool,
}

impl SqlDirectoryStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl DirectoryStore for SqlDirectoryStore {
    async fn facility_by_external_id(&self, external_id: &str) -> Result<Option<Facility>> {
        let row: Option<FacilityRow> = sqlx::query_as(
            r#"
            SELECT id, external_id, name, middleware_address
            FROM facilities
            WHERE external_id = ?
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.map(|r| Facility {
            id: r.id,
            external_id: r.external_id,
            name: r.name,
            middleware_address: r.middleware_address,
        }))
    }

    async fn asset_by_external_id(&self, external_id: &str) -> Result<Option<Asset>> {
        let row: Option<AssetRow> = sqlx::query_as(
            r#"
            SELECT id, external_id, name, facility_id
            FROM assets
            WHERE external_id = ?
            "#,
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| Error::Database(e.to_string()))?;

        Ok(row.map(|r| Asset {
            id: r.id,
            external_id: r.external_id,
            name: r.name,
            facility_id: r.facility_id,
        }))
    }
}
