//! Storage for CMS key → commerce product id links.
//!
//! Postgres when `DATABASE_URL` is configured; otherwise an in-process map
//! that lives as long as the process does.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::error::SyncError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductLink {
    pub cms_key: String,
    pub commerce_product_id: String,
    pub title: String,
}

impl From<dmsync_db::ProductLinkRow> for ProductLink {
    fn from(row: dmsync_db::ProductLinkRow) -> Self {
        Self {
            cms_key: row.cms_key,
            commerce_product_id: row.commerce_product_id,
            title: row.title,
        }
    }
}

#[derive(Clone)]
pub enum LinkStore {
    Postgres(PgPool),
    Memory(Arc<Mutex<HashMap<String, ProductLink>>>),
}

impl std::fmt::Debug for LinkStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Postgres(_) => f.write_str("LinkStore::Postgres"),
            Self::Memory(_) => f.write_str("LinkStore::Memory"),
        }
    }
}

impl LinkStore {
    #[must_use]
    pub fn memory() -> Self {
        Self::Memory(Arc::new(Mutex::new(HashMap::new())))
    }

    /// Connects to Postgres and applies pending migrations when the config
    /// has a database URL; falls back to [`LinkStore::memory`] otherwise.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the pool cannot be opened or a
    /// migration fails.
    pub async fn from_config(config: &dmsync_core::AppConfig) -> Result<Self, SyncError> {
        if config.database_url.is_none() {
            tracing::warn!(
                "DATABASE_URL not set; product links are kept in memory and lost on exit"
            );
            return Ok(Self::memory());
        }

        let pool = dmsync_db::connect_pool_from_config(config).await?;
        let applied = dmsync_db::run_migrations(&pool)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;
        if applied > 0 {
            tracing::info!(applied, "applied database migrations");
        }
        Ok(Self::Postgres(pool))
    }

    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Postgres(_))
    }

    /// Checks the backing database is reachable. Always succeeds in memory.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if `SELECT 1` fails.
    pub async fn ping(&self) -> Result<(), SyncError> {
        match self {
            Self::Postgres(pool) => Ok(dmsync_db::ping(pool).await?),
            Self::Memory(_) => Ok(()),
        }
    }

    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the lookup fails.
    pub async fn find(&self, cms_key: &str) -> Result<Option<ProductLink>, SyncError> {
        match self {
            Self::Postgres(pool) => Ok(dmsync_db::get_product_link(pool, cms_key)
                .await?
                .map(ProductLink::from)),
            Self::Memory(map) => Ok(map.lock().await.get(cms_key).cloned()),
        }
    }

    /// All links, ordered by CMS key.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the query fails.
    pub async fn list(&self) -> Result<Vec<ProductLink>, SyncError> {
        match self {
            Self::Postgres(pool) => Ok(dmsync_db::list_product_links(pool)
                .await?
                .into_iter()
                .map(ProductLink::from)
                .collect()),
            Self::Memory(map) => {
                let mut links: Vec<ProductLink> = map.lock().await.values().cloned().collect();
                links.sort_by(|a, b| a.cms_key.cmp(&b.cms_key));
                Ok(links)
            }
        }
    }

    /// Inserts or replaces the link for `link.cms_key`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the commerce product is already linked
    /// to a different CMS key, or the write fails.
    pub async fn upsert(&self, link: &ProductLink) -> Result<(), SyncError> {
        match self {
            Self::Postgres(pool) => {
                dmsync_db::upsert_product_link(
                    pool,
                    &link.cms_key,
                    &link.commerce_product_id,
                    &link.title,
                )
                .await?;
                Ok(())
            }
            Self::Memory(map) => {
                let mut map = map.lock().await;
                if let Some(other) = map.values().find(|existing| {
                    existing.commerce_product_id == link.commerce_product_id
                        && existing.cms_key != link.cms_key
                }) {
                    return Err(SyncError::Store(format!(
                        "commerce product {} is already linked to CMS key {}",
                        link.commerce_product_id, other.cms_key
                    )));
                }
                map.insert(link.cms_key.clone(), link.clone());
                Ok(())
            }
        }
    }

    /// Removes the link for `cms_key`; returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Store`] if the delete fails.
    pub async fn remove(&self, cms_key: &str) -> Result<bool, SyncError> {
        match self {
            Self::Postgres(pool) => Ok(dmsync_db::delete_product_link(pool, cms_key).await?),
            Self::Memory(map) => Ok(map.lock().await.remove(cms_key).is_some()),
        }
    }
}
