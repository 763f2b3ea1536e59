//! Database operations for `product_links`, the CMS key → commerce product
//! id mapping.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `product_links` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ProductLinkRow {
    /// Directus primary key of the product row, stringified.
    pub cms_key: String,
    /// Medusa product id, e.g. `"prod_01HV..."`.
    pub commerce_product_id: String,
    /// Title last pushed to the commerce platform.
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Inserts or refreshes the link for `cms_key`.
///
/// Conflicts on `cms_key` replace `commerce_product_id` and `title`. A
/// commerce id already linked to a different key violates the unique
/// constraint and surfaces as [`DbError::Sqlx`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_product_link(
    pool: &PgPool,
    cms_key: &str,
    commerce_product_id: &str,
    title: &str,
) -> Result<ProductLinkRow, DbError> {
    let row = sqlx::query_as::<_, ProductLinkRow>(
        "INSERT INTO product_links (cms_key, commerce_product_id, title) \
         VALUES ($1, $2, $3) \
         ON CONFLICT (cms_key) DO UPDATE SET \
             commerce_product_id = EXCLUDED.commerce_product_id, \
             title               = EXCLUDED.title, \
             updated_at          = NOW() \
         RETURNING cms_key, commerce_product_id, title, created_at, updated_at",
    )
    .bind(cms_key)
    .bind(commerce_product_id)
    .bind(title)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Looks up the link for a CMS key.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_link(
    pool: &PgPool,
    cms_key: &str,
) -> Result<Option<ProductLinkRow>, DbError> {
    let row = sqlx::query_as::<_, ProductLinkRow>(
        "SELECT cms_key, commerce_product_id, title, created_at, updated_at \
         FROM product_links \
         WHERE cms_key = $1",
    )
    .bind(cms_key)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Returns every link ordered by `cms_key`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_links(pool: &PgPool) -> Result<Vec<ProductLinkRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductLinkRow>(
        "SELECT cms_key, commerce_product_id, title, created_at, updated_at \
         FROM product_links \
         ORDER BY cms_key",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Removes the link for `cms_key`. Returns `true` when a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_product_link(pool: &PgPool, cms_key: &str) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM product_links WHERE cms_key = $1")
        .bind(cms_key)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
