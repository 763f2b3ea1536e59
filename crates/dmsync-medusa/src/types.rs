//! Medusa admin API response types.
//!
//! Only the fields this service reads are modelled; everything else in the
//! (large) product object is ignored by serde.

use serde::{Deserialize, Serialize};

/// Response from `GET /admin/products`.
#[derive(Debug, Deserialize)]
pub struct ProductsPage {
    pub products: Vec<CommerceProduct>,
    /// Total number of products matching the query, across all pages.
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
}

/// A product as seen by the admin API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommerceProduct {
    /// Medusa product id, e.g. `"prod_01HV..."`.
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub handle: Option<String>,
    /// `"draft"`, `"proposed"`, `"published"` or `"rejected"`.
    #[serde(default)]
    pub status: Option<String>,
}

/// Response from `POST /admin/products` and `PUT /admin/products/{id}`.
#[derive(Debug, Deserialize)]
pub struct ProductEnvelope {
    pub product: CommerceProduct,
}

/// Response from `DELETE /admin/products/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeleteResponse {
    pub id: String,
    #[serde(default)]
    pub object: Option<String>,
    #[serde(default)]
    pub deleted: bool,
}
