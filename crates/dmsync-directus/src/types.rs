use serde::Deserialize;

/// Envelope of `GET /items/{collection}`.
#[derive(Debug, Deserialize)]
pub struct ItemsResponse<T> {
    pub data: Vec<T>,
    /// Present when the request asked for `meta=filter_count`.
    #[serde(default)]
    pub meta: Option<ItemsMeta>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemsMeta {
    /// Rows matching the query across all pages.
    #[serde(default)]
    pub filter_count: Option<u64>,
}

/// Envelope Directus uses for every error response.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorsResponse {
    #[serde(default)]
    pub errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorItem {
    pub message: String,
}
