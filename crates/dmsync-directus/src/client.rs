//! HTTP client for the Directus items API.
//!
//! Wraps `reqwest` with static-token auth, page-based pagination, and typed
//! errors. Only reads are implemented; this service never writes to the CMS.

use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

use dmsync_core::CmsProduct;

use crate::error::DirectusError;
use crate::retry::retry_with_backoff;
use crate::types::{ErrorsResponse, ItemsResponse};

/// Rows requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched for one collection. Guards against a server
/// that ignores the `page` parameter and keeps returning full pages.
const MAX_PAGES: u32 = 500;

/// Client for the Directus REST API.
///
/// Use [`DirectusClient::new`] with the instance URL from configuration; in
/// tests, point it at a wiremock server URI.
pub struct DirectusClient {
    client: Client,
    base_url: Url,
    token: String,
    page_size: u32,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl DirectusClient {
    /// Creates a client for the Directus instance at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectusError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`DirectusError::InvalidBaseUrl`] if
    /// `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str, token: &str, timeout_secs: u64) -> Result<Self, DirectusError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("dmsync/0.1 (directus-reader)")
            .build()?;

        let parsed = Url::parse(base_url).map_err(|e| DirectusError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(DirectusError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "expected an absolute http(s) URL".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            token: token.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Enables retries on transient read failures.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Overrides the page size (clamped to at least 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetches every product row of `collection`.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::list_all_items`].
    pub async fn list_products(&self, collection: &str) -> Result<Vec<CmsProduct>, DirectusError> {
        self.list_all_items(collection).await
    }

    /// Fetches every row of `collection`, following `page` until the
    /// reported `filter_count` is reached.
    ///
    /// Directus silently caps `limit` at its `QUERY_LIMIT_MAX`, so a page can be
    /// shorter than requested while rows remain. Only when the server omits
    /// `meta.filter_count` does a short page end the listing.
    ///
    /// All-or-nothing: a failure on any page discards earlier pages, since a
    /// partial listing would make the caller re-create products it already has.
    ///
    /// # Errors
    ///
    /// Propagates any error from [`Self::fetch_items_page`]; returns
    /// [`DirectusError::PaginationLimit`] past the page cap.
    pub async fn list_all_items<T: DeserializeOwned>(
        &self,
        collection: &str,
    ) -> Result<Vec<T>, DirectusError> {
        let mut items = Vec::new();

        for page in 1..=MAX_PAGES {
            let response: ItemsResponse<T> = self.fetch_items_page(collection, page).await?;
            let fetched = response.data.len() as u64;
            let total = response.meta.and_then(|m| m.filter_count);
            items.extend(response.data);

            tracing::debug!(collection, page, fetched, total = ?total, "fetched Directus page");

            if is_last_page(fetched, u64::from(self.page_size), items.len() as u64, total) {
                return Ok(items);
            }
        }

        Err(DirectusError::PaginationLimit {
            collection: collection.to_owned(),
            max_pages: MAX_PAGES,
        })
    }

    /// Fetches one page (1-based) of `collection`, retrying transient failures.
    ///
    /// # Errors
    ///
    /// - [`DirectusError::Status`] for non-2xx responses, carrying the first
    ///   Directus error message when the body has one.
    /// - [`DirectusError::Http`] on network failure.
    /// - [`DirectusError::Deserialize`] if the body does not match `{data: [...]}`.
    pub async fn fetch_items_page<T: DeserializeOwned>(
        &self,
        collection: &str,
        page: u32,
    ) -> Result<ItemsResponse<T>, DirectusError> {
        let url = self.items_url(collection, page)?;

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                let response = self
                    .client
                    .get(url.clone())
                    .bearer_auth(&self.token)
                    .send()
                    .await?;
                let status = response.status();
                let body = response.text().await?;

                if !status.is_success() {
                    return Err(DirectusError::Status {
                        status: status.as_u16(),
                        url: url.to_string(),
                        message: error_message(&body),
                    });
                }

                let parsed = serde_json::from_str::<ItemsResponse<T>>(&body).map_err(|e| {
                    DirectusError::Deserialize {
                        context: format!("items page {page} of {collection}"),
                        source: e,
                    }
                })?;
                Ok(parsed)
            }
        })
        .await
    }

    /// Builds `{base}/items/{collection}?limit=N&page=P&meta=filter_count`,
    /// percent-encoding the collection as a single path segment.
    fn items_url(&self, collection: &str, page: u32) -> Result<Url, DirectusError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| DirectusError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot carry a path".to_owned(),
            })?
            .pop_if_empty()
            .push("items")
            .push(collection);
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string())
            .append_pair("page", &page.to_string())
            .append_pair("meta", "filter_count");
        Ok(url)
    }
}

/// Decides whether the listing is complete once `seen` rows have arrived.
fn is_last_page(fetched: u64, requested: u64, seen: u64, filter_count: Option<u64>) -> bool {
    if fetched == 0 {
        return true;
    }
    match filter_count {
        Some(total) => seen >= total,
        None => fetched < requested,
    }
}

/// Extracts the first `errors[].message` from a Directus error body, falling
/// back to the raw body text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorsResponse>(body)
        .ok()
        .and_then(|e| e.errors.into_iter().next())
        .map_or_else(|| body.trim().to_owned(), |e| e.message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> DirectusClient {
        DirectusClient::new(base_url, "test-token", 30).expect("client construction should not fail")
    }

    #[test]
    fn items_url_appends_collection_and_paging() {
        let client = test_client("https://cms.example.com");
        let url = client.items_url("weframe_products", 2).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cms.example.com/items/weframe_products?limit=100&page=2&meta=filter_count"
        );
    }

    #[test]
    fn items_url_keeps_base_path() {
        let client = test_client("https://example.com/directus/");
        let url = client.items_url("products", 1).unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/directus/items/products?limit=100&page=1&meta=filter_count"
        );
    }

    #[test]
    fn items_url_encodes_collection_segment() {
        let client = test_client("https://cms.example.com");
        let url = client.items_url("odd/name", 1).unwrap();
        assert!(
            url.path().ends_with("/items/odd%2Fname"),
            "collection must stay one segment: {url}"
        );
    }

    #[test]
    fn filter_count_reached_ends_listing() {
        assert!(is_last_page(25, 100, 150, Some(150)));
    }

    #[test]
    fn capped_page_below_filter_count_continues() {
        assert!(!is_last_page(25, 100, 25, Some(150)));
    }

    #[test]
    fn short_page_without_filter_count_ends_listing() {
        assert!(is_last_page(25, 100, 25, None));
    }

    #[test]
    fn empty_page_ends_listing_even_below_filter_count() {
        assert!(is_last_page(0, 100, 25, Some(150)));
    }

    #[test]
    fn new_rejects_relative_urls() {
        let result = DirectusClient::new("cms.example.com", "t", 30);
        assert!(matches!(result, Err(DirectusError::InvalidBaseUrl { .. })));
    }

    #[test]
    fn error_message_prefers_directus_envelope() {
        let body = r#"{"errors":[{"message":"Invalid user credentials.","extensions":{"code":"INVALID_CREDENTIALS"}}]}"#;
        assert_eq!(error_message(body), "Invalid user credentials.");
    }

    #[test]
    fn error_message_falls_back_to_raw_body() {
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }
}
