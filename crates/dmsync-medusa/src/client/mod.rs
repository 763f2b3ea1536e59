//! HTTP client for the Medusa admin products API.

mod list_all;

use std::time::Duration;

use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use dmsync_core::{CreateProductPayload, UpdateProductPayload};

use crate::error::MedusaError;
use crate::retry::retry_with_backoff;
use crate::types::{CommerceProduct, DeleteResponse, ProductEnvelope, ProductsPage};

/// Products requested per listing page.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Maximum number of listing pages before returning an error.
pub(super) const MAX_PAGES: u32 = 1_000;

/// Client for `/admin/products` on a Medusa backend.
///
/// Non-2xx responses become [`MedusaError::Rejected`] carrying the response
/// body. Listing calls retry transient failures; mutations never do.
pub struct MedusaClient {
    pub(super) client: Client,
    pub(super) base_url: Url,
    api_key: String,
    pub(super) page_size: u32,
    pub(super) max_retries: u32,
    pub(super) backoff_base_ms: u64,
}

impl MedusaClient {
    /// Creates a client authenticating with `api_key` as a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`MedusaError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`MedusaError::InvalidBaseUrl`] if `base_url` is not an absolute
    /// http(s) URL.
    pub fn new(base_url: &str, api_key: &str, timeout_secs: u64) -> Result<Self, MedusaError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("dmsync/0.1 (medusa-admin)")
            .build()?;

        let parsed = Url::parse(base_url).map_err(|e| MedusaError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(MedusaError::InvalidBaseUrl {
                url: base_url.to_owned(),
                reason: "expected an absolute http(s) URL".to_owned(),
            });
        }

        Ok(Self {
            client,
            base_url: parsed,
            api_key: api_key.to_owned(),
            page_size: DEFAULT_PAGE_SIZE,
            max_retries: 0,
            backoff_base_ms: 0,
        })
    }

    /// Enables retries on transient listing failures.
    #[must_use]
    pub fn with_retries(mut self, max_retries: u32, backoff_base_ms: u64) -> Self {
        self.max_retries = max_retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Overrides the listing page size (clamped to at least 1).
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Fetches one page of products via `GET /admin/products?limit=&offset=`.
    ///
    /// # Errors
    ///
    /// - [`MedusaError::Rejected`] for non-2xx responses (429/5xx retried first).
    /// - [`MedusaError::Http`] on network failure after retries.
    /// - [`MedusaError::Deserialize`] if the body is not a product listing.
    pub async fn fetch_products_page(
        &self,
        limit: u32,
        offset: u64,
    ) -> Result<ProductsPage, MedusaError> {
        let mut url = self.products_url(None)?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let url = url.clone();
            async move {
                self.send_json::<(), ProductsPage>(Method::GET, url, None, "product listing")
                    .await
            }
        })
        .await
    }

    /// Creates a product via `POST /admin/products`.
    ///
    /// # Errors
    ///
    /// Returns [`MedusaError::Rejected`] if Medusa refuses the payload (e.g.
    /// a duplicate handle), [`MedusaError::Http`] on network failure, or
    /// [`MedusaError::Deserialize`] if the response lacks a product.
    pub async fn create_product(
        &self,
        payload: &CreateProductPayload,
    ) -> Result<CommerceProduct, MedusaError> {
        let url = self.products_url(None)?;
        let envelope: ProductEnvelope = self
            .send_json(Method::POST, url, Some(payload), "created product")
            .await?;
        Ok(envelope.product)
    }

    /// Applies a partial update via `PUT /admin/products/{id}`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_product`]; a 404 means the id is unknown.
    pub async fn update_product(
        &self,
        product_id: &str,
        payload: &UpdateProductPayload,
    ) -> Result<CommerceProduct, MedusaError> {
        let url = self.products_url(Some(product_id))?;
        let envelope: ProductEnvelope = self
            .send_json(Method::PUT, url, Some(payload), "updated product")
            .await?;
        Ok(envelope.product)
    }

    /// Deletes a product via `DELETE /admin/products/{id}`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::create_product`].
    pub async fn delete_product(&self, product_id: &str) -> Result<DeleteResponse, MedusaError> {
        let url = self.products_url(Some(product_id))?;
        self.send_json::<(), DeleteResponse>(Method::DELETE, url, None, "product deletion")
            .await
    }

    /// Sends one request and decodes a 2xx JSON body into `R`.
    async fn send_json<B, R>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
        context: &str,
    ) -> Result<R, MedusaError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let method_name = method_label(&method);
        let mut request = self
            .client
            .request(method, url.clone())
            .bearer_auth(&self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(MedusaError::Rejected {
                method: method_name,
                url: url.to_string(),
                status: status.as_u16(),
                body: text.trim().to_owned(),
            });
        }

        serde_json::from_str::<R>(&text).map_err(|e| MedusaError::Deserialize {
            context: format!("{context} from {url}"),
            source: e,
        })
    }

    /// Builds `{base}/admin/products[/{id}]`, encoding `id` as one path segment.
    fn products_url(&self, product_id: Option<&str>) -> Result<Url, MedusaError> {
        let mut url = self.base_url.clone();
        {
            let mut segments =
                url.path_segments_mut()
                    .map_err(|()| MedusaError::InvalidBaseUrl {
                        url: self.base_url.to_string(),
                        reason: "URL cannot carry a path".to_owned(),
                    })?;
            segments.pop_if_empty().push("admin").push("products");
            if let Some(id) = product_id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::DELETE => "DELETE",
        _ => "GET",
    }
}
