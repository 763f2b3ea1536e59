use thiserror::Error;

/// Errors returned by the Directus client.
#[derive(Debug, Error)]
pub enum DirectusError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Directus answered with a non-2xx status.
    #[error("Directus returned {status} for {url}: {message}")]
    Status {
        status: u16,
        url: String,
        message: String,
    },

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Directus base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("pagination limit reached for collection {collection}: exceeded {max_pages} pages")]
    PaginationLimit { collection: String, max_pages: u32 },
}
