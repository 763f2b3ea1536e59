use thiserror::Error;

#[derive(Debug, Error)]
pub enum MedusaError {
    /// Network or TLS failure; no response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Medusa answered with a non-2xx status. `body` is the raw response text.
    #[error("{method} {url} rejected with status {status}: {body}")]
    Rejected {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid Medusa base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("pagination limit reached listing products: exceeded {max_pages} pages")]
    PaginationLimit { max_pages: u32 },
}

impl MedusaError {
    /// HTTP status of a rejected request, if there was a response at all.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
