use serde::Serialize;
use thiserror::Error;

use dmsync_core::MappingError;
use dmsync_db::DbError;
use dmsync_directus::DirectusError;
use dmsync_medusa::MedusaError;

/// What a successful sync step did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SyncOutcome {
    Created {
        cms_key: Option<String>,
        commerce_product_id: String,
    },
    Updated {
        cms_key: String,
        commerce_product_id: String,
    },
    Deleted {
        cms_key: String,
        commerce_product_id: String,
    },
    Skipped {
        reason: String,
    },
}

/// Why a sync step failed.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No response from the remote service (connect failure, timeout, TLS).
    #[error("{service} unreachable: {message}")]
    Network {
        service: &'static str,
        message: String,
    },

    /// The remote service answered with a non-2xx status.
    #[error("{service} rejected the request with status {status}: {body}")]
    Rejected {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The event or CMS row cannot be turned into a commerce call.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The remote service answered 2xx with a body we could not use.
    #[error("unexpected response from {service}: {message}")]
    Decode {
        service: &'static str,
        message: String,
    },

    /// Reading or writing product links failed.
    #[error("link store error: {0}")]
    Store(String),
}

impl SyncError {
    /// Short machine-readable label, used as a structured log field.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::Rejected { .. } => "rejected",
            Self::Validation(_) => "validation",
            Self::Decode { .. } => "decode",
            Self::Store(_) => "store",
        }
    }

    /// Whether repeating the same call later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Rejected { status, .. } => *status == 429 || *status >= 500,
            Self::Validation(_) | Self::Decode { .. } | Self::Store(_) => false,
        }
    }
}

impl From<MedusaError> for SyncError {
    fn from(err: MedusaError) -> Self {
        const SERVICE: &str = "medusa";
        match err {
            MedusaError::Http(e) => Self::Network {
                service: SERVICE,
                message: e.to_string(),
            },
            MedusaError::Rejected { status, body, .. } => Self::Rejected {
                service: SERVICE,
                status,
                body,
            },
            MedusaError::InvalidBaseUrl { .. } => Self::Validation(err.to_string()),
            MedusaError::Deserialize { .. } | MedusaError::PaginationLimit { .. } => {
                Self::Decode {
                    service: SERVICE,
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<DirectusError> for SyncError {
    fn from(err: DirectusError) -> Self {
        const SERVICE: &str = "directus";
        match err {
            DirectusError::Http(e) => Self::Network {
                service: SERVICE,
                message: e.to_string(),
            },
            DirectusError::Status {
                status, message, ..
            } => Self::Rejected {
                service: SERVICE,
                status,
                body: message,
            },
            DirectusError::InvalidBaseUrl { .. } => Self::Validation(err.to_string()),
            DirectusError::Deserialize { .. } | DirectusError::PaginationLimit { .. } => {
                Self::Decode {
                    service: SERVICE,
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<MappingError> for SyncError {
    fn from(err: MappingError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<DbError> for SyncError {
    fn from(err: DbError) -> Self {
        Self::Store(err.to_string())
    }
}
