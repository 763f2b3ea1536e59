//! Sync engine: the per-event bridge and the whole-collection bulk job.

pub mod bridge;
pub mod bulk;
pub mod error;
pub mod hooks;
pub mod links;

use dmsync_core::AppConfig;
use dmsync_directus::DirectusClient;
use dmsync_medusa::MedusaClient;

pub use bridge::EventBridge;
pub use bulk::{plan_rows, BulkSync, RowPlan, SyncReport};
pub use error::{SyncError, SyncOutcome};
pub use hooks::{HookAction, HookEvent, HookHandler, HookRegistry};
pub use links::{LinkStore, ProductLink};

/// Builds the Directus and Medusa clients from config, with the configured
/// timeout and read-retry policy.
///
/// # Errors
///
/// Returns [`SyncError::Validation`] for unusable base URLs, or
/// [`SyncError::Network`] if an HTTP client cannot be constructed.
pub fn build_clients(config: &AppConfig) -> Result<(DirectusClient, MedusaClient), SyncError> {
    let directus = DirectusClient::new(
        &config.directus_url,
        &config.directus_token,
        config.request_timeout_secs,
    )?
    .with_retries(config.max_retries, config.retry_backoff_base_ms);

    let medusa = MedusaClient::new(
        &config.medusa_url,
        &config.medusa_api_key,
        config.request_timeout_secs,
    )?
    .with_retries(config.max_retries, config.retry_backoff_base_ms);

    Ok((directus, medusa))
}
