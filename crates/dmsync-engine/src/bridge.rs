//! Mirrors Directus item events onto Medusa products, one event at a time.

use std::sync::Arc;

use dmsync_core::{event_create_payload, update_payload, CmsProduct};
use dmsync_medusa::MedusaClient;

use crate::error::{SyncError, SyncOutcome};
use crate::hooks::{HookAction, HookEvent, HookRegistry};
use crate::links::{LinkStore, ProductLink};

pub struct EventBridge {
    medusa: Arc<MedusaClient>,
    links: LinkStore,
    collection: String,
    currency_code: String,
}

impl EventBridge {
    #[must_use]
    pub fn new(
        medusa: Arc<MedusaClient>,
        links: LinkStore,
        collection: impl Into<String>,
        currency_code: impl Into<String>,
    ) -> Self {
        Self {
            medusa,
            links,
            collection: collection.into(),
            currency_code: currency_code.into(),
        }
    }

    /// Registers create, update and delete handlers for the bridge's
    /// collection.
    pub fn register(self: &Arc<Self>, registry: &mut HookRegistry) {
        for action in HookAction::ALL {
            let bridge = Arc::clone(self);
            registry.action(action.event_name(&self.collection), move |event| {
                let bridge = Arc::clone(&bridge);
                async move { bridge.handle(action, event).await }
            });
        }
        tracing::info!(collection = %self.collection, "registered product hooks");
    }

    /// Runs `action` and logs its result.
    ///
    /// # Errors
    ///
    /// Returns the [`SyncError`] from the underlying action.
    pub async fn handle(
        &self,
        action: HookAction,
        event: HookEvent,
    ) -> Result<SyncOutcome, SyncError> {
        let result = match action {
            HookAction::Create => self.create(&event).await,
            HookAction::Update => self.update(&event).await,
            HookAction::Delete => self.delete(&event).await,
        };

        match &result {
            Ok(outcome) => tracing::debug!(%action, ?outcome, "hook handled"),
            Err(e) if e.is_transient() => tracing::warn!(
                %action,
                collection = %self.collection,
                kind = e.kind(),
                error = %e,
                "Medusa sync failed; the next bulk sync will reconcile it"
            ),
            Err(e) => tracing::error!(
                %action,
                collection = %self.collection,
                kind = e.kind(),
                error = %e,
                "Medusa sync failed"
            ),
        }
        result
    }

    async fn create(&self, event: &HookEvent) -> Result<SyncOutcome, SyncError> {
        let row = CmsProduct::from_value(event.payload.clone())
            .map_err(|e| SyncError::Validation(format!("malformed create payload: {e}")))?;
        let payload = event_create_payload(&row, &self.currency_code)?;
        let cms_key = event.primary_key().or_else(|| row.id.clone());

        let product = self.medusa.create_product(&payload).await?;
        tracing::info!(
            cms_key = cms_key.as_deref().unwrap_or("-"),
            commerce_product_id = %product.id,
            title = %product.title,
            "product created in Medusa"
        );

        match &cms_key {
            Some(key) => {
                self.links
                    .upsert(&ProductLink {
                        cms_key: key.clone(),
                        commerce_product_id: product.id.clone(),
                        title: payload.title.clone(),
                    })
                    .await?;
            }
            None => tracing::warn!(
                commerce_product_id = %product.id,
                "create event carried no CMS key; product left unlinked"
            ),
        }

        Ok(SyncOutcome::Created {
            cms_key,
            commerce_product_id: product.id,
        })
    }

    async fn update(&self, event: &HookEvent) -> Result<SyncOutcome, SyncError> {
        let cms_key = first_key(event, HookAction::Update)?;
        let changes = event
            .payload
            .as_object()
            .ok_or_else(|| SyncError::Validation("update payload must be an object".to_owned()))?;
        let Some(payload) = update_payload(changes)? else {
            return Ok(SyncOutcome::Skipped {
                reason: format!("update of {cms_key} changes neither title nor description"),
            });
        };

        let (commerce_product_id, link) = self.resolve(&cms_key).await?;
        let product = self
            .medusa
            .update_product(&commerce_product_id, &payload)
            .await?;
        tracing::info!(
            cms_key = %cms_key,
            commerce_product_id = %product.id,
            "product updated in Medusa"
        );

        if let (Some(mut link), Some(title)) = (link, payload.title) {
            link.title = title;
            self.links.upsert(&link).await?;
        }

        Ok(SyncOutcome::Updated {
            cms_key,
            commerce_product_id,
        })
    }

    async fn delete(&self, event: &HookEvent) -> Result<SyncOutcome, SyncError> {
        let cms_key = first_key(event, HookAction::Delete)?;
        let (commerce_product_id, link) = self.resolve(&cms_key).await?;

        match self.medusa.delete_product(&commerce_product_id).await {
            Ok(_) => {}
            Err(e) if e.status() == Some(404) && link.is_some() => {
                self.links.remove(&cms_key).await?;
                tracing::warn!(
                    cms_key = %cms_key,
                    commerce_product_id = %commerce_product_id,
                    "linked product already gone from Medusa; dropped stale link"
                );
                return Ok(SyncOutcome::Skipped {
                    reason: format!("commerce product {commerce_product_id} no longer exists"),
                });
            }
            Err(e) => return Err(e.into()),
        }
        tracing::info!(
            cms_key = %cms_key,
            commerce_product_id = %commerce_product_id,
            "product deleted from Medusa"
        );

        if link.is_some() {
            self.links.remove(&cms_key).await?;
        }

        Ok(SyncOutcome::Deleted {
            cms_key,
            commerce_product_id,
        })
    }

    /// Maps a CMS key to a commerce id, falling back to the key itself for
    /// rows seeded before links existed.
    async fn resolve(&self, cms_key: &str) -> Result<(String, Option<ProductLink>), SyncError> {
        match self.links.find(cms_key).await? {
            Some(link) => Ok((link.commerce_product_id.clone(), Some(link))),
            None => {
                tracing::warn!(
                    cms_key = %cms_key,
                    "no product link; using CMS key as Medusa product id"
                );
                Ok((cms_key.to_owned(), None))
            }
        }
    }
}

/// Normalises `keys[0]`. A first key that is not a usable id is an error;
/// later keys are never consulted.
fn first_key(event: &HookEvent, action: HookAction) -> Result<String, SyncError> {
    let raw = event
        .keys
        .first()
        .ok_or_else(|| SyncError::Validation(format!("{action} event carried no keys")))?;
    let first = dmsync_core::cms_key(raw).ok_or_else(|| {
        SyncError::Validation(format!("{action} event's first key {raw} is not a usable id"))
    })?;

    let ignored = event.keys.len() - 1;
    if ignored > 0 {
        tracing::warn!(
            %action,
            cms_key = %first,
            ignored,
            "batch event; only the first key is synced"
        );
    }
    Ok(first)
}
