//! Named-event handler registry modelled on the Directus `action` hook API.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{SyncError, SyncOutcome};

/// Metadata Directus passes to an item action hook.
///
/// Create events carry the new primary key in `key`; update and delete
/// events carry the affected keys in `keys`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookEvent {
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub keys: Vec<Value>,
    #[serde(default)]
    pub key: Option<Value>,
}

impl HookEvent {
    /// The event's primary key: `key` when present, else the first of `keys`.
    #[must_use]
    pub fn primary_key(&self) -> Option<String> {
        self.key
            .as_ref()
            .and_then(dmsync_core::cms_key)
            .or_else(|| self.keys.first().and_then(dmsync_core::cms_key))
    }
}

/// The three item actions the bridge listens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookAction {
    Create,
    Update,
    Delete,
}

impl HookAction {
    pub const ALL: [Self; 3] = [Self::Create, Self::Update, Self::Delete];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }

    /// `items.<action>.<collection>`
    #[must_use]
    pub fn event_name(self, collection: &str) -> String {
        format!("items.{}.{collection}", self.as_str())
    }

    #[must_use]
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "create" => Some(Self::Create),
            "update" => Some(Self::Update),
            "delete" => Some(Self::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for HookAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type HookHandler =
    Arc<dyn Fn(HookEvent) -> BoxFuture<'static, Result<SyncOutcome, SyncError>> + Send + Sync>;

/// Event name → handler. Registering a name twice replaces the first handler.
#[derive(Default, Clone)]
pub struct HookRegistry {
    handlers: HashMap<String, HookHandler>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("events", &self.events())
            .finish()
    }
}

impl HookRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn action<F, Fut>(&mut self, event: impl Into<String>, handler: F)
    where
        F: Fn(HookEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<SyncOutcome, SyncError>> + Send + 'static,
    {
        let event = event.into();
        let handler: HookHandler = Arc::new(move |meta| Box::pin(handler(meta)));
        if self.handlers.insert(event.clone(), handler).is_some() {
            tracing::debug!(event = %event, "replaced existing hook handler");
        }
    }

    /// Registered event names, sorted.
    #[must_use]
    pub fn events(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Runs the handler registered for `event`, or returns `None` if there is
    /// none.
    pub async fn dispatch(
        &self,
        event: &str,
        meta: HookEvent,
    ) -> Option<Result<SyncOutcome, SyncError>> {
        let handler = Arc::clone(self.handlers.get(event)?);
        Some(handler(meta).await)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn skipped(reason: &str) -> Result<SyncOutcome, SyncError> {
        Ok(SyncOutcome::Skipped {
            reason: reason.to_owned(),
        })
    }

    #[test]
    fn event_names_follow_directus_convention() {
        assert_eq!(
            HookAction::Update.event_name("weframe_products"),
            "items.update.weframe_products"
        );
        assert_eq!(HookAction::parse("delete"), Some(HookAction::Delete));
        assert_eq!(HookAction::parse("items.delete"), None);
    }

    #[test]
    fn primary_key_prefers_key_then_first_of_keys() {
        let create: HookEvent = serde_json::from_value(json!({"key": 7, "payload": {}})).unwrap();
        assert_eq!(create.primary_key().as_deref(), Some("7"));

        let update: HookEvent =
            serde_json::from_value(json!({"keys": ["abc123", "def456"]})).unwrap();
        assert_eq!(update.primary_key().as_deref(), Some("abc123"));

        assert_eq!(HookEvent::default().primary_key(), None);
    }

    #[tokio::test]
    async fn dispatch_runs_registered_handler() {
        let mut registry = HookRegistry::new();
        registry.action("items.create.things", |_| async { skipped("first") });

        let result = registry
            .dispatch("items.create.things", HookEvent::default())
            .await
            .expect("handler registered");
        assert_eq!(
            result.unwrap(),
            SyncOutcome::Skipped {
                reason: "first".to_owned()
            }
        );
    }

    #[tokio::test]
    async fn dispatch_unknown_event_returns_none() {
        let registry = HookRegistry::new();
        assert!(registry
            .dispatch("items.create.things", HookEvent::default())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn registering_twice_replaces_handler() {
        let mut registry = HookRegistry::new();
        registry.action("items.create.things", |_| async { skipped("first") });
        registry.action("items.create.things", |_| async { skipped("second") });

        assert_eq!(registry.events(), vec!["items.create.things"]);
        let result = registry
            .dispatch("items.create.things", HookEvent::default())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            result,
            SyncOutcome::Skipped {
                reason: "second".to_owned()
            }
        );
    }
}
