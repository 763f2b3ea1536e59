use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::Value;

use dmsync_engine::{HookAction, HookEvent, SyncError, SyncOutcome};

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct HookRequest {
    event: String,
    #[serde(default)]
    payload: Value,
    #[serde(default)]
    keys: Vec<Value>,
    #[serde(default)]
    key: Option<Value>,
}

/// Accepts a forwarded Directus item action and runs the matching handler.
pub(super) async fn receive_directus_hook(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<HookRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SyncOutcome>>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::new(&req_id.0, "bad_request", e.body_text()))?;

    let event = resolve_event_name(&request.event, &state.collection);
    let meta = HookEvent {
        payload: request.payload,
        keys: request.keys,
        key: request.key,
    };

    tracing::info!(request_id = %req_id.0, event = %event, "received Directus hook");

    match state.registry.dispatch(&event, meta).await {
        None => Err(ApiError::new(
            req_id.0,
            "not_found",
            format!("no handler registered for {event}"),
        )),
        Some(Ok(outcome)) => Ok(Json(ApiResponse {
            data: outcome,
            meta: ResponseMeta::new(req_id.0),
        })),
        Some(Err(e)) => Err(map_sync_error(req_id.0, &e)),
    }
}

/// Expands a bare action (`create`) to `items.create.<collection>`; anything
/// else is taken as a full event name.
pub(super) fn resolve_event_name(event: &str, collection: &str) -> String {
    let event = event.trim();
    HookAction::parse(event).map_or_else(|| event.to_owned(), |a| a.event_name(collection))
}

pub(super) fn map_sync_error(request_id: String, error: &SyncError) -> ApiError {
    let code = match error {
        SyncError::Validation(_) => "validation_error",
        SyncError::Network { .. } | SyncError::Rejected { .. } | SyncError::Decode { .. } => {
            "upstream_error"
        }
        SyncError::Store(_) => "internal_error",
    };
    ApiError::new(request_id, code, error.to_string())
}
