use axum::{extract::State, Extension, Json};

use dmsync_engine::ProductLink;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

pub(super) async fn list_links(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<ProductLink>>>, ApiError> {
    match state.links.list().await {
        Ok(links) => Ok(Json(ApiResponse {
            data: links,
            meta: ResponseMeta::new(req_id.0),
        })),
        Err(e) => {
            tracing::error!(error = %e, "failed to list product links");
            Err(ApiError::new(
                req_id.0,
                "internal_error",
                "failed to list product links",
            ))
        }
    }
}
