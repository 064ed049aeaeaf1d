//! Return record endpoints.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use tindera_core::ReturnRecord;
use tindera_db::EngineError;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/returns", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/delivery/{id}", get(for_delivery))
}

/// GET /api/returns - all outstanding failed-delivery records
async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<ReturnRecord>>> {
    let records = state.db.returns().list().await?;
    Ok(Json(records))
}

/// GET /api/returns/delivery/{id} - the return record for one delivery
async fn for_delivery(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReturnRecord>> {
    let record = state
        .db
        .returns()
        .get_for_delivery(&id)
        .await?
        .ok_or_else(|| {
            ApiError(EngineError::NotFound {
                entity: "return record",
                id: id.clone(),
            })
        })?;
    Ok(Json(record))
}
