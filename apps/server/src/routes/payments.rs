//! Payment status endpoints.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use tindera_core::{PaymentOwner, PaymentState, PaymentStatus};
use tindera_db::EngineError;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/payments", routes())
}

fn routes() -> Router<AppState> {
    Router::new().route("/{owner}/{id}", get(get_status).put(update))
}

#[derive(Debug, Deserialize)]
struct UpdateRequest {
    status: PaymentState,
}

/// GET /api/payments/{owner}/{id} - current payment state for a sale or delivery
async fn get_status(
    State(state): State<AppState>,
    Path((owner, id)): Path<(PaymentOwner, String)>,
) -> ApiResult<Json<PaymentStatus>> {
    let status = state.db.payments().get(owner, &id).await?.ok_or_else(|| {
        ApiError(EngineError::NotFound {
            entity: "payment status",
            id: id.clone(),
        })
    })?;
    Ok(Json(status))
}

/// PUT /api/payments/{owner}/{id} - set the payment state directly
///
/// Used by staff to correct a record, e.g. marking a delivered-but-unpaid
/// consignment as paid once the cash arrives.
async fn update(
    State(state): State<AppState>,
    Path((owner, id)): Path<(PaymentOwner, String)>,
    Json(req): Json<UpdateRequest>,
) -> ApiResult<Json<PaymentStatus>> {
    let status = state.db.payments().upsert(owner, &id, req.status).await?;
    Ok(Json(status))
}
