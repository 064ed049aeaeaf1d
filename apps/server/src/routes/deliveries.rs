//! Delivery endpoints: outcome resolution, in-flight updates, listing.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::{retry_transient, ApiError, ApiResult};
use crate::state::AppState;
use tindera_core::{Delivery, DeliveryStatus, ReturnRecord, Sale};
use tindera_db::EngineError;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/deliveries", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/{id}", get(get_by_id))
        .route("/{id}/delivered", post(delivered))
        .route("/{id}/not-delivered", post(not_delivered))
        .route("/{id}/rider", put(rider))
        .route("/{id}/status", put(status))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    status: Option<DeliveryStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeliveredRequest {
    staff_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotDeliveredRequest {
    reason: String,
    staff_id: String,
}

#[derive(Debug, Deserialize)]
struct RiderRequest {
    rider: String,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: DeliveryStatus,
}

/// GET /api/deliveries?status= - list consignments, optionally by status
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Delivery>>> {
    let deliveries = state.db.deliveries().list(query.status).await?;
    Ok(Json(deliveries))
}

/// GET /api/deliveries/{id} - fetch one consignment
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Delivery>> {
    let delivery = state.db.deliveries().get_by_id(&id).await?.ok_or_else(|| {
        ApiError(EngineError::NotFound {
            entity: "delivery",
            id: id.clone(),
        })
    })?;
    Ok(Json(delivery))
}

/// POST /api/deliveries/{id}/delivered - resolve as handed over and paid
async fn delivered(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DeliveredRequest>,
) -> ApiResult<Json<Sale>> {
    let engine = state.db.engine();
    let sale = retry_transient(|| engine.mark_delivered(&id, &req.staff_id)).await?;
    Ok(Json(sale))
}

/// POST /api/deliveries/{id}/not-delivered - resolve as failed
async fn not_delivered(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<NotDeliveredRequest>,
) -> ApiResult<Json<ReturnRecord>> {
    let engine = state.db.engine();
    let record =
        retry_transient(|| engine.mark_not_delivered(&id, &req.reason, &req.staff_id)).await?;
    Ok(Json(record))
}

/// PUT /api/deliveries/{id}/rider - assign or replace the rider
async fn rider(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<RiderRequest>,
) -> ApiResult<Json<Delivery>> {
    let delivery = state.db.engine().assign_rider(&id, &req.rider).await?;
    Ok(Json(delivery))
}

/// PUT /api/deliveries/{id}/status - move between in-flight statuses
async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Json<Delivery>> {
    let delivery = state
        .db
        .engine()
        .update_delivery_status(&id, req.status)
        .await?;
    Ok(Json(delivery))
}
