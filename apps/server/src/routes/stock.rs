//! Stock item endpoints: listing, back-office creation, manual adjustments.
//!
//! Fulfillment never touches these routes; order intake and walk-up sales
//! deduct stock through the engine. Adjustments here cover restocking goods
//! returned from failed deliveries and correcting shelf counts.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use tindera_core::StockItem;
use tindera_db::EngineError;

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/stock", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id))
        .route("/{id}/adjust", post(adjust))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStockItem {
    name: String,
    category: String,
    unit_price_cents: i64,
    quantity: i64,
    #[serde(default = "default_condition")]
    condition: String,
}

fn default_condition() -> String {
    "good".to_string()
}

#[derive(Debug, Deserialize)]
struct AdjustRequest {
    delta: i64,
}

/// GET /api/stock - list stock items
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<StockItem>>> {
    let items = state.db.stock().list(query.limit.unwrap_or(200)).await?;
    Ok(Json(items))
}

/// GET /api/stock/{id} - fetch one item
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StockItem>> {
    let item = state.db.stock().get_by_id(&id).await?.ok_or_else(|| {
        ApiError(EngineError::NotFound {
            entity: "stock item",
            id: id.clone(),
        })
    })?;
    Ok(Json(item))
}

/// POST /api/stock - add a new item to the shelf
async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateStockItem>,
) -> ApiResult<Json<StockItem>> {
    if req.unit_price_cents < 0 || req.quantity < 0 {
        return Err(ApiError(EngineError::Validation(
            tindera_core::ValidationError::OutOfRange {
                field: "unitPriceCents/quantity".to_string(),
                min: 0,
                max: i64::MAX,
            }
            .into(),
        )));
    }

    let now = Utc::now();
    let item = StockItem {
        id: Uuid::new_v4().to_string(),
        name: req.name,
        category: req.category,
        unit_price_cents: req.unit_price_cents,
        quantity: req.quantity,
        condition: req.condition,
        created_at: now,
        updated_at: now,
    };

    state.db.stock().insert(&item).await?;
    Ok(Json(item))
}

/// POST /api/stock/{id}/adjust - apply a manual quantity delta
async fn adjust(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<AdjustRequest>,
) -> ApiResult<Json<Value>> {
    match state.db.stock().adjust_quantity(&id, req.delta).await? {
        Some(quantity) => Ok(Json(json!({ "id": id, "quantity": quantity }))),
        None => {
            // Either the item is missing or the delta would go negative.
            if state.db.stock().get_by_id(&id).await?.is_none() {
                Err(ApiError(EngineError::NotFound {
                    entity: "stock item",
                    id,
                }))
            } else {
                Err(ApiError(EngineError::Conflict(format!(
                    "adjustment of {} would take stock item {id} below zero",
                    req.delta
                ))))
            }
        }
    }
}
