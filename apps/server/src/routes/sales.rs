//! Walk-up sale endpoint and sale reads.

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::{retry_transient, ApiError, ApiResult};
use crate::state::AppState;
use tindera_core::Sale;
use tindera_db::{EngineError, WalkUpSale};

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/sales", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list))
        .route("/walk-up", post(walk_up))
        .route("/{id}", get(get_by_id))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    limit: Option<u32>,
}

/// POST /api/sales/walk-up - ring up a counter sale with no prior order
async fn walk_up(
    State(state): State<AppState>,
    Json(input): Json<WalkUpSale>,
) -> ApiResult<Json<Sale>> {
    let engine = state.db.engine();
    let sale = retry_transient(|| engine.settle_walk_up(input.clone())).await?;
    Ok(Json(sale))
}

/// GET /api/sales - list completed sales
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Sale>>> {
    let sales = state.db.sales().list(query.limit.unwrap_or(100)).await?;
    Ok(Json(sales))
}

/// GET /api/sales/{id} - fetch one sale
async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    let sale = state
        .db
        .sales()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| {
            ApiError(EngineError::NotFound {
                entity: "sale",
                id: id.clone(),
            })
        })?;
    Ok(Json(sale))
}
