//! Order intake endpoints: accept, verify, cancel, settle, dispatch.

use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{retry_transient, ApiResult};
use crate::state::AppState;
use tindera_core::{CartLine, Delivery, FulfillmentType, NewOrder, Order, Sale};

pub fn router() -> Router<AppState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create))
        .route("/{id}/cancel", post(cancel))
        .route("/{id}/verify", post(verify))
        .route("/{id}/settle", post(settle))
        .route("/{id}/dispatch", post(dispatch))
}

/// Order submission body. The shipping fee is not client-supplied; it is
/// resolved from the configured fee table by place.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateOrderRequest {
    customer_name: String,
    contact: String,
    address: String,
    place: String,
    fulfillment: FulfillmentType,
    lines: Vec<CartLine>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest {
    customer_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettleRequest {
    customer_name: String,
    cashier_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DispatchRequest {
    staff_id: String,
    rider: Option<String>,
}

/// POST /api/orders - accept a cart as a pending order
async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<Json<Order>> {
    let shipping_fee_cents = match req.fulfillment {
        FulfillmentType::Delivery => state.shipping.fee_for(&req.place).cents(),
        FulfillmentType::Pickup => 0,
    };

    let input = NewOrder {
        customer_name: req.customer_name,
        contact: req.contact,
        address: req.address,
        place: req.place,
        fulfillment: req.fulfillment,
        shipping_fee_cents,
        lines: req.lines,
    };

    let engine = state.db.engine();
    let order = retry_transient(|| engine.create_order(input.clone())).await?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/cancel - cancel a pending order, restoring stock
async fn cancel(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Value>> {
    let engine = state.db.engine();
    retry_transient(|| engine.cancel_order(&id)).await?;
    Ok(Json(json!({ "cancelled": id })))
}

/// POST /api/orders/{id}/verify - check the presented customer name
async fn verify(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<VerifyRequest>,
) -> ApiResult<Json<Order>> {
    let order = state
        .db
        .engine()
        .verify_customer(&id, &req.customer_name)
        .await?;
    Ok(Json(order))
}

/// POST /api/orders/{id}/settle - settle at the counter
async fn settle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<SettleRequest>,
) -> ApiResult<Json<Sale>> {
    let engine = state.db.engine();
    let sale =
        retry_transient(|| engine.settle_order(&id, &req.customer_name, &req.cashier_id)).await?;
    Ok(Json(sale))
}

/// POST /api/orders/{id}/dispatch - hand a delivery order to a rider
async fn dispatch(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<DispatchRequest>,
) -> ApiResult<Json<Delivery>> {
    let engine = state.db.engine();
    let consignment =
        retry_transient(|| engine.dispatch_order(&id, req.rider.clone(), &req.staff_id)).await?;
    Ok(Json(consignment))
}
