use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::engine::reconcile;
use crate::engine::reconcile::{CreatedShipment, TrackedShipment, WebhookAck};
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/shipments", post(create_shipment))
        .route("/shipments/track", get(track_shipment))
        .route("/webhooks/ncm", post(carrier_webhook))
        .route("/orders/:id/shipment", get(order_shipment))
        .route("/branches", get(branches))
        .route("/shipping-cost", get(shipping_cost))
}

#[derive(Deserialize)]
pub struct CreateShipmentRequest {
    pub order_id: Uuid,
    pub destination_city: String,
}

#[derive(Deserialize)]
pub struct TrackQuery {
    pub tracking_id: String,
}

#[derive(Deserialize)]
pub struct ShippingCostQuery {
    pub destination: String,
}

async fn create_shipment(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateShipmentRequest>,
) -> Result<Json<CreatedShipment>, AppError> {
    if payload.destination_city.trim().is_empty() {
        return Err(AppError::BadRequest(
            "destination_city cannot be empty".to_string(),
        ));
    }

    let created =
        reconcile::create_shipment(&state, payload.order_id, &payload.destination_city).await?;
    Ok(Json(created))
}

async fn track_shipment(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<TrackedShipment>, AppError> {
    if query.tracking_id.trim().is_empty() {
        return Err(AppError::BadRequest(
            "tracking_id parameter is required".to_string(),
        ));
    }

    let tracked = reconcile::refresh_shipment(&state, &query.tracking_id).await?;
    Ok(Json(tracked))
}

async fn carrier_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<Value>,
) -> Result<Json<WebhookAck>, AppError> {
    let ack = reconcile::process_webhook(&state, payload).await?;
    Ok(Json(ack))
}

async fn order_shipment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    match reconcile::shipment_for_order(&state, id) {
        Some(shipment) => serde_json::to_value(shipment)
            .map(Json)
            .map_err(|err| AppError::Internal(format!("failed to serialize shipment: {err}"))),
        None => Ok(Json(Value::Null)),
    }
}

async fn branches(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let data = reconcile::cached_branch_list(&state).await?;
    Ok(Json(data))
}

async fn shipping_cost(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ShippingCostQuery>,
) -> Result<Json<Value>, AppError> {
    if query.destination.trim().is_empty() {
        return Err(AppError::BadRequest(
            "destination parameter is required".to_string(),
        ));
    }

    let data = reconcile::cached_shipping_rate(&state, &query.destination).await?;
    Ok(Json(data))
}
