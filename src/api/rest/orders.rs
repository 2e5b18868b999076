use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::order::{Customer, Order, OrderItem, OrderStatus, PaymentMethod};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/customers", post(create_customer))
        .route("/orders", post(create_order))
        .route("/orders/:id", get(get_order))
}

#[derive(Deserialize)]
pub struct CreateCustomerRequest {
    pub name: String,
    pub phone: String,
    pub secondary_phone: Option<String>,
    pub address: Option<String>,
    pub street: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub order_number: String,
    pub customer_id: Uuid,
    pub payment_method: PaymentMethod,
    pub total_amount: f64,
    #[serde(default)]
    pub delivery_charge: f64,
    pub items: Vec<OrderItem>,
}

async fn create_customer(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateCustomerRequest>,
) -> Result<Json<Customer>, AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::BadRequest("name cannot be empty".to_string()));
    }

    if payload.phone.trim().is_empty() {
        return Err(AppError::BadRequest("phone cannot be empty".to_string()));
    }

    let customer = Customer {
        id: Uuid::new_v4(),
        name: payload.name,
        phone: payload.phone,
        secondary_phone: payload.secondary_phone,
        address: payload.address,
        street: payload.street,
    };

    state.customers.insert(customer.id, customer.clone());
    Ok(Json(customer))
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    if payload.order_number.trim().is_empty() {
        return Err(AppError::BadRequest(
            "order_number cannot be empty".to_string(),
        ));
    }

    if !state.customers.contains_key(&payload.customer_id) {
        return Err(AppError::NotFound(format!(
            "customer {} not found",
            payload.customer_id
        )));
    }

    if payload.items.is_empty() {
        return Err(AppError::BadRequest(
            "order must have at least one item".to_string(),
        ));
    }

    let now = Utc::now();
    let order = Order {
        id: Uuid::new_v4(),
        order_number: payload.order_number,
        customer_id: payload.customer_id,
        status: OrderStatus::Pending,
        payment_method: payload.payment_method,
        total_amount: payload.total_amount,
        delivery_charge: payload.delivery_charge,
        items: payload.items,
        created_at: now,
        updated_at: now,
    };

    state.orders.insert(order.id, order.clone());
    Ok(Json(order))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .orders
        .get(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", id)))?;

    Ok(Json(order.value().clone()))
}
