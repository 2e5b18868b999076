use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};
use uuid::Uuid;

use crate::carrier::{first_f64, first_string, CreateOrderRequest, SERVICE_TYPE};
use crate::error::AppError;
use crate::mapping;
use crate::models::order::{OrderStatus, PaymentMethod};
use crate::models::shipment::{Shipment, ShipmentEvent, ShipmentStatus};
use crate::phone;
use crate::state::{AppState, CARRIER_PARTNER};

const BRANCH_LIST_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
const SHIPPING_RATE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Package descriptions are truncated before transmission; the carrier
/// rejects longer strings.
const PACKAGE_DESCRIPTION_MAX: usize = 50;

#[derive(Debug, Serialize)]
pub struct CreatedShipment {
    pub shipment_id: Uuid,
    pub tracking_id: String,
    pub system_status: ShipmentStatus,
    pub shipping_charge: f64,
    pub carrier_response: Value,
}

#[derive(Debug, Serialize)]
pub struct TrackedShipment {
    pub shipment: Shipment,
    pub events: Vec<ShipmentEvent>,
    pub carrier_status: Option<Value>,
    pub cached: bool,
}

#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub tracking_id: String,
    pub ignored: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_status: Option<ShipmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_status: Option<OrderStatus>,
    pub order_status_changed: bool,
}

impl WebhookAck {
    fn ignored(tracking_id: String) -> Self {
        Self {
            tracking_id,
            ignored: true,
            system_status: None,
            order_status: None,
            order_status_changed: false,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShipmentWithEvents {
    #[serde(flatten)]
    pub shipment: Shipment,
    pub events: Vec<ShipmentEvent>,
}

fn observe_carrier(state: &AppState, endpoint: &str, result: &Result<Value, AppError>) {
    let outcome = if result.is_ok() { "success" } else { "error" };
    state
        .metrics
        .carrier_requests_total
        .with_label_values(&[endpoint, outcome])
        .inc();
}

/// Create a shipment with the carrier for an order. Exactly one shipment may
/// exist per order; the carrier's create endpoint is never called when one
/// already does.
pub async fn create_shipment(
    state: &AppState,
    order_id: Uuid,
    destination_city: &str,
) -> Result<CreatedShipment, AppError> {
    let order = state
        .orders
        .get(&order_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("order {} not found", order_id)))?;

    let customer = state
        .customers
        .get(&order.customer_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("customer {} not found", order.customer_id)))?;

    if state.shipment_by_order_id(order_id).is_some() {
        return Err(AppError::Conflict(
            "shipment already exists for this order".to_string(),
        ));
    }

    let destination = destination_city.to_uppercase();

    let rate = state
        .carrier
        .shipping_rate(&state.origin_branch, &destination, SERVICE_TYPE)
        .await;
    observe_carrier(state, "shipping_rate", &rate);
    let rate = rate?;

    // COD is the full order total for cash-on-delivery orders; partial
    // payments are not prorated.
    let cod_amount = if order.payment_method == PaymentMethod::CashOnDelivery {
        order.total_amount
    } else {
        0.0
    };

    let package_description: String = order
        .items
        .iter()
        .map(|item| format!("{} x{}", item.product_name, item.quantity))
        .collect::<Vec<_>>()
        .join(", ")
        .chars()
        .take(PACKAGE_DESCRIPTION_MAX)
        .collect();

    let recipient_address = customer
        .address
        .clone()
        .or_else(|| customer.street.clone())
        .unwrap_or_default();

    let request = CreateOrderRequest {
        name: customer.name.clone(),
        phone: phone::clean_for_carrier(&customer.phone),
        phone2: customer
            .secondary_phone
            .as_deref()
            .map(phone::clean_for_carrier)
            .unwrap_or_default(),
        address: recipient_address.clone(),
        cod_charge: cod_amount.round() as i64,
        fbranch: state.origin_branch.clone(),
        branch: destination.clone(),
        package: package_description.clone(),
    };

    let carrier_response = state.carrier.create_order(&request).await;
    observe_carrier(state, "create_order", &carrier_response);
    let carrier_response = carrier_response?;

    // The carrier does not reliably echo a tracking id; a shipment must
    // never be left without a trackable identifier.
    let tracking_id = first_string(&carrier_response, &["tracking_id", "id", "order_id"])
        .unwrap_or_else(|| format!("NCM_{}", Uuid::new_v4()));
    let carrier_order_id = first_string(&carrier_response, &["order_id"]);

    let raw_status = first_string(&carrier_response, &["status"])
        .unwrap_or_else(|| "Drop off Order Created".to_string());
    let system_status = mapping::map_carrier_status(&raw_status, false);

    let shipping_charge = first_f64(&rate, &["charge"]).unwrap_or(order.delivery_charge);

    let now = Utc::now();
    let shipment = Shipment {
        id: Uuid::new_v4(),
        order_id,
        partner: CARRIER_PARTNER.to_string(),
        carrier_order_id,
        tracking_id: tracking_id.clone(),
        system_status,
        shipping_charge,
        cod_amount,
        recipient_name: customer.name.clone(),
        recipient_phone: phone::format_with_country_code(&customer.phone),
        recipient_address,
        destination_city: destination.clone(),
        origin_city: state.origin_branch.clone(),
        package_description,
        carrier_response: carrier_response.clone(),
        created_at: now,
        updated_at: now,
    };
    state.shipments.insert(shipment.id, shipment.clone());

    if order.status == OrderStatus::Pending {
        if let Some(mut stored) = state.orders.get_mut(&order_id) {
            stored.status = OrderStatus::Confirmed;
            stored.updated_at = now;
        }
    }

    state.metrics.shipments_created_total.inc();

    state.activity.record(
        "created",
        "shipment",
        &shipment.id.to_string(),
        &format!("NCM Shipment {tracking_id}"),
        json!({
            "order_id": order.id,
            "order_number": order.order_number,
            "tracking_id": tracking_id,
            "destination_city": destination,
            "cod_amount": cod_amount,
        }),
    );

    info!(
        order_id = %order_id,
        tracking_id = %tracking_id,
        status = system_status.as_str(),
        "shipment created"
    );

    Ok(CreatedShipment {
        shipment_id: shipment.id,
        tracking_id,
        system_status,
        shipping_charge,
        carrier_response,
    })
}

/// On-demand pull of the carrier's current status for a tracking id.
///
/// A carrier failure is downgraded to the last persisted state with
/// `cached: true` and no writes; the tracking page stays available through
/// carrier outages. A successful poll only writes when the *derived* status
/// differs from the stored one, so two raw strings mapping to the same
/// system status are a no-op.
pub async fn refresh_shipment(
    state: &AppState,
    tracking_id: &str,
) -> Result<TrackedShipment, AppError> {
    let shipment = state
        .shipment_by_tracking_id(tracking_id)
        .ok_or_else(|| AppError::NotFound(format!("shipment {} not found", tracking_id)))?;

    let status_result = state.carrier.order_status(tracking_id).await;
    observe_carrier(state, "order_status", &status_result);

    let carrier_payload = match status_result {
        Ok(payload) => payload,
        Err(err) => {
            warn!(
                tracking_id,
                error = %err,
                "carrier status fetch failed; serving last persisted state"
            );
            state
                .metrics
                .status_refreshes_total
                .with_label_values(&["degraded"])
                .inc();
            return Ok(TrackedShipment {
                events: state.events_for_shipment(shipment.id),
                shipment,
                carrier_status: None,
                cached: true,
            });
        }
    };

    state
        .metrics
        .status_refreshes_total
        .with_label_values(&["fresh"])
        .inc();

    let raw_status = first_string(&carrier_payload, &["status"]).unwrap_or_default();
    let is_rto = carrier_payload
        .get("vendor_return")
        .map(mapping::is_return_flag)
        .unwrap_or(false);

    let new_status = mapping::map_carrier_status(&raw_status, is_rto);
    if new_status == shipment.system_status {
        return Ok(TrackedShipment {
            events: state.events_for_shipment(shipment.id),
            shipment,
            carrier_status: Some(carrier_payload),
            cached: false,
        });
    }

    let new_order_status = mapping::map_carrier_order_status(&raw_status, is_rto);
    let now = Utc::now();

    if let Some(mut stored) = state.shipments.get_mut(&shipment.id) {
        stored.system_status = new_status;
        stored.updated_at = now;
    }

    let event = ShipmentEvent {
        id: Uuid::new_v4(),
        shipment_id: shipment.id,
        carrier_status: raw_status.clone(),
        vendor_return: first_string(&carrier_payload, &["vendor_return"]),
        system_status: new_status,
        occurred_at: Some(
            first_string(&carrier_payload, &["updated_at"]).unwrap_or_else(|| now.to_rfc3339()),
        ),
        location: first_string(&carrier_payload, &["location"]),
        raw: carrier_payload.clone(),
        created_at: now,
    };
    state.shipment_events.insert(event.id, event);

    // The order status follows every shipment-status change, without a guard
    // for terminal order states. A late out-of-order carrier update can move
    // a completed order back to processing.
    if let Some(mut order) = state.orders.get_mut(&shipment.order_id) {
        order.status = new_order_status;
        order.updated_at = now;
    }

    info!(
        tracking_id,
        from = shipment.system_status.as_str(),
        to = new_status.as_str(),
        "shipment status refreshed"
    );

    let refreshed = state
        .shipments
        .get(&shipment.id)
        .map(|entry| entry.value().clone())
        .unwrap_or(shipment);

    Ok(TrackedShipment {
        events: state.events_for_shipment(refreshed.id),
        shipment: refreshed,
        carrier_status: Some(carrier_payload),
        cached: false,
    })
}

/// Ingest a carrier webhook delivery.
///
/// The only hard failure is a payload without any usable tracking id.
/// Unknown tracking ids are acknowledged and ignored so the carrier does not
/// retry ids that are stale or belong to another vendor. Every accepted
/// delivery writes an event; redeliveries of the same status produce
/// duplicate rows (at-least-once semantics).
pub async fn process_webhook(state: &AppState, payload: Value) -> Result<WebhookAck, AppError> {
    let Some(tracking_id) = first_string(&payload, &["tracking_id", "id", "order_id"]) else {
        state
            .metrics
            .webhook_events_total
            .with_label_values(&["rejected"])
            .inc();
        return Err(AppError::BadRequest("tracking_id is required".to_string()));
    };

    let Some(shipment) = state.shipment_by_tracking_id(&tracking_id) else {
        warn!(%tracking_id, "webhook for unknown tracking id ignored");
        state
            .metrics
            .webhook_events_total
            .with_label_values(&["ignored"])
            .inc();
        return Ok(WebhookAck::ignored(tracking_id));
    };

    let raw_status = first_string(&payload, &["status"]).unwrap_or_default();
    let is_rto = payload
        .get("vendor_return")
        .map(mapping::is_return_flag)
        .unwrap_or(false);
    let occurred_at = first_string(&payload, &["updated_at", "timestamp"])
        .unwrap_or_else(|| Utc::now().to_rfc3339());
    let location = first_string(&payload, &["location", "branch"]);

    let system_status = mapping::map_carrier_status(&raw_status, is_rto);
    let order_status = mapping::map_carrier_order_status(&raw_status, is_rto);

    let now = Utc::now();
    let event = ShipmentEvent {
        id: Uuid::new_v4(),
        shipment_id: shipment.id,
        carrier_status: raw_status.clone(),
        vendor_return: first_string(&payload, &["vendor_return"]),
        system_status,
        occurred_at: Some(occurred_at),
        location: location.clone(),
        raw: payload.clone(),
        created_at: now,
    };
    state.shipment_events.insert(event.id, event);

    if let Some(mut stored) = state.shipments.get_mut(&shipment.id) {
        stored.system_status = system_status;
        stored.updated_at = now;
    }

    let order = state
        .orders
        .get(&shipment.order_id)
        .map(|entry| entry.value().clone());
    let previous_order_status = order.as_ref().map(|o| o.status);
    let order_number = order
        .as_ref()
        .map(|o| o.order_number.clone())
        .unwrap_or_default();

    let order_status_changed = previous_order_status.is_some_and(|prev| prev != order_status);

    if order_status_changed {
        if let Some(mut stored) = state.orders.get_mut(&shipment.order_id) {
            stored.status = order_status;
            stored.updated_at = now;
        }

        state.activity.record(
            "updated",
            "order",
            &shipment.order_id.to_string(),
            &order_number,
            json!({
                "field": "status",
                "old_value": previous_order_status,
                "new_value": order_status,
                "reason": "carrier delivery status update",
                "carrier_status": raw_status,
                "tracking_id": tracking_id,
            }),
        );
    }

    state.activity.record(
        "updated",
        "shipment",
        &shipment.id.to_string(),
        &format!("NCM Shipment {tracking_id}"),
        json!({
            "order_id": shipment.order_id,
            "order_number": order_number,
            "carrier_status": raw_status,
            "system_status": system_status,
            "location": location,
            "order_status_changed": order_status_changed,
        }),
    );

    state
        .metrics
        .webhook_events_total
        .with_label_values(&["processed"])
        .inc();

    info!(
        %tracking_id,
        carrier_status = %raw_status,
        system_status = system_status.as_str(),
        order_status_changed,
        "webhook processed"
    );

    Ok(WebhookAck {
        tracking_id,
        ignored: false,
        system_status: Some(system_status),
        order_status: Some(order_status),
        order_status_changed,
    })
}

/// Current shipment for an order, if any, with its full event history.
pub fn shipment_for_order(state: &AppState, order_id: Uuid) -> Option<ShipmentWithEvents> {
    let shipment = state.shipment_by_order_id(order_id)?;
    let events = state.events_for_shipment(shipment.id);
    Some(ShipmentWithEvents { shipment, events })
}

/// Branch list, memoized; branches change rarely.
pub async fn cached_branch_list(state: &AppState) -> Result<Value, AppError> {
    state
        .cache
        .get_or_compute("ncm:branchlist", BRANCH_LIST_TTL, || async {
            let result = state.carrier.branch_list().await;
            observe_carrier(state, "branch_list", &result);
            result
        })
        .await
}

/// Shipping rate for a destination, memoized per destination.
pub async fn cached_shipping_rate(state: &AppState, destination: &str) -> Result<Value, AppError> {
    let destination = destination.to_uppercase();
    let key = format!("ncm:rate:{destination}");

    state
        .cache
        .get_or_compute(&key, SHIPPING_RATE_TTL, || async {
            let result = state
                .carrier
                .shipping_rate(&state.origin_branch, &destination, SERVICE_TYPE)
                .await;
            observe_carrier(state, "shipping_rate", &result);
            result
        })
        .await
}
