use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Closed set of shipment states derived from the carrier's free-text
/// status vocabulary. Unknown carrier strings map to `InTransit`, never to
/// a terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    OrderCreated,
    PickedUp,
    InTransit,
    ArrivedAtDestinationHub,
    OutForDelivery,
    Delivered,
    DeliveryFailed,
    RtoInTransit,
    ReturnedToSender,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::OrderCreated => "ORDER_CREATED",
            ShipmentStatus::PickedUp => "PICKED_UP",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::ArrivedAtDestinationHub => "ARRIVED_AT_DESTINATION_HUB",
            ShipmentStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::DeliveryFailed => "DELIVERY_FAILED",
            ShipmentStatus::RtoInTransit => "RTO_IN_TRANSIT",
            ShipmentStatus::ReturnedToSender => "RETURNED_TO_SENDER",
        }
    }
}

/// One shipment per order. Recipient fields are a snapshot taken at
/// creation time; later customer edits do not flow back into it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub partner: String,
    pub carrier_order_id: Option<String>,
    pub tracking_id: String,
    pub system_status: ShipmentStatus,
    pub shipping_charge: f64,
    pub cod_amount: f64,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub recipient_address: String,
    pub destination_city: String,
    pub origin_city: String,
    pub package_description: String,
    pub carrier_response: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only record of an observed status transition. Never updated or
/// deleted; `occurred_at` is the carrier's own timestamp string and is not
/// required to parse as ISO-8601.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentEvent {
    pub id: Uuid,
    pub shipment_id: Uuid,
    pub carrier_status: String,
    pub vendor_return: Option<String>,
    pub system_status: ShipmentStatus,
    pub occurred_at: Option<String>,
    pub location: Option<String>,
    pub raw: Value,
    pub created_at: DateTime<Utc>,
}
