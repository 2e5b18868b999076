use serde_json::Value;

use crate::models::order::OrderStatus;
use crate::models::shipment::ShipmentStatus;

/// How a rule matches the carrier's raw status string.
#[derive(Debug, Clone, Copy)]
enum Match {
    Exact(&'static str),
    Prefix(&'static str),
}

impl Match {
    fn matches(&self, raw: &str) -> bool {
        match self {
            Match::Exact(s) => raw == *s,
            Match::Prefix(s) => raw.starts_with(s),
        }
    }
}

type Rule = (Match, ShipmentStatus, OrderStatus);

/// Rules for parcels being routed back to the sender. Order matters:
/// evaluated top to bottom, first match wins.
const RTO_RULES: &[Rule] = &[
    (
        Match::Prefix("Dispatched to"),
        ShipmentStatus::RtoInTransit,
        OrderStatus::Processing,
    ),
    (
        Match::Prefix("Arrived at"),
        ShipmentStatus::RtoInTransit,
        OrderStatus::Processing,
    ),
    (
        Match::Exact("Returned to Sender"),
        ShipmentStatus::ReturnedToSender,
        OrderStatus::Cancelled,
    ),
];

const RTO_DEFAULT: (ShipmentStatus, OrderStatus) =
    (ShipmentStatus::RtoInTransit, OrderStatus::Processing);

/// Rules for the forward delivery flow. "Dispatched to"/"Arrived at" are
/// prefixes because the carrier appends the hub name.
const FORWARD_RULES: &[Rule] = &[
    (
        Match::Exact("Drop off Order Created"),
        ShipmentStatus::OrderCreated,
        OrderStatus::Confirmed,
    ),
    (
        Match::Exact("Drop off Order Collected"),
        ShipmentStatus::PickedUp,
        OrderStatus::Processing,
    ),
    (
        Match::Prefix("Dispatched to"),
        ShipmentStatus::InTransit,
        OrderStatus::Processing,
    ),
    (
        Match::Prefix("Arrived at"),
        ShipmentStatus::ArrivedAtDestinationHub,
        OrderStatus::Processing,
    ),
    (
        Match::Exact("Sent for Delivery"),
        ShipmentStatus::OutForDelivery,
        OrderStatus::Processing,
    ),
    (
        Match::Exact("Delivered"),
        ShipmentStatus::Delivered,
        OrderStatus::Completed,
    ),
    (
        Match::Exact("Delivery Failed"),
        ShipmentStatus::DeliveryFailed,
        OrderStatus::DeliveryFailed,
    ),
];

// Unknown carrier strings stay in transit rather than landing on a
// terminal state.
const FORWARD_DEFAULT: (ShipmentStatus, OrderStatus) =
    (ShipmentStatus::InTransit, OrderStatus::Processing);

fn lookup(raw: &str, is_rto: bool) -> (ShipmentStatus, OrderStatus) {
    let (rules, default) = if is_rto {
        (RTO_RULES, RTO_DEFAULT)
    } else {
        (FORWARD_RULES, FORWARD_DEFAULT)
    };

    rules
        .iter()
        .find(|(m, _, _)| m.matches(raw))
        .map(|(_, shipment, order)| (*shipment, *order))
        .unwrap_or(default)
}

pub fn map_carrier_status(raw: &str, is_rto: bool) -> ShipmentStatus {
    lookup(raw, is_rto).0
}

pub fn map_carrier_order_status(raw: &str, is_rto: bool) -> OrderStatus {
    lookup(raw, is_rto).1
}

/// The carrier reports the return-to-origin flag as either a JSON boolean
/// or the string "True"/"False".
pub fn is_return_flag(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "True",
        _ => false,
    }
}
