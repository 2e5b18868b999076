use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::activity::ActivityLog;
use crate::cache::TtlCache;
use crate::carrier::CarrierApi;
use crate::models::order::{Customer, Order};
use crate::models::shipment::{Shipment, ShipmentEvent};
use crate::observability::metrics::Metrics;

/// Name of the single integrated delivery partner.
pub const CARRIER_PARTNER: &str = "NCM";

pub struct AppState {
    pub customers: DashMap<Uuid, Customer>,
    pub orders: DashMap<Uuid, Order>,
    pub shipments: DashMap<Uuid, Shipment>,
    pub shipment_events: DashMap<Uuid, ShipmentEvent>,
    pub carrier: Arc<dyn CarrierApi>,
    pub cache: TtlCache,
    pub activity: ActivityLog,
    pub origin_branch: String,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(carrier: Arc<dyn CarrierApi>, origin_branch: String) -> Self {
        Self {
            customers: DashMap::new(),
            orders: DashMap::new(),
            shipments: DashMap::new(),
            shipment_events: DashMap::new(),
            carrier,
            cache: TtlCache::new(),
            activity: ActivityLog::new(),
            origin_branch,
            metrics: Metrics::new(),
        }
    }

    /// Shipments are keyed by their own id; the carrier's tracking id is the
    /// external lookup key.
    pub fn shipment_by_tracking_id(&self, tracking_id: &str) -> Option<Shipment> {
        self.shipments
            .iter()
            .find(|entry| entry.value().tracking_id == tracking_id)
            .map(|entry| entry.value().clone())
    }

    pub fn shipment_by_order_id(&self, order_id: Uuid) -> Option<Shipment> {
        self.shipments
            .iter()
            .find(|entry| entry.value().order_id == order_id)
            .map(|entry| entry.value().clone())
    }

    /// Event history for a shipment, most recent first.
    pub fn events_for_shipment(&self, shipment_id: Uuid) -> Vec<ShipmentEvent> {
        let mut events: Vec<ShipmentEvent> = self
            .shipment_events
            .iter()
            .filter(|entry| entry.value().shipment_id == shipment_id)
            .map(|entry| entry.value().clone())
            .collect();

        events.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        events
    }
}
