use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub shipments_created_total: IntCounter,
    pub webhook_events_total: IntCounterVec,
    pub status_refreshes_total: IntCounterVec,
    pub carrier_requests_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let shipments_created_total = IntCounter::new(
            "shipments_created_total",
            "Total shipments created with the carrier",
        )
        .expect("valid shipments_created_total metric");

        let webhook_events_total = IntCounterVec::new(
            Opts::new("webhook_events_total", "Carrier webhook deliveries by outcome"),
            &["outcome"],
        )
        .expect("valid webhook_events_total metric");

        let status_refreshes_total = IntCounterVec::new(
            Opts::new(
                "status_refreshes_total",
                "On-demand status refreshes by outcome",
            ),
            &["outcome"],
        )
        .expect("valid status_refreshes_total metric");

        let carrier_requests_total = IntCounterVec::new(
            Opts::new(
                "carrier_requests_total",
                "Outbound carrier API requests by endpoint and outcome",
            ),
            &["endpoint", "outcome"],
        )
        .expect("valid carrier_requests_total metric");

        registry
            .register(Box::new(shipments_created_total.clone()))
            .expect("register shipments_created_total");
        registry
            .register(Box::new(webhook_events_total.clone()))
            .expect("register webhook_events_total");
        registry
            .register(Box::new(status_refreshes_total.clone()))
            .expect("register status_refreshes_total");
        registry
            .register(Box::new(carrier_requests_total.clone()))
            .expect("register carrier_requests_total");

        Self {
            registry,
            shipments_created_total,
            webhook_events_total,
            status_refreshes_total,
            carrier_requests_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
