use prometheus::{
    Encoder, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_published: IntGaugeVec,
    pub requests_created_total: IntCounter,
    pub storage_failures_total: IntCounterVec,
    pub refreshes_total: IntCounter,
    pub offline: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_published = IntGaugeVec::new(
            Opts::new("orders_published", "Orders in the published collection by provenance"),
            &["provenance"],
        )
        .expect("valid orders_published metric");

        let requests_created_total =
            IntCounter::new("requests_created_total", "Delivery requests created on-device")
                .expect("valid requests_created_total metric");

        let storage_failures_total = IntCounterVec::new(
            Opts::new("storage_failures_total", "Local order storage failures by operation"),
            &["operation"],
        )
        .expect("valid storage_failures_total metric");

        let refreshes_total = IntCounter::new("refreshes_total", "Order list refreshes")
            .expect("valid refreshes_total metric");

        let offline = IntGauge::new("offline", "1 while the device is considered offline")
            .expect("valid offline metric");

        registry
            .register(Box::new(orders_published.clone()))
            .expect("register orders_published");
        registry
            .register(Box::new(requests_created_total.clone()))
            .expect("register requests_created_total");
        registry
            .register(Box::new(storage_failures_total.clone()))
            .expect("register storage_failures_total");
        registry
            .register(Box::new(refreshes_total.clone()))
            .expect("register refreshes_total");
        registry
            .register(Box::new(offline.clone()))
            .expect("register offline");

        Self {
            registry,
            orders_published,
            requests_created_total,
            storage_failures_total,
            refreshes_total,
            offline,
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
