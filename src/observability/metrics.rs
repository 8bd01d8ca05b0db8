use prometheus::{Encoder, HistogramVec, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub fare_computations_total: IntCounterVec,
    pub fare_total_amount: HistogramVec,
    pub bookings_created_total: IntCounterVec,
    pub transitions_total: IntCounterVec,
    pub active_pricing_rules: IntGauge,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let fare_computations_total = IntCounterVec::new(
            Opts::new(
                "fare_computations_total",
                "Total fare computations by outcome",
            ),
            &["outcome"],
        )
        .expect("valid fare_computations_total metric");

        let fare_total_amount = HistogramVec::new(
            prometheus::HistogramOpts::new("fare_total_amount", "Computed fare totals")
                .buckets(vec![100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]),
            &["category"],
        )
        .expect("valid fare_total_amount metric");

        let bookings_created_total = IntCounterVec::new(
            Opts::new(
                "bookings_created_total",
                "Total bookings created by payment method",
            ),
            &["method"],
        )
        .expect("valid bookings_created_total metric");

        let transitions_total = IntCounterVec::new(
            Opts::new(
                "transitions_total",
                "Total lifecycle transitions by event and outcome",
            ),
            &["event", "outcome"],
        )
        .expect("valid transitions_total metric");

        let active_pricing_rules =
            IntGauge::new("active_pricing_rules", "Current number of pricing rules")
                .expect("valid active_pricing_rules metric");

        registry
            .register(Box::new(fare_computations_total.clone()))
            .expect("register fare_computations_total");
        registry
            .register(Box::new(fare_total_amount.clone()))
            .expect("register fare_total_amount");
        registry
            .register(Box::new(bookings_created_total.clone()))
            .expect("register bookings_created_total");
        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(active_pricing_rules.clone()))
            .expect("register active_pricing_rules");

        Self {
            registry,
            fare_computations_total,
            fare_total_amount,
            bookings_created_total,
            transitions_total,
            active_pricing_rules,
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
