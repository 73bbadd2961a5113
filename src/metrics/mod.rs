use std::sync::Once;

use autometrics::prometheus_exporter::{self, PrometheusResponse};
use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, register_histogram_vec, GaugeVec, HistogramVec, IntCounterVec, Opts,
    Registry,
};

lazy_static! {
    pub static ref ACQUIRE_ATTEMPTS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("acquire_attempts", "Lease acquire attempts by outcome"),
        &["watcher_id", "outcome"]
    )
    .expect("metric can not be created");

    pub static ref LEASE_RENEWALS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("lease_renewals", "Lease refresh results by outcome"),
        &["watcher_id", "outcome"]
    )
    .expect("metric can not be created");

    pub static ref EVENTS_HANDLED_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("events_handled", "Change events fully handled and checkpointed"),
        &["watcher_id"]
    )
    .expect("metric can not be created");

    pub static ref HANDLER_RETRIES_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("handler_retries", "Handler invocations that failed and were retried"),
        &["watcher_id"]
    )
    .expect("metric can not be created");

    pub static ref EPOCH_EXITS_METRIC: IntCounterVec = IntCounterVec::new(
        Opts::new("epoch_exits", "Ownership epoch exits by reason"),
        &["watcher_id", "reason"]
    )
    .expect("metric can not be created");

    pub static ref OWNERSHIP_ACTIVE_METRIC: GaugeVec = GaugeVec::new(
        Opts::new("ownership_active", "1 while this watcher holds the lease"),
        &["watcher_id"]
    )
    .expect("metric can not be created");

    pub static ref HANDLE_DURATION_METRIC: HistogramVec = register_histogram_vec!(
        "event_handle_duration_ms",
        "Histogram of per-event handler duration in ms",
        &["watcher_id"],
        exponential_buckets(1.0, 2.0, 12).unwrap()
    )
    .expect("metric can not be created");

    pub static ref REGISTRY: Registry = Registry::new();
}

static REGISTER: Once = Once::new();

/// Registers the watcher collectors and the autometrics exporter.
///
/// Idempotent. Called lazily by [`metrics_text`]; embedders exposing the
/// shared registry themselves should call it once at startup.
pub fn register_custom_metrics() {
    REGISTER.call_once(|| {
        prometheus_exporter::init();

        REGISTRY
            .register(Box::new(ACQUIRE_ATTEMPTS_METRIC.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(LEASE_RENEWALS_METRIC.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(EVENTS_HANDLED_METRIC.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(HANDLER_RETRIES_METRIC.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(EPOCH_EXITS_METRIC.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(OWNERSHIP_ACTIVE_METRIC.clone()))
            .expect("collector can be registered");
        REGISTRY
            .register(Box::new(HANDLE_DURATION_METRIC.clone()))
            .expect("collector can be registered");
    });
}

/// Renders every collector in Prometheus text form.
///
/// Merges the watcher registry, the default registry and the autometrics
/// exporter output into one scrape body.
pub fn metrics_text() -> String {
    use prometheus::Encoder;

    register_custom_metrics();

    let encoder = prometheus::TextEncoder::new();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        eprintln!("could not encode custom metrics: {}", e);
    };
    let mut res = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        eprintln!("could not encode prometheus metrics: {}", e);
    };
    let res_custom = match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("prometheus metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    };

    res.push_str(&res_custom);
    res.push_str(&get_metrics_body());
    res
}

/// Export metrics for Prometheus to scrape
pub fn get_metrics_body() -> String {
    let autometrics_response = prometheus_exporter::encode_http_response();
    autometrics_response.into_body()
}

/// Export metrics for Prometheus to scrape
pub fn get_metrics() -> PrometheusResponse {
    register_custom_metrics();
    prometheus_exporter::encode_http_response()
}
