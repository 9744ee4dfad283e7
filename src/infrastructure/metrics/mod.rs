//! Prometheus Metrics Module
//!
//! Provides application-wide metrics collection using Prometheus.
//!
//! # Metrics Collected
//! - HTTP request counts by method, path, and status
//! - Active WebSocket connection gauges
//! - Room subscription gauges
//! - Messages persisted and broadcast, by kind

use once_cell::sync::Lazy;
use prometheus::{Encoder, GaugeVec, IntCounterVec, Opts, Registry, TextEncoder};

/// Global metrics registry
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

/// HTTP request counter - tracks total requests by method, path, and status code
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("http_requests_total", "Total number of HTTP requests").namespace("connectly"),
        &["method", "path", "status"],
    )
    .expect("Failed to create HTTP_REQUESTS_TOTAL metric")
});

/// Active WebSocket connections gauge
pub static GATEWAY_CONNECTIONS_ACTIVE: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new(
            "gateway_connections_active",
            "Number of active WebSocket connections",
        )
        .namespace("connectly"),
        &["state"], // "connected", "identified"
    )
    .expect("Failed to create GATEWAY_CONNECTIONS_ACTIVE metric")
});

/// Room subscription gauge
pub static GATEWAY_ROOM_SUBSCRIPTIONS: Lazy<GaugeVec> = Lazy::new(|| {
    GaugeVec::new(
        Opts::new(
            "gateway_room_subscriptions",
            "Number of live room subscriptions",
        )
        .namespace("connectly"),
        &["kind"], // "dm", "channel"
    )
    .expect("Failed to create GATEWAY_ROOM_SUBSCRIPTIONS metric")
});

/// Messages persisted counter
pub static MESSAGES_PERSISTED_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("messages_persisted_total", "Messages durably persisted").namespace("connectly"),
        &["kind", "path"], // kind: "dm"|"channel", path: "gateway"|"rest"
    )
    .expect("Failed to create MESSAGES_PERSISTED_TOTAL metric")
});

/// Messages broadcast counter
pub static MESSAGES_BROADCAST_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "messages_broadcast_total",
            "Messages fanned out to live subscribers",
        )
        .namespace("connectly"),
        &["kind"],
    )
    .expect("Failed to create MESSAGES_BROADCAST_TOTAL metric")
});

/// Register all metrics with the registry
fn register_metrics(registry: &Registry) {
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .expect("Failed to register HTTP_REQUESTS_TOTAL");
    registry
        .register(Box::new(GATEWAY_CONNECTIONS_ACTIVE.clone()))
        .expect("Failed to register GATEWAY_CONNECTIONS_ACTIVE");
    registry
        .register(Box::new(GATEWAY_ROOM_SUBSCRIPTIONS.clone()))
        .expect("Failed to register GATEWAY_ROOM_SUBSCRIPTIONS");
    registry
        .register(Box::new(MESSAGES_PERSISTED_TOTAL.clone()))
        .expect("Failed to register MESSAGES_PERSISTED_TOTAL");
    registry
        .register(Box::new(MESSAGES_BROADCAST_TOTAL.clone()))
        .expect("Failed to register MESSAGES_BROADCAST_TOTAL");
}

/// Collect and encode all metrics as Prometheus text format
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Metrics should be valid UTF-8")
}

/// Helper to record a completed HTTP request
pub fn record_http_request(method: &str, path: &str, status: &str) {
    HTTP_REQUESTS_TOTAL
        .with_label_values(&[method, path, status])
        .inc();
}

/// Helper to record a persisted message
pub fn record_message_persisted(kind: &str, path: &str) {
    MESSAGES_PERSISTED_TOTAL.with_label_values(&[kind, path]).inc();
}

/// Helper to record a broadcast fan-out
pub fn record_message_broadcast(kind: &str) {
    MESSAGES_BROADCAST_TOTAL.with_label_values(&[kind]).inc();
}

/// Helpers to track WebSocket connection counts
pub fn inc_gateway_connections(state: &str) {
    GATEWAY_CONNECTIONS_ACTIVE.with_label_values(&[state]).inc();
}

pub fn dec_gateway_connections(state: &str) {
    GATEWAY_CONNECTIONS_ACTIVE.with_label_values(&[state]).dec();
}

/// Helpers to track live room subscriptions
pub fn inc_room_subscriptions(kind: &str) {
    GATEWAY_ROOM_SUBSCRIPTIONS.with_label_values(&[kind]).inc();
}

pub fn dec_room_subscriptions(kind: &str) {
    GATEWAY_ROOM_SUBSCRIPTIONS.with_label_values(&[kind]).dec();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_registration() {
        // Force lazy initialization
        let _ = &*REGISTRY;
        let _ = &*HTTP_REQUESTS_TOTAL;
        let _ = &*GATEWAY_CONNECTIONS_ACTIVE;
        let _ = &*MESSAGES_PERSISTED_TOTAL;
    }

    #[test]
    fn test_gather_metrics() {
        record_message_persisted("dm", "gateway");
        let metrics = gather_metrics();
        assert!(metrics.contains("messages_persisted_total"));
    }
}
