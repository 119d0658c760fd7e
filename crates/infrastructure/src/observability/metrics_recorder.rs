//! Metric names and recording helpers for the hub

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};

pub const SERVICE_REQUESTS_TOTAL: &str = "hub_service_requests_total";
pub const SERVICE_ERRORS_TOTAL: &str = "hub_service_errors_total";
pub const SERVICE_RESPONSE_TIME_MS: &str = "hub_service_response_time_ms";
pub const SERVICE_UNAVAILABLE_TOTAL: &str = "hub_service_unavailable_total";
pub const SERVICE_HEALTHY: &str = "hub_service_healthy";
pub const SYSTEM_HEALTH_PERCENT: &str = "hub_system_health_percent";
pub const HEALTH_SWEEP_DURATION_MS: &str = "hub_health_sweep_duration_ms";
pub const CACHE_HITS_TOTAL: &str = "hub_cache_hits_total";
pub const CACHE_MISSES_TOTAL: &str = "hub_cache_misses_total";
pub const EVENTS_PUBLISHED_TOTAL: &str = "hub_events_published_total";
pub const SUBSCRIBER_FAILURES_TOTAL: &str = "hub_subscriber_failures_total";

/// Register descriptions with the installed recorder
pub fn describe_metrics() {
    describe_counter!(SERVICE_REQUESTS_TOTAL, "Downstream calls made through the dispatcher");
    describe_counter!(SERVICE_ERRORS_TOTAL, "Downstream calls that failed or timed out");
    describe_histogram!(
        SERVICE_RESPONSE_TIME_MS,
        Unit::Milliseconds,
        "Downstream call latency"
    );
    describe_counter!(
        SERVICE_UNAVAILABLE_TOTAL,
        "Calls rejected because the target service was not healthy"
    );
    describe_gauge!(SERVICE_HEALTHY, "1 when the service passed its last probe");
    describe_gauge!(SYSTEM_HEALTH_PERCENT, Unit::Percent, "Share of healthy services");
    describe_histogram!(
        HEALTH_SWEEP_DURATION_MS,
        Unit::Milliseconds,
        "Duration of a full health sweep"
    );
    describe_counter!(CACHE_HITS_TOTAL, "Result cache hits");
    describe_counter!(CACHE_MISSES_TOTAL, "Result cache misses");
    describe_counter!(EVENTS_PUBLISHED_TOTAL, "Events published on the event bus");
    describe_counter!(SUBSCRIBER_FAILURES_TOTAL, "Event subscribers that failed or panicked");
}

pub fn record_service_call(service: &str, response_time_ms: f64, is_error: bool) {
    let service = service.to_string();
    counter!(SERVICE_REQUESTS_TOTAL, "service" => service.clone()).increment(1);
    if is_error {
        counter!(SERVICE_ERRORS_TOTAL, "service" => service.clone()).increment(1);
    }
    histogram!(SERVICE_RESPONSE_TIME_MS, "service" => service).record(response_time_ms);
}

pub fn record_service_unavailable(service: &str) {
    counter!(SERVICE_UNAVAILABLE_TOTAL, "service" => service.to_string()).increment(1);
}

pub fn record_service_health(service: &str, healthy: bool) {
    gauge!(SERVICE_HEALTHY, "service" => service.to_string()).set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_health_sweep(system_health_percent: u8, duration_ms: f64) {
    gauge!(SYSTEM_HEALTH_PERCENT).set(f64::from(system_health_percent));
    histogram!(HEALTH_SWEEP_DURATION_MS).record(duration_ms);
}

pub fn record_cache_lookup(hit: bool) {
    if hit {
        counter!(CACHE_HITS_TOTAL).increment(1);
    } else {
        counter!(CACHE_MISSES_TOTAL).increment(1);
    }
}

pub fn record_event_published(event: &str, failed_subscribers: usize) {
    counter!(EVENTS_PUBLISHED_TOTAL, "event" => event.to_string()).increment(1);
    if failed_subscribers > 0 {
        counter!(SUBSCRIBER_FAILURES_TOTAL, "event" => event.to_string())
            .increment(failed_subscribers as u64);
    }
}
