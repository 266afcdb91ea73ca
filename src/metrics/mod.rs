//! Prometheus metrics for monitoring
//!
//! Exposes metrics for:
//! - Request lifecycle counts per family
//! - Execute failures by error code
//! - Fees paid out to executors
//! - Keeper sweeps

use crate::request::RequestKind;

use alloy_primitives::U256;
use lazy_static::lazy_static;
use prometheus::{
    register_counter_vec, register_gauge_vec, CounterVec, Encoder, GaugeVec, TextEncoder,
};

lazy_static! {
    pub static ref REQUESTS_CREATED: CounterVec = register_counter_vec!(
        "router_requests_created_total",
        "Total requests submitted",
        &["kind"]
    ).unwrap();

    pub static ref REQUESTS_EXECUTED: CounterVec = register_counter_vec!(
        "router_requests_executed_total",
        "Total requests executed",
        &["kind"]
    ).unwrap();

    pub static ref REQUESTS_CANCELLED: CounterVec = register_counter_vec!(
        "router_requests_cancelled_total",
        "Total requests cancelled",
        &["kind"]
    ).unwrap();

    pub static ref EXECUTE_FAILED: CounterVec = register_counter_vec!(
        "router_execute_failed_total",
        "Execute attempts converted into cancellations, by error code",
        &["kind", "code"]
    ).unwrap();

    pub static ref EXECUTOR_FEES: CounterVec = register_counter_vec!(
        "router_executor_fees_wei_total",
        "Execution fees paid to executors",
        &["kind"]
    ).unwrap();

    pub static ref KEEPER_PENDING: GaugeVec = register_gauge_vec!(
        "router_keeper_pending_requests",
        "Requests tracked by the keeper",
        &[]
    ).unwrap();

    pub static ref KEEPER_SWEEPS: CounterVec = register_counter_vec!(
        "router_keeper_sweeps_total",
        "Total keeper sweeps",
        &[]
    ).unwrap();
}

/// Render every registered metric in the text exposition format
pub fn gather() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

// Helper functions to record metrics

pub fn record_request_created(kind: RequestKind) {
    REQUESTS_CREATED.with_label_values(&[kind.as_str()]).inc();
}

pub fn record_request_executed(kind: RequestKind, executor_fee: U256) {
    REQUESTS_EXECUTED.with_label_values(&[kind.as_str()]).inc();
    EXECUTOR_FEES
        .with_label_values(&[kind.as_str()])
        .inc_by(u128::try_from(executor_fee).unwrap_or(u128::MAX) as f64);
}

pub fn record_request_cancelled(kind: RequestKind) {
    REQUESTS_CANCELLED.with_label_values(&[kind.as_str()]).inc();
}

pub fn record_execute_failed(kind: RequestKind, code: &str) {
    EXECUTE_FAILED.with_label_values(&[kind.as_str(), code]).inc();
}

pub fn record_keeper_sweep(pending: usize) {
    KEEPER_SWEEPS.with_label_values(&[]).inc();
    KEEPER_PENDING.with_label_values(&[]).set(pending as f64);
}
