//! Metrics collection.
//!
//! # Metrics
//! - `record_chain_transactions_submitted_total` (counter): by kind (create, call)
//! - `record_chain_gas_fallback_total` (counter): estimations that fell back
//! - `record_chain_gas_used` (histogram): gas used per mined transaction, by kind
//! - `record_chain_read_calls_total` (counter): read-only calls, by function
//!
//! Recorded through the `metrics` facade; without an installed recorder
//! every call is a no-op.

use metrics::{counter, histogram};

pub fn record_transaction_submitted(kind: &'static str) {
    counter!("record_chain_transactions_submitted_total", "kind" => kind).increment(1);
}

pub fn record_gas_fallback() {
    counter!("record_chain_gas_fallback_total").increment(1);
}

pub fn record_gas_used(kind: &'static str, gas_used: u64) {
    histogram!("record_chain_gas_used", "kind" => kind).record(gas_used as f64);
}

pub fn record_read_call(function: &str) {
    counter!("record_chain_read_calls_total", "function" => function.to_string()).increment(1);
}
