use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HealthError {
    #[error("{check} timed out after {timeout:?}")]
    Timeout {
        check: &'static str,
        timeout: Duration,
    },
    #[error("{check} cancelled")]
    Cancelled { check: &'static str },
    #[error("{store}: ping failed: {source}")]
    Ping {
        store: String,
        source: anyhow::Error,
    },
    #[error("{store}: size query failed: {source}")]
    Size {
        store: String,
        source: anyhow::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    #[error("metric {0} already registered")]
    AlreadyRegistered(String),
    #[error("invalid metric name: {0:?}")]
    InvalidName(String),
    #[error("metric {metric} expects {expected} label value(s), got {got}")]
    LabelMismatch {
        metric: String,
        expected: usize,
        got: usize,
    },
    #[error("histogram {0} buckets must be finite and strictly increasing")]
    InvalidBuckets(String),
}
