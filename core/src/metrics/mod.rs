//! Labeled counters, gauges and histograms with Prometheus text exposition.
//!
//! There is no process-wide registry: callers create a [`Registry`], register
//! the families they need once at startup and thread the returned handles
//! into the components that record observations.

mod registry;
mod render;
mod types;

pub use registry::{Counter, CounterVec, Gauge, GaugeVec, Histogram, HistogramVec, Registry};
pub use types::{HistogramOptions, Options, DEFAULT_BUCKETS};
