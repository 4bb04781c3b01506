//! Liveness/readiness probing of the backing stores a pipeline depends on.
//!
//! Probers run on their own timer, independent of pipeline execution. The
//! host process serves the aggregated [`ReadinessReport`] over HTTP.

mod monitor;
mod prober;
mod store;

pub use monitor::{Monitor, ReadinessReport};
pub use prober::{Prober, Readiness};
pub use store::{CheckStatus, PingCheck, SizeCheck, StoreClient, StoreMetrics, StoreMonitor};
