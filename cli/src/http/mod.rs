//! HTTP surface: liveness, readiness and Prometheus metrics.

pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use state::AppState;
