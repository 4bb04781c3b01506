pub mod api;
pub mod config;
pub mod context;
pub mod error;
pub mod health;
pub mod metrics;
pub mod pipeline;
