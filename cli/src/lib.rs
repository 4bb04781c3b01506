//! indexer-cli library: modules exposed for the binary and its tests.

pub mod commands;
pub mod http;
pub mod logging;
