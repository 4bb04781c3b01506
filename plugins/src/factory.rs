use std::sync::Arc;

use anyhow::Result;

use indexer_core::config::AppConfig;
use indexer_core::health::{Monitor, Prober, StoreMetrics, StoreMonitor};
use indexer_core::metrics::Registry;

use crate::health::TcpStoreClient;

/// One [`StoreMonitor`] per configured store, sharing the store metric
/// families registered on `registry`.
pub fn build_probers(cfg: &AppConfig, registry: &Registry) -> Result<Vec<Arc<dyn Prober>>> {
    let metrics = StoreMetrics::register(registry)?;
    let timeout = cfg.health.probe_timeout();

    let mut probers: Vec<Arc<dyn Prober>> = Vec::with_capacity(cfg.health.stores.len());
    for store in &cfg.health.stores {
        let client = TcpStoreClient::new(store.name.clone(), store.address.clone());
        let monitor = StoreMonitor::new(client)
            .with_timeout(timeout)
            .with_metrics(&metrics)?;
        probers.push(Arc::new(monitor));
    }
    Ok(probers)
}

pub fn build_monitor(cfg: &AppConfig, registry: &Registry) -> Result<Monitor> {
    let monitor = Monitor::new();
    for prober in build_probers(cfg, registry)? {
        monitor.add_prober(prober);
    }
    Ok(monitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexer_core::config::StoreConfig;
    use indexer_core::context::RunContext;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_monitor_reports_each_store() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let up = listener.local_addr().unwrap().to_string();
        let closed = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let down = closed.local_addr().unwrap().to_string();
        drop(closed);

        let mut cfg = AppConfig::default();
        cfg.health.probe_timeout_ms = 500;
        cfg.health.stores = vec![
            StoreConfig {
                name: "primary".into(),
                address: up,
            },
            StoreConfig {
                name: "archive".into(),
                address: down,
            },
        ];

        let registry = Registry::new();
        let monitor = build_monitor(&cfg, &registry).unwrap();
        assert_eq!(monitor.len(), 2);

        let report = monitor.readiness(&RunContext::new()).await;
        assert!(!report.is_ready());
        let body = report.to_json();
        assert_eq!(body["db"]["primary"]["status"], serde_json::json!("ok"));
        assert_eq!(body["db"]["archive"]["status"], serde_json::json!("err"));
        assert!(registry
            .render()
            .contains(r#"indexer_database_ping_duration_seconds_count{database="primary"} 1"#));
    }

    #[test]
    fn test_registering_twice_fails() {
        let registry = Registry::new();
        let cfg = AppConfig::default();
        build_probers(&cfg, &registry).unwrap();
        assert!(build_probers(&cfg, &registry).is_err());
    }
}
