use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::context::RunContext;
use crate::error::{HealthError, MetricsError};
use crate::metrics::{Gauge, GaugeVec, Histogram, HistogramOptions, HistogramVec, Options, Registry};

use super::prober::{Prober, Readiness};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(3);

/// Minimal surface a backing store exposes for health checks.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Store label used in readiness reports and metric labels.
    fn name(&self) -> &str;

    async fn ping(&self) -> anyhow::Result<()>;

    /// Size in bytes, or `None` if the store cannot report it.
    async fn size(&self) -> anyhow::Result<Option<u64>> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Err,
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingCheck {
    pub on: DateTime<Utc>,
    pub duration_ms: u64,
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeCheck {
    pub on: DateTime<Utc>,
    pub size: u64,
    pub status: CheckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Metric families shared by every store monitor.
#[derive(Clone)]
pub struct StoreMetrics {
    pub ping: HistogramVec,
    pub size: GaugeVec,
}

impl StoreMetrics {
    /// Register `indexer_database_ping_duration_seconds` and
    /// `indexer_database_size_bytes`, both labeled by `database`.
    pub fn register(registry: &Registry) -> Result<Self, MetricsError> {
        let ping = registry.histogram(
            HistogramOptions::new("ping_duration_seconds", "Duration of backing store pings")
                .namespace("indexer")
                .subsystem("database")
                .tags(["database"]),
        )?;
        let size = registry.gauge(
            Options::new("size_bytes", "Size of the backing store in bytes")
                .namespace("indexer")
                .subsystem("database")
                .tags(["database"]),
        )?;
        Ok(Self { ping, size })
    }
}

struct StoreHandles {
    ping: Histogram,
    size: Gauge,
}

/// [`Prober`] for any [`StoreClient`].
///
/// `probe` pings and then measures size; `readiness` only pings. Every call
/// to the store runs under the configured timeout (3s by default).
pub struct StoreMonitor<S> {
    client: S,
    timeout: Duration,
    metrics: Option<StoreHandles>,
    last_ping: Mutex<Option<PingCheck>>,
    last_size: Mutex<Option<SizeCheck>>,
}

impl<S: StoreClient> StoreMonitor<S> {
    pub fn new(client: S) -> Self {
        Self {
            client,
            timeout: DEFAULT_TIMEOUT,
            metrics: None,
            last_ping: Mutex::new(None),
            last_size: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Record ping durations and sizes under this store's label.
    pub fn with_metrics(mut self, metrics: &StoreMetrics) -> Result<Self, MetricsError> {
        let label = [self.client.name()];
        self.metrics = Some(StoreHandles {
            ping: metrics.ping.with_labels(&label)?,
            size: metrics.size.with_labels(&label)?,
        });
        Ok(self)
    }

    pub fn client(&self) -> &S {
        &self.client
    }

    pub fn last_ping(&self) -> Option<PingCheck> {
        self.last_ping
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_size(&self) -> Option<SizeCheck> {
        self.last_size
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    async fn bounded<T, F>(&self, ctx: &RunContext, check: &'static str, fut: F) -> Result<T, HealthError>
    where
        F: Future<Output = T>,
    {
        match ctx.run_until_cancelled(tokio::time::timeout(self.timeout, fut)).await {
            Ok(Ok(out)) => Ok(out),
            Ok(Err(_elapsed)) => Err(HealthError::Timeout {
                check,
                timeout: self.timeout,
            }),
            Err(_) => Err(HealthError::Cancelled { check }),
        }
    }

    async fn ping(&self, ctx: &RunContext) -> Result<(), HealthError> {
        let on = Utc::now();
        let start = Instant::now();
        let res = match self.bounded(ctx, "ping", self.client.ping()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(HealthError::Ping {
                store: self.client.name().to_string(),
                source,
            }),
            Err(err) => Err(err),
        };
        let elapsed = start.elapsed();

        let check = PingCheck {
            on,
            duration_ms: elapsed.as_millis() as u64,
            status: if res.is_ok() { CheckStatus::Ok } else { CheckStatus::Err },
            error: res.as_ref().err().map(ToString::to_string),
        };
        if let Err(err) = &res {
            tracing::error!(store = self.client.name(), error = %err, "error pinging database");
        }
        if let Some(m) = &self.metrics {
            m.ping.observe(elapsed.as_secs_f64());
        }
        *self.last_ping.lock().unwrap_or_else(PoisonError::into_inner) = Some(check);
        res
    }

    async fn measure_size(&self, ctx: &RunContext) -> Result<(), HealthError> {
        let on = Utc::now();
        let res = match self.bounded(ctx, "size", self.client.size()).await {
            Ok(Ok(size)) => Ok(size),
            Ok(Err(source)) => Err(HealthError::Size {
                store: self.client.name().to_string(),
                source,
            }),
            Err(err) => Err(err),
        };

        let check = match &res {
            Ok(Some(size)) => SizeCheck {
                on,
                size: *size,
                status: CheckStatus::Ok,
                error: None,
            },
            Ok(None) => SizeCheck {
                on,
                size: 0,
                status: CheckStatus::Unsupported,
                error: None,
            },
            Err(err) => {
                tracing::error!(store = self.client.name(), error = %err, "error getting database size");
                SizeCheck {
                    on,
                    size: 0,
                    status: CheckStatus::Err,
                    error: Some(err.to_string()),
                }
            }
        };
        if let (Some(m), Ok(Some(size))) = (&self.metrics, &res) {
            m.size.set(*size as f64);
        }
        *self.last_size.lock().unwrap_or_else(PoisonError::into_inner) = Some(check);
        res.map(|_| ())
    }
}

#[async_trait]
impl<S: StoreClient> Prober for StoreMonitor<S> {
    fn name(&self) -> &str {
        self.client.name()
    }

    async fn probe(&self, ctx: &RunContext) -> Result<(), HealthError> {
        self.ping(ctx).await?;
        self.measure_size(ctx).await
    }

    async fn readiness(&self, ctx: &RunContext) -> Readiness {
        let res = self.ping(ctx).await;
        let contents = self
            .last_ping()
            .and_then(|check| serde_json::to_value(check).ok())
            .unwrap_or(serde_json::Value::Null);
        match res {
            Ok(()) => Readiness::ok("db", self.client.name(), contents),
            Err(err) => Readiness::failed("db", self.client.name(), contents, err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FakeStore {
        up: AtomicBool,
        size: Option<u64>,
        hang: bool,
    }

    impl FakeStore {
        fn up(size: Option<u64>) -> Self {
            Self {
                up: AtomicBool::new(true),
                size,
                hang: false,
            }
        }
    }

    #[async_trait]
    impl StoreClient for FakeStore {
        fn name(&self) -> &str {
            "fake"
        }

        async fn ping(&self) -> anyhow::Result<()> {
            if self.hang {
                futures::future::pending::<()>().await;
            }
            if self.up.load(Ordering::SeqCst) {
                Ok(())
            } else {
                anyhow::bail!("connection refused")
            }
        }

        async fn size(&self) -> anyhow::Result<Option<u64>> {
            Ok(self.size)
        }
    }

    #[tokio::test]
    async fn test_probe_records_checks_and_metrics() {
        let registry = Registry::new();
        let metrics = StoreMetrics::register(&registry).unwrap();
        let monitor = StoreMonitor::new(FakeStore::up(Some(4096)))
            .with_metrics(&metrics)
            .unwrap();

        monitor.probe(&RunContext::new()).await.unwrap();

        assert_eq!(monitor.last_ping().unwrap().status, CheckStatus::Ok);
        let size = monitor.last_size().unwrap();
        assert_eq!((size.size, size.status), (4096, CheckStatus::Ok));

        let text = registry.render();
        assert!(text.contains(r#"indexer_database_size_bytes{database="fake"} 4096"#));
        assert!(text.contains(r#"indexer_database_ping_duration_seconds_count{database="fake"} 1"#));
    }

    #[tokio::test]
    async fn test_unsupported_size_is_not_an_error() {
        let monitor = StoreMonitor::new(FakeStore::up(None));
        monitor.probe(&RunContext::new()).await.unwrap();
        assert_eq!(monitor.last_size().unwrap().status, CheckStatus::Unsupported);
    }

    #[tokio::test]
    async fn test_failed_ping_skips_size_and_fails_readiness() {
        let store = FakeStore::up(Some(1));
        store.up.store(false, Ordering::SeqCst);
        let monitor = StoreMonitor::new(store);
        let ctx = RunContext::new();

        let err = monitor.probe(&ctx).await.unwrap_err();
        assert!(matches!(err, HealthError::Ping { .. }));
        assert!(monitor.last_size().is_none());

        let readiness = monitor.readiness(&ctx).await;
        assert!(!readiness.is_ready());
        assert_eq!(readiness.kind, "db");
        assert_eq!(readiness.subkind, "fake");
        assert_eq!(readiness.contents["status"], "err");
        assert_eq!(readiness.contents["error"], "fake: ping failed: connection refused");
        assert!(readiness.contents["duration_ms"].is_u64());
        assert!(readiness.contents["on"].is_string());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_ping_times_out() {
        let monitor = StoreMonitor::new(FakeStore {
            up: AtomicBool::new(true),
            size: None,
            hang: true,
        })
        .with_timeout(Duration::from_millis(500));

        let err = monitor.probe(&RunContext::new()).await.unwrap_err();
        assert!(matches!(err, HealthError::Timeout { check: "ping", .. }));
        assert_eq!(monitor.last_ping().unwrap().status, CheckStatus::Err);
    }

    #[tokio::test]
    async fn test_cancelled_context_aborts_ping() {
        let monitor = StoreMonitor::new(FakeStore::up(None));
        let ctx = RunContext::new();
        ctx.cancel();

        let err = monitor.probe(&ctx).await.unwrap_err();
        assert!(matches!(err, HealthError::Cancelled { check: "ping" }));
    }
}
