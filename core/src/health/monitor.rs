use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tokio::time::MissedTickBehavior;

use crate::context::RunContext;

use super::prober::{Prober, Readiness};

/// Aggregated readiness, serialised as `{ kind: { subkind: contents } }`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReadinessReport {
    #[serde(flatten)]
    checks: BTreeMap<String, BTreeMap<String, serde_json::Value>>,
    #[serde(skip)]
    errors: Vec<String>,
}

impl ReadinessReport {
    pub fn record(&mut self, readiness: Readiness) {
        if let Some(err) = &readiness.error {
            self.errors
                .push(format!("{}/{}: {}", readiness.kind, readiness.subkind, err));
        }
        self.checks
            .entry(readiness.kind)
            .or_default()
            .insert(readiness.subkind, readiness.contents);
    }

    /// True when no check reported an error.
    pub fn is_ready(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn get(&self, kind: &str, subkind: &str) -> Option<&serde_json::Value> {
        self.checks.get(kind)?.get(subkind)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Registry of probers plus the loop that exercises them.
#[derive(Default)]
pub struct Monitor {
    probers: RwLock<Vec<Arc<dyn Prober>>>,
}

impl Monitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_prober(&self, prober: Arc<dyn Prober>) {
        tracing::debug!(prober = prober.name(), "prober registered");
        self.probers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(prober);
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Probe everything once. Returns the number of failed probers.
    pub async fn probe_all(&self, ctx: &RunContext) -> usize {
        let probers = self.snapshot();
        let results = join_all(probers.iter().map(|p| p.probe(ctx))).await;

        let mut failed = 0;
        for (prober, res) in probers.iter().zip(results) {
            if let Err(err) = res {
                failed += 1;
                tracing::warn!(prober = prober.name(), error = %err, "health probe failed");
            }
        }
        failed
    }

    /// Probe every `every` until `ctx` is cancelled. The first pass happens
    /// one interval after the call.
    pub async fn run_checks(&self, ctx: &RunContext, every: Duration) {
        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + every, every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ctx.cancelled() => {
                    tracing::debug!("health checks stopped");
                    return;
                }
                _ = ticker.tick() => {
                    self.probe_all(ctx).await;
                }
            }
        }
    }

    pub async fn readiness(&self, ctx: &RunContext) -> ReadinessReport {
        let probers = self.snapshot();
        let checks = join_all(probers.iter().map(|p| p.readiness(ctx))).await;

        let mut report = ReadinessReport::default();
        for check in checks {
            report.record(check);
        }
        report
    }

    fn snapshot(&self) -> Vec<Arc<dyn Prober>> {
        self.probers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::error::HealthError;

    struct FakeProber {
        name: &'static str,
        kind: &'static str,
        healthy: bool,
        probes: AtomicUsize,
    }

    impl FakeProber {
        fn new(name: &'static str, kind: &'static str, healthy: bool) -> Arc<Self> {
            Arc::new(Self {
                name,
                kind,
                healthy,
                probes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl Prober for FakeProber {
        fn name(&self) -> &str {
            self.name
        }

        async fn probe(&self, _ctx: &RunContext) -> Result<(), HealthError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.healthy {
                Ok(())
            } else {
                Err(HealthError::Cancelled { check: "fake" })
            }
        }

        async fn readiness(&self, _ctx: &RunContext) -> Readiness {
            let status = if self.healthy { "ok" } else { "err" };
            let contents = serde_json::json!({ "status": status });
            if self.healthy {
                Readiness::ok(self.kind, self.name, contents)
            } else {
                Readiness::failed(self.kind, self.name, contents, "unreachable")
            }
        }
    }

    #[tokio::test]
    async fn test_report_keyed_by_kind() {
        let monitor = Monitor::new();
        monitor.add_prober(FakeProber::new("postgres", "db", true));
        monitor.add_prober(FakeProber::new("redis", "cache", true));

        let report = monitor.readiness(&RunContext::new()).await;

        assert!(report.is_ready());
        assert_eq!(
            report.to_json(),
            serde_json::json!({
                "cache": { "redis": { "status": "ok" } },
                "db": { "postgres": { "status": "ok" } },
            })
        );
    }

    #[tokio::test]
    async fn test_one_failure_marks_report_not_ready() {
        let monitor = Monitor::new();
        monitor.add_prober(FakeProber::new("postgres", "db", true));
        monitor.add_prober(FakeProber::new("archive", "db", false));

        let report = monitor.readiness(&RunContext::new()).await;

        assert!(!report.is_ready());
        assert_eq!(report.errors(), ["db/archive: unreachable".to_string()]);
        assert_eq!(report.get("db", "archive").unwrap()["status"], "err");
    }

    #[tokio::test]
    async fn test_empty_monitor_is_ready() {
        let monitor = Monitor::new();
        assert!(monitor.is_empty());
        let report = monitor.readiness(&RunContext::new()).await;
        assert!(report.is_ready());
        assert_eq!(report.to_json(), serde_json::json!({}));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_checks_ticks_until_cancelled() {
        let monitor = Arc::new(Monitor::new());
        let good = FakeProber::new("a", "db", true);
        let bad = FakeProber::new("b", "db", false);
        monitor.add_prober(good.clone());
        monitor.add_prober(bad.clone());

        let ctx = RunContext::new();
        let handle = {
            let monitor = monitor.clone();
            let ctx = ctx.clone();
            tokio::spawn(async move { monitor.run_checks(&ctx, Duration::from_secs(10)).await })
        };

        tokio::time::sleep(Duration::from_secs(35)).await;
        ctx.cancel();
        handle.await.unwrap();

        assert_eq!(good.probes.load(Ordering::SeqCst), 3);
        assert_eq!(bad.probes.load(Ordering::SeqCst), 3);
    }
}
