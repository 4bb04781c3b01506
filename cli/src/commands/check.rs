use indexer_core::api::{AppConfig, CliError, Registry, RunContext};
use indexer_plugins::factory;

/// Run every readiness check once, print the report as JSON and return the
/// process exit code (0 ready, 1 not ready).
pub async fn handle_check(cfg: &AppConfig) -> Result<i32, CliError> {
    let registry = Registry::new();
    let monitor = factory::build_monitor(cfg, &registry)?;
    if monitor.is_empty() {
        tracing::warn!("no stores configured; readiness is trivially ok");
    }

    let report = monitor.readiness(&RunContext::new()).await;
    let body = serde_json::to_string_pretty(&report.to_json())
        .map_err(|e| CliError::Command(format!("encode readiness report: {e}")))?;
    println!("{body}");

    for err in report.errors() {
        tracing::error!(error = %err, "readiness check failed");
    }
    Ok(if report.is_ready() { 0 } else { 1 })
}
