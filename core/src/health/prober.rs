use async_trait::async_trait;
use serde::Serialize;

use crate::context::RunContext;
use crate::error::HealthError;

/// Result of one readiness check.
#[derive(Debug, Clone, Serialize)]
pub struct Readiness {
    /// Check family, e.g. `"db"`. Top-level key of the readiness report.
    pub kind: String,
    /// Instance within the family, e.g. `"postgres"`.
    pub subkind: String,
    pub contents: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Readiness {
    pub fn ok(
        kind: impl Into<String>,
        subkind: impl Into<String>,
        contents: serde_json::Value,
    ) -> Self {
        Self {
            kind: kind.into(),
            subkind: subkind.into(),
            contents,
            error: None,
        }
    }

    pub fn failed(
        kind: impl Into<String>,
        subkind: impl Into<String>,
        contents: serde_json::Value,
        error: impl std::fmt::Display,
    ) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::ok(kind, subkind, contents)
        }
    }

    pub fn is_ready(&self) -> bool {
        self.error.is_none()
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    fn name(&self) -> &str;

    /// Run every check this prober knows about. Called periodically.
    async fn probe(&self, ctx: &RunContext) -> Result<(), HealthError>;

    /// Quick check used to answer readiness requests.
    async fn readiness(&self, ctx: &RunContext) -> Readiness;
}
