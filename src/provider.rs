use crate::model::PodRow;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("not authorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MergeOutcome {
    pub message: String,
    pub success: bool,
}

impl MergeOutcome {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: false,
        }
    }
}

/// Everything the console asks of a cluster backend. Calls may take seconds and are
/// always driven from worker tasks, never from the UI loop.
#[async_trait]
pub trait ClusterOperations: Send + Sync {
    fn label(&self) -> &'static str;

    async fn merge(&self, subscription: &str, resource_group: &str, cluster: &str)
    -> MergeOutcome;

    async fn get_pods(&self, namespace: &str) -> Result<Vec<PodRow>, ProviderError>;

    async fn get_logs(&self, pod: &str, namespace: &str) -> Result<String, ProviderError>;

    async fn get_secrets(&self, namespace: &str) -> Result<Vec<String>, ProviderError>;

    async fn get_deployments(&self, namespace: &str) -> Result<Vec<String>, ProviderError>;

    async fn describe_pod(&self, pod: &str, namespace: &str) -> Result<String, ProviderError>;
}
