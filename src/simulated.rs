use crate::model::{Inventory, PodRow};
use crate::provider::{ClusterOperations, MergeOutcome, ProviderError};
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use rand::seq::IndexedRandom;
use std::sync::Arc;
use tokio::time::{Duration, sleep};

const POD_STATUSES: [&str; 4] = ["Running", "Pending", "Failed", "Succeeded"];

/// Offline backend that answers after a fixed delay with generated data.
pub struct SimulatedProvider {
    inventory: Arc<Inventory>,
    latency: Duration,
}

impl SimulatedProvider {
    pub fn new(inventory: Arc<Inventory>, latency: Duration) -> Self {
        Self { inventory, latency }
    }

    async fn known_namespace(&self, namespace: &str) -> Result<(), ProviderError> {
        sleep(self.latency).await;
        if self.inventory.has_namespace(namespace) {
            Ok(())
        } else {
            Err(ProviderError::NotFound(format!(
                "namespaces \"{namespace}\" not found"
            )))
        }
    }
}

#[async_trait]
impl ClusterOperations for SimulatedProvider {
    fn label(&self) -> &'static str {
        "simulated"
    }

    async fn merge(
        &self,
        _subscription: &str,
        _resource_group: &str,
        cluster: &str,
    ) -> MergeOutcome {
        sleep(self.latency).await;
        MergeOutcome {
            message: format!("Merged \"{cluster}\" as current context in kubeconfig"),
            success: true,
        }
    }

    async fn get_pods(&self, namespace: &str) -> Result<Vec<PodRow>, ProviderError> {
        self.known_namespace(namespace).await?;
        Ok(generate_pods())
    }

    async fn get_logs(&self, pod: &str, namespace: &str) -> Result<String, ProviderError> {
        self.known_namespace(namespace).await?;
        Ok(format!(
            "Mock logs for {pod} in namespace {namespace}\nSample log line 1\nSample log line 2\nGenerated at {}",
            Utc::now().to_rfc3339()
        ))
    }

    async fn get_secrets(&self, namespace: &str) -> Result<Vec<String>, ProviderError> {
        self.known_namespace(namespace).await?;
        let count = rand::rng().random_range(1..=10);
        Ok((1..=count).map(|index| format!("secret-{index}")).collect())
    }

    async fn get_deployments(&self, namespace: &str) -> Result<Vec<String>, ProviderError> {
        self.known_namespace(namespace).await?;
        let count = rand::rng().random_range(1..=5);
        Ok((1..=count).map(|index| format!("deployment-{index}")).collect())
    }

    async fn describe_pod(&self, pod: &str, namespace: &str) -> Result<String, ProviderError> {
        self.known_namespace(namespace).await?;
        Ok(format!(
            "apiVersion: v1\nkind: Pod\nmetadata:\n  name: {pod}\n  namespace: {namespace}\nspec:\n  containers:\n  - name: main\n    image: registry.local/{pod}:latest\nstatus:\n  phase: Running\n"
        ))
    }
}

fn generate_pods() -> Vec<PodRow> {
    let mut rng = rand::rng();
    let count = rng.random_range(5..=50);
    (1..=count)
        .map(|index| {
            let status = POD_STATUSES.choose(&mut rng).copied().unwrap_or("Running");
            let age_seconds = rng.random_range(0..=7 * 86_400_i64);
            PodRow {
                name: format!("pod-{index}"),
                status: status.to_string(),
                age: crate::k8s::format_elapsed_seconds(age_seconds),
                restart_count: rng.random_range(0..=5),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::SimulatedProvider;
    use crate::model::Inventory;
    use crate::provider::{ClusterOperations, ProviderError};
    use std::sync::Arc;
    use tokio::time::Duration;

    fn provider() -> SimulatedProvider {
        SimulatedProvider::new(Arc::new(Inventory::builtin()), Duration::ZERO)
    }

    #[tokio::test]
    async fn merge_always_succeeds() {
        let outcome = provider()
            .merge("sub-na-sit", "rg-na-sit-01", "aks-na-sit-1")
            .await;
        assert!(outcome.success);
        assert!(outcome.message.contains("aks-na-sit-1"));
    }

    #[tokio::test]
    async fn pods_are_generated_within_bounds() {
        let pods = provider()
            .get_pods("global-ai-mlops-sit")
            .await
            .expect("known namespace");
        assert!((5..=50).contains(&pods.len()));
        assert_eq!(pods[0].name, "pod-1");
        assert!(pods.iter().all(|pod| pod.restart_count <= 5));
    }

    #[tokio::test]
    async fn unknown_namespace_is_not_found() {
        let error = provider()
            .get_secrets("missing")
            .await
            .expect_err("unknown namespace");
        assert!(matches!(error, ProviderError::NotFound(_)));
    }

    #[tokio::test]
    async fn logs_name_the_pod_and_namespace() {
        let logs = provider()
            .get_logs("pod-3", "global-ai-cgd-sit")
            .await
            .expect("known namespace");
        assert!(logs.starts_with("Mock logs for pod-3 in namespace global-ai-cgd-sit"));
    }
}
