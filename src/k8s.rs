use crate::model::PodRow;
use crate::provider::{ClusterOperations, MergeOutcome, ProviderError};
use async_trait::async_trait;
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::{Pod, PodStatus, Secret};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use kube::api::{ListParams, LogParams};
use kube::{Api, Client, Config, ResourceExt};
use serde::Serialize;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

const LOG_TAIL_LINES: i64 = 500;

/// Backend that merges credentials through the Azure CLI and reads workloads through
/// the Kubernetes API of the kubeconfig's current context.
#[derive(Debug, Clone, Default)]
pub struct LiveProvider;

impl LiveProvider {
    pub fn new() -> Self {
        Self
    }

    // A merge rewrites the current context, so every read resolves the kubeconfig anew.
    async fn client(&self) -> Result<Client, ProviderError> {
        let config = Config::infer().await.map_err(|error| {
            ProviderError::Transport(format!("failed to infer Kubernetes configuration: {error}"))
        })?;
        debug!("using Kubernetes API at {}", config.cluster_url);
        Client::try_from(config).map_err(map_kube_error)
    }
}

#[async_trait]
impl ClusterOperations for LiveProvider {
    fn label(&self) -> &'static str {
        "live"
    }

    async fn merge(&self, subscription: &str, resource_group: &str, cluster: &str) -> MergeOutcome {
        let mut cmd = TokioCommand::new("az");
        cmd.arg("aks")
            .arg("get-credentials")
            .arg("--subscription")
            .arg(subscription)
            .arg("--resource-group")
            .arg(resource_group)
            .arg("--name")
            .arg(cluster)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = match cmd.output().await {
            Ok(output) => output,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                return MergeOutcome::failed(
                    "Error: 'az' command not found. Please install the Azure CLI.",
                );
            }
            Err(error) => {
                return MergeOutcome::failed(format!("failed to execute az: {error}"));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let success = output.status.success();
        info!("az aks get-credentials for {cluster} exited with {}", output.status);

        let message = if success { stdout } else { stderr };
        let message = if message.trim().is_empty() {
            format!("az aks get-credentials exited with {}", output.status)
        } else {
            message.trim_end().to_string()
        };

        MergeOutcome { message, success }
    }

    async fn get_pods(&self, namespace: &str) -> Result<Vec<PodRow>, ProviderError> {
        let pods: Api<Pod> = Api::namespaced(self.client().await?, namespace);
        let list = pods.list(&list_params()).await.map_err(map_kube_error)?;

        let mut rows = list
            .into_iter()
            .map(|pod| {
                let status = pod
                    .status
                    .as_ref()
                    .and_then(|value| value.phase.clone())
                    .unwrap_or_else(|| "Unknown".to_string());
                let restart_count = pod.status.as_ref().map(pod_restarts).unwrap_or(0);
                PodRow {
                    name: pod.name_any(),
                    status,
                    age: human_age(pod.metadata.creation_timestamp.as_ref()),
                    restart_count,
                }
            })
            .collect::<Vec<_>>();
        rows.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(rows)
    }

    async fn get_logs(&self, pod: &str, namespace: &str) -> Result<String, ProviderError> {
        let pods: Api<Pod> = Api::namespaced(self.client().await?, namespace);
        let params = LogParams {
            tail_lines: Some(LOG_TAIL_LINES),
            ..LogParams::default()
        };

        pods.logs(pod, &params).await.map_err(map_kube_error)
    }

    async fn get_secrets(&self, namespace: &str) -> Result<Vec<String>, ProviderError> {
        let secrets: Api<Secret> = Api::namespaced(self.client().await?, namespace);
        let list = secrets.list(&list_params()).await.map_err(map_kube_error)?;
        Ok(sorted_names(list.into_iter().map(|secret| secret.name_any())))
    }

    async fn get_deployments(&self, namespace: &str) -> Result<Vec<String>, ProviderError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client().await?, namespace);
        let list = deployments
            .list(&list_params())
            .await
            .map_err(map_kube_error)?;
        Ok(sorted_names(
            list.into_iter().map(|deployment| deployment.name_any()),
        ))
    }

    async fn describe_pod(&self, pod: &str, namespace: &str) -> Result<String, ProviderError> {
        let pods: Api<Pod> = Api::namespaced(self.client().await?, namespace);
        let mut object = pods.get(pod).await.map_err(map_kube_error)?;
        object.metadata.managed_fields = None;
        Ok(yaml_detail(&object))
    }
}

fn map_kube_error(error: kube::Error) -> ProviderError {
    match error {
        kube::Error::Api(response) => match response.code {
            401 | 403 => ProviderError::Unauthorized(response.message.clone()),
            404 => ProviderError::NotFound(response.message.clone()),
            code => ProviderError::Transport(format!("{} ({code})", response.message)),
        },
        other => ProviderError::Transport(other.to_string()),
    }
}

fn list_params() -> ListParams {
    ListParams::default().limit(500)
}

fn sorted_names(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut names = names.collect::<Vec<_>>();
    names.sort();
    names
}

fn pod_restarts(status: &PodStatus) -> u32 {
    let restarts: i32 = status
        .container_statuses
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|container| container.restart_count)
        .sum();
    u32::try_from(restarts).unwrap_or(0)
}

fn human_age(timestamp: Option<&Time>) -> String {
    let Some(timestamp) = timestamp else {
        return "-".to_string();
    };

    let elapsed_seconds =
        (k8s_openapi::jiff::Timestamp::now().as_second() - timestamp.0.as_second()).max(0);
    format_elapsed_seconds(elapsed_seconds)
}

pub fn format_elapsed_seconds(seconds: i64) -> String {
    if seconds >= 86_400 {
        return format!("{}d", seconds / 86_400);
    }

    if seconds >= 3_600 {
        return format!("{}h", seconds / 3_600);
    }

    if seconds >= 60 {
        return format!("{}m", seconds / 60);
    }

    format!("{seconds}s")
}

fn yaml_detail<T>(value: &T) -> String
where
    T: Serialize,
{
    serde_yaml::to_string(value).unwrap_or_else(|error| format!("failed to format detail: {error}"))
}
