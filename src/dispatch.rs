use crate::model::PodRow;
use crate::provider::{ClusterOperations, MergeOutcome, ProviderError};
use crate::selection::ClusterTarget;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum OpKind {
    Merge,
    Pods,
    Logs,
    Secrets,
    Deployments,
    Describe,
}

impl OpKind {
    pub fn title(self) -> &'static str {
        match self {
            Self::Merge => "Merge",
            Self::Pods => "Pods",
            Self::Logs => "Logs",
            Self::Secrets => "Secrets",
            Self::Deployments => "Deployments",
            Self::Describe => "Describe",
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Request {
    Merge(ClusterTarget),
    Pods { namespace: String },
    Secrets { namespace: String },
    Deployments { namespace: String },
    Logs { pod: String, namespace: String },
    Describe { pod: String, namespace: String },
}

impl Request {
    pub fn kind(&self) -> OpKind {
        match self {
            Self::Merge(_) => OpKind::Merge,
            Self::Pods { .. } => OpKind::Pods,
            Self::Secrets { .. } => OpKind::Secrets,
            Self::Deployments { .. } => OpKind::Deployments,
            Self::Logs { .. } => OpKind::Logs,
            Self::Describe { .. } => OpKind::Describe,
        }
    }

    /// Value a completion is matched against: the merge triple, the pod, or the
    /// namespace for list fetches.
    pub fn correlation_key(&self) -> String {
        match self {
            Self::Merge(target) => target.to_string(),
            Self::Pods { namespace }
            | Self::Secrets { namespace }
            | Self::Deployments { namespace } => namespace.clone(),
            Self::Logs { pod, .. } | Self::Describe { pod, .. } => pod.clone(),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Outcome {
    Merge(MergeOutcome),
    Pods(Result<Vec<PodRow>, ProviderError>),
    Secrets(Result<Vec<String>, ProviderError>),
    Deployments(Result<Vec<String>, ProviderError>),
    Logs(Result<String, ProviderError>),
    Describe(Result<String, ProviderError>),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Completion {
    pub ticket: u64,
    pub request: Request,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Dispatched {
    Started { ticket: u64 },
    Superseded { ticket: u64, previous: u64 },
    Rejected,
}

impl Dispatched {
    pub fn accepted(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: u64,
    correlation_key: String,
    started_at: Instant,
}

/// Runs provider calls on worker tasks and decides which completions are still
/// current. Completions come back over the channel handed to [`Dispatcher::new`].
pub struct Dispatcher {
    provider: Arc<dyn ClusterOperations>,
    tx: mpsc::UnboundedSender<Completion>,
    call_timeout: Duration,
    in_flight: HashMap<OpKind, InFlight>,
    next_ticket: u64,
}

impl Dispatcher {
    pub fn new(
        provider: Arc<dyn ClusterOperations>,
        tx: mpsc::UnboundedSender<Completion>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            provider,
            tx,
            call_timeout,
            in_flight: HashMap::new(),
            next_ticket: 1,
        }
    }

    pub fn provider_label(&self) -> &'static str {
        self.provider.label()
    }

    pub fn is_in_flight(&self, kind: OpKind) -> bool {
        self.in_flight.contains_key(&kind)
    }

    pub fn dispatch(&mut self, request: Request) -> Dispatched {
        let kind = request.kind();
        let correlation_key = request.correlation_key();

        let previous = match self.in_flight.get(&kind) {
            None => None,
            Some(record) => match kind {
                OpKind::Merge => Some(record.ticket),
                OpKind::Logs | OpKind::Describe if record.correlation_key != correlation_key => {
                    Some(record.ticket)
                }
                _ => {
                    debug!(
                        "rejecting {} request for {correlation_key}: already in flight",
                        kind.title()
                    );
                    return Dispatched::Rejected;
                }
            },
        };

        let ticket = self.next_ticket;
        self.next_ticket = self.next_ticket.saturating_add(1);
        self.in_flight.insert(
            kind,
            InFlight {
                ticket,
                correlation_key: correlation_key.clone(),
                started_at: Instant::now(),
            },
        );
        info!(
            "dispatching {} #{ticket} for {correlation_key} via {}",
            kind.title(),
            self.provider.label()
        );

        let provider = Arc::clone(&self.provider);
        let tx = self.tx.clone();
        let call_timeout = self.call_timeout;
        tokio::spawn(async move {
            let outcome = execute(provider.as_ref(), &request, call_timeout).await;
            if tx
                .send(Completion {
                    ticket,
                    request,
                    outcome,
                })
                .is_err()
            {
                debug!("completion #{ticket} dropped: receiver closed");
            }
        });

        match previous {
            Some(previous) => {
                debug!("{} #{ticket} supersedes #{previous}", kind.title());
                Dispatched::Superseded { ticket, previous }
            }
            None => Dispatched::Started { ticket },
        }
    }

    /// Accepts `completion` if it belongs to the current in-flight record of its kind
    /// and clears that record. Superseded completions come back as `None`.
    pub fn resolve(&mut self, completion: Completion) -> Option<Completion> {
        let kind = completion.request.kind();
        let current = self
            .in_flight
            .get(&kind)
            .is_some_and(|record| record.ticket == completion.ticket);
        if !current {
            debug!(
                "discarding superseded {} completion #{}",
                kind.title(),
                completion.ticket
            );
            return None;
        }

        if let Some(record) = self.in_flight.remove(&kind) {
            debug!(
                "{} #{} for {} completed in {:?}",
                kind.title(),
                record.ticket,
                record.correlation_key,
                record.started_at.elapsed()
            );
        }
        Some(completion)
    }
}

async fn execute(
    provider: &dyn ClusterOperations,
    request: &Request,
    call_timeout: Duration,
) -> Outcome {
    match request {
        Request::Merge(target) => {
            let call = provider.merge(
                &target.subscription,
                &target.resource_group,
                &target.cluster,
            );
            match timeout(call_timeout, call).await {
                Ok(outcome) => Outcome::Merge(outcome),
                Err(_) => {
                    warn!("merge for {target} timed out after {call_timeout:?}");
                    Outcome::Merge(MergeOutcome::failed(
                        ProviderError::TimedOut(call_timeout).to_string(),
                    ))
                }
            }
        }
        Request::Pods { namespace } => {
            Outcome::Pods(bounded(call_timeout, provider.get_pods(namespace)).await)
        }
        Request::Secrets { namespace } => {
            Outcome::Secrets(bounded(call_timeout, provider.get_secrets(namespace)).await)
        }
        Request::Deployments { namespace } => Outcome::Deployments(
            bounded(call_timeout, provider.get_deployments(namespace)).await,
        ),
        Request::Logs { pod, namespace } => {
            Outcome::Logs(bounded(call_timeout, provider.get_logs(pod, namespace)).await)
        }
        Request::Describe { pod, namespace } => {
            Outcome::Describe(bounded(call_timeout, provider.describe_pod(pod, namespace)).await)
        }
    }
}

async fn bounded<T>(
    call_timeout: Duration,
    call: impl Future<Output = Result<T, ProviderError>>,
) -> Result<T, ProviderError> {
    match timeout(call_timeout, call).await {
        Ok(result) => result,
        Err(_) => {
            warn!("provider call timed out after {call_timeout:?}");
            Err(ProviderError::TimedOut(call_timeout))
        }
    }
}
