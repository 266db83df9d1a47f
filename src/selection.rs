use crate::model::{Environment, Inventory, Region, Subscription};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum SelectionField {
    Region,
    Environment,
    Subscription,
    ResourceGroup,
    Cluster,
    Namespace,
}

impl SelectionField {
    /// Cascade order: every field only depends on fields before it.
    pub const ALL: [Self; 6] = [
        Self::Region,
        Self::Environment,
        Self::Subscription,
        Self::ResourceGroup,
        Self::Cluster,
        Self::Namespace,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Self::Region => "region",
            Self::Environment => "environment",
            Self::Subscription => "subscription",
            Self::ResourceGroup => "resource_group",
            Self::Cluster => "cluster",
            Self::Namespace => "namespace",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Region => "Region",
            Self::Environment => "Environment",
            Self::Subscription => "Subscription",
            Self::ResourceGroup => "Resource Group",
            Self::Cluster => "Cluster",
            Self::Namespace => "Namespace",
        }
    }

    pub fn placeholder(self) -> String {
        format!("Select {}", self.title())
    }
}

/// The subscription / resource group / cluster triple a merge operates on.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct ClusterTarget {
    pub subscription: String,
    pub resource_group: String,
    pub cluster: String,
}

impl Display for ClusterTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.subscription, self.resource_group, self.cluster
        )
    }
}

/// Cascading selector state.
///
/// Every setter accepts raw input and falls back to "unselected" when the value is
/// not valid for the current cascade.
#[derive(Debug, Clone)]
pub struct SelectionState {
    inventory: Arc<Inventory>,
    region: Option<Region>,
    environment: Option<Environment>,
    subscription: Option<String>,
    resource_group: Option<String>,
    cluster: Option<String>,
    namespace: Option<String>,
    merge_succeeded: bool,
    last_merged: Option<ClusterTarget>,
    pending_merge: Option<ClusterTarget>,
}

impl SelectionState {
    pub fn new(inventory: Arc<Inventory>) -> Self {
        Self {
            inventory,
            region: None,
            environment: None,
            subscription: None,
            resource_group: None,
            cluster: None,
            namespace: None,
            merge_succeeded: false,
            last_merged: None,
            pending_merge: None,
        }
    }

    pub fn region(&self) -> Option<Region> {
        self.region
    }

    pub fn environment(&self) -> Option<Environment> {
        self.environment
    }

    pub fn subscription(&self) -> Option<&str> {
        self.subscription.as_deref()
    }

    pub fn resource_group(&self) -> Option<&str> {
        self.resource_group.as_deref()
    }

    pub fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn merge_succeeded(&self) -> bool {
        self.merge_succeeded
    }

    pub fn last_merged(&self) -> Option<&ClusterTarget> {
        self.last_merged.as_ref()
    }

    pub fn pending_merge(&self) -> Option<&ClusterTarget> {
        self.pending_merge.as_ref()
    }

    pub fn value(&self, field: SelectionField) -> Option<String> {
        match field {
            SelectionField::Region => self.region.map(|region| region.label().to_string()),
            SelectionField::Environment => self.environment.map(|env| env.label().to_string()),
            SelectionField::Subscription => self.subscription.clone(),
            SelectionField::ResourceGroup => self.resource_group.clone(),
            SelectionField::Cluster => self.cluster.clone(),
            SelectionField::Namespace => self.namespace.clone(),
        }
    }

    pub fn current_target(&self) -> Option<ClusterTarget> {
        Some(ClusterTarget {
            subscription: self.subscription.clone()?,
            resource_group: self.resource_group.clone()?,
            cluster: self.cluster.clone()?,
        })
    }

    pub fn set_region(&mut self, region: Option<Region>) {
        self.region = region;
        self.reset_cluster_chain();
    }

    pub fn set_environment(&mut self, environment: Option<Environment>) {
        self.environment = environment;
        self.reset_cluster_chain();

        let keep_namespace = self
            .namespace
            .as_deref()
            .is_some_and(|current| self.namespace_options().contains(&current));
        if !keep_namespace {
            self.namespace = None;
        }
    }

    pub fn set_subscription(&mut self, name: &str) {
        let resolved = self
            .eligible_subscriptions()
            .find(|sub| sub.name == name)
            .map(|sub| sub.name.clone());
        self.subscription = resolved;
        if self.subscription.is_none() && !name.is_empty() {
            debug!("ignoring subscription '{name}' outside the eligible set");
        }
        self.resource_group = None;
        self.cluster = None;
        self.merge_succeeded = false;
    }

    pub fn set_resource_group(&mut self, name: &str) {
        self.resource_group = self
            .selected_subscription()
            .and_then(|sub| sub.resource_group(name))
            .map(|group| group.name.clone());
        self.cluster = None;
        self.merge_succeeded = false;
    }

    pub fn set_cluster(&mut self, name: &str) {
        let valid = self.cluster_options().contains(&name);
        self.cluster = valid.then(|| name.to_string());
        self.merge_succeeded = false;
    }

    pub fn set_namespace(&mut self, name: &str) {
        let valid = self.namespace_options().contains(&name);
        self.namespace = valid.then(|| name.to_string());
    }

    /// Routes a raw value to the setter for `field`. An empty value clears it.
    pub fn set_field(&mut self, field: SelectionField, raw: &str) {
        match field {
            SelectionField::Region => self.set_region(Region::from_token(raw)),
            SelectionField::Environment => self.set_environment(Environment::from_token(raw)),
            SelectionField::Subscription => self.set_subscription(raw),
            SelectionField::ResourceGroup => self.set_resource_group(raw),
            SelectionField::Cluster => self.set_cluster(raw),
            SelectionField::Namespace => self.set_namespace(raw),
        }
    }

    pub fn note_merge_dispatched(&mut self, target: ClusterTarget) {
        self.pending_merge = Some(target);
    }

    /// Applies a merge completion. Returns false when the result is stale: either a
    /// newer merge was dispatched, or the selection moved away while it ran.
    pub fn mark_merge_result(&mut self, success: bool, target: &ClusterTarget) -> bool {
        if self.pending_merge.as_ref() != Some(target) {
            debug!("discarding merge result for {target}: not the latest dispatch");
            return false;
        }
        self.pending_merge = None;

        if self.current_target().as_ref() != Some(target) {
            debug!("discarding merge result for {target}: selection changed");
            return false;
        }

        self.merge_succeeded = success;
        if success {
            self.last_merged = Some(target.clone());
        }
        true
    }

    pub fn merge_eligible(&self) -> bool {
        self.current_target()
            .is_some_and(|target| self.last_merged.as_ref() != Some(&target))
    }

    pub fn action_eligible(&self) -> bool {
        self.namespace.is_some() && self.merge_succeeded
    }

    pub fn options(&self, field: SelectionField) -> Vec<String> {
        match field {
            SelectionField::Region => Region::ALL
                .iter()
                .map(|region| region.label().to_string())
                .collect(),
            SelectionField::Environment => Environment::ALL
                .iter()
                .map(|env| env.label().to_string())
                .collect(),
            SelectionField::Subscription => to_owned(self.subscription_options()),
            SelectionField::ResourceGroup => to_owned(self.resource_group_options()),
            SelectionField::Cluster => to_owned(self.cluster_options()),
            SelectionField::Namespace => to_owned(self.namespace_options()),
        }
    }

    pub fn subscription_options(&self) -> Vec<&str> {
        self.eligible_subscriptions()
            .map(|sub| sub.name.as_str())
            .collect()
    }

    pub fn resource_group_options(&self) -> Vec<&str> {
        self.selected_subscription()
            .map(|sub| {
                sub.resource_groups
                    .iter()
                    .map(|group| group.name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn cluster_options(&self) -> Vec<&str> {
        let Some(group_name) = self.resource_group.as_deref() else {
            return Vec::new();
        };

        self.selected_subscription()
            .and_then(|sub| sub.resource_group(group_name))
            .map(|group| group.clusters.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn namespace_options(&self) -> Vec<&str> {
        let Some(environment) = self.environment else {
            return Vec::new();
        };

        self.inventory
            .namespaces_for(environment)
            .map(|namespace| namespace.name.as_str())
            .collect()
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        SelectionField::ALL
            .iter()
            .filter_map(|field| {
                self.value(*field)
                    .map(|value| (field.key().to_string(), value))
            })
            .collect()
    }

    /// Replays cached values through the setters in cascade order.
    pub fn restore(&mut self, values: &BTreeMap<String, String>) {
        for field in SelectionField::ALL {
            let raw = values.get(field.key()).map(String::as_str).unwrap_or("");
            self.set_field(field, raw);
        }
    }

    /// Every value each field could ever take, independent of the cascade.
    pub fn catalog_options(&self) -> BTreeMap<String, BTreeSet<String>> {
        let inventory = &self.inventory;
        let mut options: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
        options.insert(
            SelectionField::Region.key().to_string(),
            Region::ALL.iter().map(|r| r.label().to_string()).collect(),
        );
        options.insert(
            SelectionField::Environment.key().to_string(),
            Environment::ALL
                .iter()
                .map(|e| e.label().to_string())
                .collect(),
        );
        options.insert(
            SelectionField::Subscription.key().to_string(),
            inventory
                .subscriptions()
                .iter()
                .map(|sub| sub.name.clone())
                .collect(),
        );
        options.insert(
            SelectionField::ResourceGroup.key().to_string(),
            inventory
                .subscriptions()
                .iter()
                .flat_map(|sub| sub.resource_groups.iter().map(|group| group.name.clone()))
                .collect(),
        );
        options.insert(
            SelectionField::Cluster.key().to_string(),
            inventory
                .subscriptions()
                .iter()
                .flat_map(|sub| sub.resource_groups.iter())
                .flat_map(|group| group.clusters.iter().cloned())
                .collect(),
        );
        options.insert(
            SelectionField::Namespace.key().to_string(),
            inventory
                .namespaces()
                .iter()
                .map(|namespace| namespace.name.clone())
                .collect(),
        );
        options
    }

    fn eligible_subscriptions(&self) -> Box<dyn Iterator<Item = &Subscription> + '_> {
        match (self.region, self.environment) {
            (Some(region), Some(environment)) => {
                Box::new(self.inventory.subscriptions_for(region, environment))
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    fn selected_subscription(&self) -> Option<&Subscription> {
        self.subscription
            .as_deref()
            .and_then(|name| self.inventory.subscription(name))
    }

    fn reset_cluster_chain(&mut self) {
        self.subscription = None;
        self.resource_group = None;
        self.cluster = None;
        self.merge_succeeded = false;
    }
}

fn to_owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(str::to_string).collect()
}
