use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Region {
    Apac,
    Emea,
    Latam,
    Na,
}

impl Region {
    pub const ALL: [Self; 4] = [Self::Apac, Self::Emea, Self::Latam, Self::Na];

    pub fn label(self) -> &'static str {
        match self {
            Self::Apac => "APAC",
            Self::Emea => "EMEA",
            Self::Latam => "LATAM",
            Self::Na => "NA",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "APAC" => Some(Self::Apac),
            "EMEA" => Some(Self::Emea),
            "LATAM" => Some(Self::Latam),
            "NA" => Some(Self::Na),
            _ => None,
        }
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    Sit,
    Uat,
    Prod,
}

impl Environment {
    pub const ALL: [Self; 3] = [Self::Sit, Self::Uat, Self::Prod];

    pub fn label(self) -> &'static str {
        match self {
            Self::Sit => "SIT",
            Self::Uat => "UAT",
            Self::Prod => "PROD",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "SIT" => Some(Self::Sit),
            "UAT" => Some(Self::Uat),
            "PROD" => Some(Self::Prod),
            _ => None,
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct ResourceGroup {
    pub name: String,
    pub clusters: Vec<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Subscription {
    pub name: String,
    pub region: Region,
    pub environment: Environment,
    pub resource_groups: Vec<ResourceGroup>,
}

impl Subscription {
    pub fn resource_group(&self, name: &str) -> Option<&ResourceGroup> {
        self.resource_groups.iter().find(|group| group.name == name)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
pub struct Namespace {
    pub name: String,
    pub environment: Environment,
}

/// Read-only catalog of subscriptions and namespaces the operator can pick from.
#[derive(Debug, Clone, Default)]
pub struct Inventory {
    subscriptions: Vec<Subscription>,
    namespaces: Vec<Namespace>,
}

impl Inventory {
    pub fn new(subscriptions: Vec<Subscription>, namespaces: Vec<Namespace>) -> Result<Self> {
        let mut seen_subscriptions = HashSet::new();
        for subscription in &subscriptions {
            if !seen_subscriptions.insert(subscription.name.as_str()) {
                bail!("duplicate subscription '{}' in inventory", subscription.name);
            }

            let mut seen_groups = HashSet::new();
            for group in &subscription.resource_groups {
                if !seen_groups.insert(group.name.as_str()) {
                    bail!(
                        "duplicate resource group '{}' in subscription '{}'",
                        group.name,
                        subscription.name
                    );
                }
                if group.clusters.is_empty() {
                    bail!(
                        "resource group '{}' in subscription '{}' has no clusters",
                        group.name,
                        subscription.name
                    );
                }
                let mut seen_clusters = HashSet::new();
                for cluster in &group.clusters {
                    if !seen_clusters.insert(cluster.as_str()) {
                        bail!(
                            "duplicate cluster '{cluster}' in resource group '{}'",
                            group.name
                        );
                    }
                }
            }
        }

        let mut seen_namespaces = HashSet::new();
        for namespace in &namespaces {
            if !seen_namespaces.insert(namespace.name.as_str()) {
                bail!("duplicate namespace '{}' in inventory", namespace.name);
            }
        }

        Ok(Self {
            subscriptions,
            namespaces,
        })
    }

    pub fn builtin() -> Self {
        let subscriptions = vec![
            subscription(
                "sub-apac-sit",
                Region::Apac,
                Environment::Sit,
                &[("rg-apac-sit-01", &["aks-apac-sit-1"])],
            ),
            subscription(
                "sub-na-sit",
                Region::Na,
                Environment::Sit,
                &[
                    ("rg-na-sit-02", &["aks-na-sit-2"]),
                    ("rg-na-sit-01", &["aks-na-sit-1", "aks-na-sit-3"]),
                ],
            ),
            subscription(
                "sub-eune-sit",
                Region::Emea,
                Environment::Sit,
                &[("rg-eune-sit-01", &["aks-eune-sit-1"])],
            ),
            subscription(
                "sub-la-prod",
                Region::Latam,
                Environment::Prod,
                &[("rg-la-prod-01", &["aks-la-prod-1"])],
            ),
            subscription(
                "sub-na-prod",
                Region::Na,
                Environment::Prod,
                &[("rg-na-prod-01", &["aks-na-prod-1"])],
            ),
            subscription(
                "sub-eune-prod",
                Region::Emea,
                Environment::Prod,
                &[("rg-eune-prod-01", &["aks-eune-prod-01"])],
            ),
        ];

        let namespaces = [
            ("global-ai-mlops-sit", Environment::Sit),
            ("global-ai-cgd-sit", Environment::Sit),
            ("global-ai-mlops-prod", Environment::Prod),
            ("global-ai-cgd-prod", Environment::Prod),
            ("global-ai-cgd-pci-sit", Environment::Sit),
        ]
        .into_iter()
        .map(|(name, environment)| Namespace {
            name: name.to_string(),
            environment,
        })
        .collect();

        Self {
            subscriptions,
            namespaces,
        }
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn subscriptions_for(
        &self,
        region: Region,
        environment: Environment,
    ) -> impl Iterator<Item = &Subscription> {
        self.subscriptions
            .iter()
            .filter(move |sub| sub.region == region && sub.environment == environment)
    }

    pub fn namespaces_for(&self, environment: Environment) -> impl Iterator<Item = &Namespace> {
        self.namespaces
            .iter()
            .filter(move |namespace| namespace.environment == environment)
    }

    pub fn subscription(&self, name: &str) -> Option<&Subscription> {
        self.subscriptions.iter().find(|sub| sub.name == name)
    }

    pub fn has_namespace(&self, name: &str) -> bool {
        self.namespaces.iter().any(|namespace| namespace.name == name)
    }
}

fn subscription(
    name: &str,
    region: Region,
    environment: Environment,
    groups: &[(&str, &[&str])],
) -> Subscription {
    Subscription {
        name: name.to_string(),
        region,
        environment,
        resource_groups: groups
            .iter()
            .map(|(group, clusters)| ResourceGroup {
                name: group.to_string(),
                clusters: clusters.iter().map(|cluster| cluster.to_string()).collect(),
            })
            .collect(),
    }
}

/// One row of the pods table.
#[derive(Debug, Clone, Eq, PartialEq, Default)]
pub struct PodRow {
    pub name: String,
    pub status: String,
    pub age: String,
    pub restart_count: u32,
}

#[cfg(test)]
mod tests {
    use super::{Environment, Inventory, Namespace, Region, ResourceGroup, Subscription};

    #[test]
    fn builtin_inventory_passes_validation() {
        let builtin = Inventory::builtin();
        let validated = Inventory::new(
            builtin.subscriptions().to_vec(),
            builtin.namespaces().to_vec(),
        );
        assert!(validated.is_ok());
    }

    #[test]
    fn region_and_environment_tokens_parse_case_insensitively() {
        assert_eq!(Region::from_token("na"), Some(Region::Na));
        assert_eq!(Region::from_token(" LATAM "), Some(Region::Latam));
        assert_eq!(Region::from_token("Select Region"), None);
        assert_eq!(Environment::from_token("prod"), Some(Environment::Prod));
        assert_eq!(Environment::from_token(""), None);
    }

    #[test]
    fn subscriptions_are_filtered_by_region_and_environment() {
        let inventory = Inventory::builtin();
        let names = inventory
            .subscriptions_for(Region::Na, Environment::Sit)
            .map(|sub| sub.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["sub-na-sit"]);

        assert_eq!(
            inventory
                .subscriptions_for(Region::Apac, Environment::Uat)
                .count(),
            0
        );
    }

    #[test]
    fn namespaces_are_filtered_by_environment() {
        let inventory = Inventory::builtin();
        let names = inventory
            .namespaces_for(Environment::Prod)
            .map(|namespace| namespace.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["global-ai-mlops-prod", "global-ai-cgd-prod"]);
    }

    #[test]
    fn empty_cluster_list_is_rejected() {
        let result = Inventory::new(
            vec![Subscription {
                name: "sub".to_string(),
                region: Region::Na,
                environment: Environment::Sit,
                resource_groups: vec![ResourceGroup {
                    name: "rg".to_string(),
                    clusters: Vec::new(),
                }],
            }],
            Vec::new(),
        );
        let error = result.expect_err("empty cluster list must be rejected");
        assert!(error.to_string().contains("has no clusters"));
    }

    #[test]
    fn duplicate_namespace_is_rejected() {
        let namespace = Namespace {
            name: "ns".to_string(),
            environment: Environment::Sit,
        };
        let result = Inventory::new(Vec::new(), vec![namespace.clone(), namespace]);
        assert!(result.is_err());
    }

    #[test]
    fn duplicate_cluster_within_group_is_rejected() {
        let result = Inventory::new(
            vec![Subscription {
                name: "sub".to_string(),
                region: Region::Na,
                environment: Environment::Sit,
                resource_groups: vec![ResourceGroup {
                    name: "rg".to_string(),
                    clusters: vec!["aks".to_string(), "aks".to_string()],
                }],
            }],
            Vec::new(),
        );
        assert!(result.is_err());
    }
}
