use crate::model::{Inventory, Namespace, Subscription};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CALL_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SIMULATED_LATENCY_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Live,
    Simulated,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub source: Option<PathBuf>,
    pub provider: ProviderKind,
    pub call_timeout: Duration,
    pub simulated_latency: Duration,
    pub cache_path: Option<PathBuf>,
    pub inventory: Inventory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct AksnavConfigFile {
    #[serde(default)]
    provider: ProviderKind,
    #[serde(default = "default_call_timeout_secs", alias = "timeout_secs")]
    call_timeout_secs: u64,
    #[serde(default = "default_simulated_latency_ms")]
    simulated_latency_ms: u64,
    #[serde(default)]
    cache_path: Option<PathBuf>,
    #[serde(default)]
    inventory: Option<InventorySpec>,
}

#[derive(Debug, Clone, Deserialize)]
struct InventorySpec {
    subscriptions: Vec<Subscription>,
    #[serde(default)]
    namespaces: Vec<Namespace>,
}

impl Settings {
    /// Reads `explicit` or the first discovered config file. No file at all means
    /// defaults with the built-in inventory.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => discover_config_path(),
        };

        let Some(path) = path else {
            return Self::from_file(None, AksnavConfigFile::defaults());
        };

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let parsed: AksnavConfigFile = serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Self::from_file(Some(path), parsed)
    }

    fn from_file(source: Option<PathBuf>, file: AksnavConfigFile) -> Result<Self> {
        let inventory = match file.inventory {
            Some(spec) => spec.into_inventory().with_context(|| {
                format!(
                    "invalid inventory in {}",
                    source
                        .as_deref()
                        .map(|path| path.display().to_string())
                        .unwrap_or_default()
                )
            })?,
            None => Inventory::builtin(),
        };

        Ok(Self {
            source,
            provider: file.provider,
            call_timeout: Duration::from_secs(file.call_timeout_secs.max(1)),
            simulated_latency: Duration::from_millis(file.simulated_latency_ms),
            cache_path: file.cache_path,
            inventory,
        })
    }
}

impl AksnavConfigFile {
    fn defaults() -> Self {
        Self {
            provider: ProviderKind::default(),
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            simulated_latency_ms: DEFAULT_SIMULATED_LATENCY_MS,
            cache_path: None,
            inventory: None,
        }
    }
}

impl InventorySpec {
    fn into_inventory(self) -> Result<Inventory> {
        Inventory::new(self.subscriptions, self.namespaces)
    }
}

fn default_call_timeout_secs() -> u64 {
    DEFAULT_CALL_TIMEOUT_SECS
}

fn default_simulated_latency_ms() -> u64 {
    DEFAULT_SIMULATED_LATENCY_MS
}

fn discover_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("AKSNAV_CONFIG")
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }

    let cwd_candidates = [
        PathBuf::from("aksnav.yaml"),
        PathBuf::from("aksnav.yml"),
        PathBuf::from(".aksnav.yaml"),
    ];
    for candidate in cwd_candidates {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let user_candidates = [
            PathBuf::from(&home).join(".config/aksnav/config.yaml"),
            PathBuf::from(&home).join(".config/aksnav/config.yml"),
            PathBuf::from(&home).join(".aksnav.yaml"),
        ];
        for candidate in user_candidates {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{ProviderKind, Settings};
    use crate::model::{Environment, Region};
    use std::fs;
    use std::time::Duration;

    fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("aksnav.yaml");
        fs::write(&path, contents).expect("write config");
        (dir, path)
    }

    #[test]
    fn empty_file_uses_defaults() {
        let (_dir, path) = write_config("{}\n");
        let settings = Settings::load(Some(&path)).expect("load");
        assert_eq!(settings.provider, ProviderKind::Live);
        assert_eq!(settings.call_timeout, Duration::from_secs(60));
        assert_eq!(settings.simulated_latency, Duration::from_millis(1_000));
        assert!(settings.cache_path.is_none());
        assert!(settings.inventory.subscription("sub-na-sit").is_some());
    }

    #[test]
    fn inventory_section_replaces_builtin_catalog() {
        let (_dir, path) = write_config(
            r#"
provider: simulated
call_timeout_secs: 15
simulated_latency_ms: 0
inventory:
  subscriptions:
    - name: sub-lab
      region: EMEA
      environment: UAT
      resource_groups:
        - name: rg-lab
          clusters: [aks-lab-1, aks-lab-2]
  namespaces:
    - name: lab-uat
      environment: UAT
"#,
        );

        let settings = Settings::load(Some(&path)).expect("load");
        assert_eq!(settings.provider, ProviderKind::Simulated);
        assert_eq!(settings.call_timeout, Duration::from_secs(15));
        assert_eq!(settings.simulated_latency, Duration::ZERO);
        assert!(settings.inventory.subscription("sub-na-sit").is_none());

        let lab = settings
            .inventory
            .subscription("sub-lab")
            .expect("custom subscription");
        assert_eq!(lab.region, Region::Emea);
        assert_eq!(lab.environment, Environment::Uat);
        assert_eq!(lab.resource_groups[0].clusters, vec!["aks-lab-1", "aks-lab-2"]);
        assert!(settings.inventory.has_namespace("lab-uat"));
    }

    #[test]
    fn duplicate_clusters_fail_to_load() {
        let (_dir, path) = write_config(
            r#"
inventory:
  subscriptions:
    - name: sub-a
      region: NA
      environment: SIT
      resource_groups:
        - name: rg-a
          clusters: [aks-1, aks-1]
"#,
        );
        let error = Settings::load(Some(&path)).expect_err("duplicate cluster");
        assert!(format!("{error:#}").contains("invalid inventory"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let (_dir, path) = write_config("providr: simulated\n");
        assert!(Settings::load(Some(&path)).is_err());
    }
}
