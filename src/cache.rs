use anyhow::{Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Persists the last-used selector values between runs.
pub trait SelectionCache {
    fn save(&self, selections: &BTreeMap<String, String>) -> Result<()>;

    /// Never fails. Each field falls back to its default when the stored value is
    /// missing or not a member of `valid_options`.
    fn load(
        &self,
        defaults: &BTreeMap<String, String>,
        valid_options: &BTreeMap<String, BTreeSet<String>>,
    ) -> BTreeMap<String, String>;
}

#[derive(Debug, Clone)]
pub struct JsonSelectionCache {
    path: PathBuf,
}

impl JsonSelectionCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_stored(&self) -> Option<BTreeMap<String, String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) => {
                debug!("no selection cache at {}: {error}", self.path.display());
                return None;
            }
        };

        match serde_json::from_str::<BTreeMap<String, serde_json::Value>>(&raw) {
            Ok(values) => Some(
                values
                    .into_iter()
                    .filter_map(|(key, value)| match value {
                        serde_json::Value::String(value) => Some((key, value)),
                        _ => None,
                    })
                    .collect(),
            ),
            Err(error) => {
                warn!(
                    "ignoring malformed selection cache {}: {error}",
                    self.path.display()
                );
                None
            }
        }
    }
}

impl SelectionCache for JsonSelectionCache {
    fn save(&self, selections: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let raw = serde_json::to_string_pretty(selections)
            .context("failed to encode selection cache")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        debug!("saved selection cache to {}", self.path.display());
        Ok(())
    }

    fn load(
        &self,
        defaults: &BTreeMap<String, String>,
        valid_options: &BTreeMap<String, BTreeSet<String>>,
    ) -> BTreeMap<String, String> {
        let stored = self.read_stored().unwrap_or_default();

        defaults
            .iter()
            .map(|(field, default)| {
                let value = stored
                    .get(field)
                    .filter(|value| {
                        valid_options
                            .get(field)
                            .is_some_and(|options| options.contains(*value))
                    })
                    .unwrap_or(default);
                (field.clone(), value.clone())
            })
            .collect()
    }
}

pub fn default_cache_path() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) if !home.trim().is_empty() => {
            PathBuf::from(home).join(".config/aksnav/cache.json")
        }
        _ => PathBuf::from(".aksnav-cache.json"),
    }
}
