use crate::model::PodRow;
use crate::provider::{MergeOutcome, ProviderError};
use crate::selection::ClusterTarget;
use chrono::{DateTime, Local};

#[derive(Debug, Clone, Default)]
pub struct PodsView {
    rows: Vec<PodRow>,
    error: Option<String>,
    selected: Option<String>,
    cursor: usize,
    refreshed_at: Option<DateTime<Local>>,
    pub loading: bool,
}

impl PodsView {
    pub fn rows(&self) -> &[PodRow] {
        &self.rows
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Local>> {
        self.refreshed_at
    }

    /// Replaces the rows wholesale. Any pod selection is dropped, so dependent
    /// actions stay gated until the operator picks again.
    pub fn update(&mut self, result: Result<Vec<PodRow>, ProviderError>) {
        self.loading = false;
        self.selected = None;
        self.cursor = 0;
        self.refreshed_at = Some(Local::now());
        match result {
            Ok(rows) => {
                self.rows = rows;
                self.error = None;
            }
            Err(error) => {
                self.rows.clear();
                self.error = Some(error.to_string());
            }
        }
    }

    pub fn select(&mut self, name: &str) {
        if let Some(index) = self.rows.iter().position(|row| row.name == name) {
            self.selected = Some(name.to_string());
            self.cursor = index;
        }
    }

    pub fn select_at_cursor(&mut self) {
        if let Some(row) = self.rows.get(self.cursor) {
            self.selected = Some(row.name.clone());
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.cursor = step(self.cursor, delta, self.rows.len());
    }
}

/// Secrets and deployments: plain name lists.
#[derive(Debug, Clone, Default)]
pub struct NamesView {
    names: Vec<String>,
    error: Option<String>,
    cursor: usize,
    pub loading: bool,
}

impl NamesView {
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn update(&mut self, result: Result<Vec<String>, ProviderError>) {
        self.loading = false;
        self.cursor = 0;
        match result {
            Ok(names) => {
                self.names = names;
                self.error = None;
            }
            Err(error) => {
                self.names.clear();
                self.error = Some(error.to_string());
            }
        }
    }

    pub fn move_cursor(&mut self, delta: isize) {
        self.cursor = step(self.cursor, delta, self.names.len());
    }
}

/// Logs and describe output. The full payload is never modified; the filter only
/// changes what [`TextView::filtered`] yields.
#[derive(Debug, Clone, Default)]
pub struct TextView {
    text: String,
    pod: Option<String>,
    filter: String,
    error: Option<String>,
    scroll: usize,
    pub loading: bool,
}

impl TextView {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn pod(&self) -> Option<&str> {
        self.pod.as_deref()
    }

    pub fn filter_text(&self) -> &str {
        &self.filter
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    pub fn update(&mut self, pod: &str, result: Result<String, ProviderError>) {
        self.loading = false;
        self.pod = Some(pod.to_string());
        self.filter.clear();
        self.scroll = 0;
        match result {
            Ok(text) => {
                self.text = text;
                self.error = None;
            }
            Err(error) => {
                self.text.clear();
                self.error = Some(error.to_string());
            }
        }
    }

    pub fn filter(&mut self, text: &str) {
        self.filter = text.to_string();
        self.scroll = 0;
    }

    pub fn filtered(&self) -> Vec<&str> {
        let query = self.filter.trim().to_ascii_lowercase();
        self.text
            .lines()
            .filter(|line| query.is_empty() || line.to_ascii_lowercase().contains(&query))
            .collect()
    }

    pub fn scroll_by(&mut self, delta: isize) {
        self.scroll = step(self.scroll, delta, self.filtered().len());
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeView {
    message: Option<String>,
    success: bool,
    target: Option<ClusterTarget>,
    pub loading: bool,
}

impl MergeView {
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn target(&self) -> Option<&ClusterTarget> {
        self.target.as_ref()
    }

    pub fn update(&mut self, target: &ClusterTarget, outcome: MergeOutcome) {
        self.loading = false;
        self.target = Some(target.clone());
        self.message = Some(outcome.message);
        self.success = outcome.success;
    }
}

fn step(current: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    current.saturating_add_signed(delta).min(len - 1)
}
