use crate::cache::SelectionCache;
use crate::dispatch::{Completion, Dispatched, Dispatcher, OpKind, Outcome, Request};
use crate::input::Action;
use crate::model::Inventory;
use crate::selection::{ClusterTarget, SelectionField, SelectionState};
use crate::views::{MergeView, NamesView, PodsView, TextView};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Filter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Selectors,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTab {
    Merge,
    Pods,
    Secrets,
    Deployments,
    Logs,
    Describe,
}

impl ResultTab {
    pub const ALL: [Self; 6] = [
        Self::Merge,
        Self::Pods,
        Self::Secrets,
        Self::Deployments,
        Self::Logs,
        Self::Describe,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Self::Merge => "Merge",
            Self::Pods => "Pods",
            Self::Secrets => "Secrets",
            Self::Deployments => "Deployments",
            Self::Logs => "Logs",
            Self::Describe => "Describe",
        }
    }

    fn for_kind(kind: OpKind) -> Self {
        match kind {
            OpKind::Merge => Self::Merge,
            OpKind::Pods => Self::Pods,
            OpKind::Secrets => Self::Secrets,
            OpKind::Deployments => Self::Deployments,
            OpKind::Logs => Self::Logs,
            OpKind::Describe => Self::Describe,
        }
    }

    fn index(self) -> usize {
        Self::ALL.iter().position(|tab| *tab == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    None,
    Quit,
}

pub struct App {
    selection: SelectionState,
    dispatcher: Dispatcher,
    cache: Box<dyn SelectionCache>,
    pub merge: MergeView,
    pub pods: PodsView,
    pub secrets: NamesView,
    pub deployments: NamesView,
    pub logs: TextView,
    pub describe: TextView,
    focus: Focus,
    focused_field: SelectionField,
    tab: ResultTab,
    mode: InputMode,
    filter_input: String,
    status: String,
    show_help: bool,
}

impl App {
    /// Builds the console and replays the cached selection through the cascade.
    pub fn new(
        inventory: Arc<Inventory>,
        dispatcher: Dispatcher,
        cache: Box<dyn SelectionCache>,
    ) -> Self {
        let mut selection = SelectionState::new(inventory);
        let defaults = SelectionField::ALL
            .iter()
            .map(|field| (field.key().to_string(), String::new()))
            .collect::<BTreeMap<_, _>>();
        let restored = cache.load(&defaults, &selection.catalog_options());
        selection.restore(&restored);
        debug!("restored selection {:?}", selection.snapshot());

        let status = format!(
            "Provider: {}. Pick a cluster and press m to merge credentials.",
            dispatcher.provider_label()
        );

        Self {
            selection,
            dispatcher,
            cache,
            merge: MergeView::default(),
            pods: PodsView::default(),
            secrets: NamesView::default(),
            deployments: NamesView::default(),
            logs: TextView::default(),
            describe: TextView::default(),
            focus: Focus::Selectors,
            focused_field: SelectionField::Region,
            tab: ResultTab::Merge,
            mode: InputMode::Normal,
            filter_input: String::new(),
            status,
            show_help: false,
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    #[cfg(test)]
    pub fn selection_mut(&mut self) -> &mut SelectionState {
        &mut self.selection
    }

    pub fn provider_label(&self) -> &'static str {
        self.dispatcher.provider_label()
    }

    pub fn focus(&self) -> Focus {
        self.focus
    }

    pub fn focused_field(&self) -> SelectionField {
        self.focused_field
    }

    pub fn tab(&self) -> ResultTab {
        self.tab
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn filter_input(&self) -> &str {
        &self.filter_input
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = one_line(&status.into());
    }

    pub fn merge_eligible(&self) -> bool {
        self.selection.merge_eligible()
    }

    pub fn fetch_eligible(&self, kind: OpKind) -> bool {
        match kind {
            OpKind::Merge => self.merge_eligible(),
            OpKind::Pods | OpKind::Secrets | OpKind::Deployments => {
                self.selection.action_eligible() && !self.dispatcher.is_in_flight(kind)
            }
            OpKind::Logs => self.logs_eligible(),
            OpKind::Describe => self.describe_eligible(),
        }
    }

    pub fn logs_eligible(&self) -> bool {
        self.selection.action_eligible() && self.pods.selected().is_some()
    }

    pub fn describe_eligible(&self) -> bool {
        self.selection.action_eligible() && self.pods.selected().is_some()
    }

    pub fn apply_action(&mut self, action: Action) -> AppCommand {
        if self.mode == InputMode::Filter {
            self.apply_filter_action(action);
            return AppCommand::None;
        }

        match action {
            Action::Quit => return AppCommand::Quit,
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::ToggleFocus => {
                self.focus = match self.focus {
                    Focus::Selectors => Focus::Results,
                    Focus::Results => Focus::Selectors,
                };
            }
            Action::Up => self.move_vertical(-1),
            Action::Down => self.move_vertical(1),
            Action::NextOption => self.cycle_option(1),
            Action::PrevOption => self.cycle_option(-1),
            Action::ClearField => {
                self.selection.set_field(self.focused_field, "");
                self.set_status(format!("{} cleared", self.focused_field.title()));
            }
            Action::Merge => {
                self.request_merge();
            }
            Action::FetchPods => {
                self.request_fetch(OpKind::Pods);
            }
            Action::FetchSecrets => {
                self.request_fetch(OpKind::Secrets);
            }
            Action::FetchDeployments => {
                self.request_fetch(OpKind::Deployments);
            }
            Action::LoadLogs => {
                self.request_fetch(OpKind::Logs);
            }
            Action::Describe => {
                self.request_fetch(OpKind::Describe);
            }
            Action::NextTab => self.shift_tab(1),
            Action::PrevTab => self.shift_tab(-1),
            Action::SwitchTab(index) => {
                if let Some(tab) = ResultTab::ALL.get(usize::from(index)) {
                    self.tab = *tab;
                    self.focus = Focus::Results;
                }
            }
            Action::Select => self.select_current(),
            Action::StartFilter => {
                if matches!(self.tab, ResultTab::Logs | ResultTab::Describe) {
                    self.mode = InputMode::Filter;
                    self.filter_input = self.active_text().filter_text().to_string();
                } else {
                    self.set_status("Filtering applies to the Logs and Describe tabs");
                }
            }
            Action::SubmitInput
            | Action::CancelInput
            | Action::Backspace
            | Action::InputChar(_) => {}
        }

        AppCommand::None
    }

    pub fn request_merge(&mut self) -> Dispatched {
        let Some(target) = self.selection.current_target() else {
            self.set_status("Select a subscription, resource group and cluster first");
            return Dispatched::Rejected;
        };
        if !self.selection.merge_eligible() {
            self.set_status(format!("{} is already merged", target.cluster));
            return Dispatched::Rejected;
        }

        let dispatched = self.dispatcher.dispatch(Request::Merge(target.clone()));
        if dispatched.accepted() {
            self.selection.note_merge_dispatched(target.clone());
            self.merge.loading = true;
            self.tab = ResultTab::Merge;
            self.set_status(format!(
                "Merging credentials for {}{}...",
                target.cluster,
                superseded_note(dispatched)
            ));
        }
        dispatched
    }

    /// Dispatches a read for the current namespace (and selected pod for logs and
    /// describe). Rejected when the action is gated or the same kind is in flight.
    pub fn request_fetch(&mut self, kind: OpKind) -> Dispatched {
        if kind == OpKind::Merge {
            return self.request_merge();
        }

        let Some(namespace) = self.selection.namespace().map(str::to_string) else {
            self.set_status("Select a namespace first");
            return Dispatched::Rejected;
        };
        if !self.selection.merge_succeeded() {
            self.set_status("Merge the selected cluster first");
            return Dispatched::Rejected;
        }

        let request = match kind {
            OpKind::Pods => Request::Pods { namespace },
            OpKind::Secrets => Request::Secrets { namespace },
            OpKind::Deployments => Request::Deployments { namespace },
            OpKind::Logs | OpKind::Describe => {
                let Some(pod) = self.pods.selected().map(str::to_string) else {
                    self.set_status("Select a pod first");
                    return Dispatched::Rejected;
                };
                if kind == OpKind::Logs {
                    Request::Logs { pod, namespace }
                } else {
                    Request::Describe { pod, namespace }
                }
            }
            OpKind::Merge => return Dispatched::Rejected,
        };

        let summary = request.correlation_key();
        let dispatched = self.dispatcher.dispatch(request);
        if !dispatched.accepted() {
            self.set_status(format!("{} request already running", kind.title()));
            return dispatched;
        }

        match kind {
            OpKind::Pods => self.pods.loading = true,
            OpKind::Secrets => self.secrets.loading = true,
            OpKind::Deployments => self.deployments.loading = true,
            OpKind::Logs => self.logs.loading = true,
            OpKind::Describe => self.describe.loading = true,
            OpKind::Merge => {}
        }
        self.tab = ResultTab::for_kind(kind);
        self.set_status(format!(
            "Loading {} for {summary}{}...",
            kind.title(),
            superseded_note(dispatched)
        ));
        dispatched
    }

    /// Routes a worker completion to its view. Superseded completions are dropped.
    pub fn on_completion(&mut self, completion: Completion) {
        let Some(completion) = self.dispatcher.resolve(completion) else {
            return;
        };

        match (completion.request, completion.outcome) {
            (Request::Merge(target), Outcome::Merge(outcome)) => {
                if !self.apply_merge_outcome(&target, outcome.success) {
                    self.merge.loading = false;
                    return;
                }
                let message = outcome.message.clone();
                self.merge.update(&target, outcome);
                self.set_status(message);
            }
            (Request::Pods { namespace }, Outcome::Pods(result)) => {
                let status = match &result {
                    Ok(rows) => format!("{} pods in {namespace}", rows.len()),
                    Err(error) => format!("Pods failed: {error}"),
                };
                self.pods.update(result);
                self.set_status(status);
            }
            (Request::Secrets { namespace }, Outcome::Secrets(result)) => {
                let status = names_status("secrets", &namespace, &result);
                self.secrets.update(result);
                self.set_status(status);
            }
            (Request::Deployments { namespace }, Outcome::Deployments(result)) => {
                let status = names_status("deployments", &namespace, &result);
                self.deployments.update(result);
                self.set_status(status);
            }
            (Request::Logs { pod, .. }, Outcome::Logs(result)) => {
                if self.pods.selected() != Some(pod.as_str()) {
                    debug!("discarding logs for {pod}: no longer selected");
                    self.logs.loading = false;
                    return;
                }
                let status = text_status("Logs", &pod, &result);
                self.logs.update(&pod, result);
                self.end_filter_on(ResultTab::Logs);
                self.set_status(status);
            }
            (Request::Describe { pod, .. }, Outcome::Describe(result)) => {
                if self.pods.selected() != Some(pod.as_str()) {
                    debug!("discarding description of {pod}: no longer selected");
                    self.describe.loading = false;
                    return;
                }
                let status = text_status("Describe", &pod, &result);
                self.describe.update(&pod, result);
                self.end_filter_on(ResultTab::Describe);
                self.set_status(status);
            }
            (request, _) => {
                warn!("completion payload does not match request {request:?}");
            }
        }
    }

    fn apply_merge_outcome(&mut self, target: &ClusterTarget, success: bool) -> bool {
        if !self.selection.mark_merge_result(success, target) {
            debug!("discarding merge result for {target}: selection changed");
            return false;
        }
        if !success {
            return true;
        }

        info!("merged credentials for {target}");
        if let Err(error) = self.cache.save(&self.selection.snapshot()) {
            warn!("failed to save selection cache: {error:#}");
        }
        true
    }

    /// A fresh payload resets the view's filter, so an open query on that tab
    /// is dropped with it.
    fn end_filter_on(&mut self, tab: ResultTab) {
        if self.mode == InputMode::Filter && self.tab == tab {
            self.mode = InputMode::Normal;
            self.filter_input.clear();
        }
    }

    fn apply_filter_action(&mut self, action: Action) {
        match action {
            Action::SubmitInput => {
                self.mode = InputMode::Normal;
            }
            Action::CancelInput => {
                self.mode = InputMode::Normal;
                self.filter_input.clear();
                self.active_text_mut().filter("");
            }
            Action::Backspace => {
                self.filter_input.pop();
                let query = self.filter_input.clone();
                self.active_text_mut().filter(&query);
            }
            Action::InputChar(c) => {
                self.filter_input.push(c);
                let query = self.filter_input.clone();
                self.active_text_mut().filter(&query);
            }
            _ => {}
        }
    }

    fn active_text(&self) -> &TextView {
        if self.tab == ResultTab::Describe {
            &self.describe
        } else {
            &self.logs
        }
    }

    fn active_text_mut(&mut self) -> &mut TextView {
        if self.tab == ResultTab::Describe {
            &mut self.describe
        } else {
            &mut self.logs
        }
    }

    fn move_vertical(&mut self, delta: isize) {
        match self.focus {
            Focus::Selectors => {
                let fields = SelectionField::ALL;
                let current = fields
                    .iter()
                    .position(|field| *field == self.focused_field)
                    .unwrap_or(0);
                let next = current.saturating_add_signed(delta).min(fields.len() - 1);
                self.focused_field = fields[next];
            }
            Focus::Results => match self.tab {
                ResultTab::Merge => {}
                ResultTab::Pods => self.pods.move_cursor(delta),
                ResultTab::Secrets => self.secrets.move_cursor(delta),
                ResultTab::Deployments => self.deployments.move_cursor(delta),
                ResultTab::Logs => self.logs.scroll_by(delta),
                ResultTab::Describe => self.describe.scroll_by(delta),
            },
        }
    }

    /// Steps through the focused field's options, with "unselected" as the slot
    /// before the first option.
    fn cycle_option(&mut self, delta: isize) {
        let field = self.focused_field;
        let options = self.selection.options(field);
        let current = self
            .selection
            .value(field)
            .and_then(|value| options.iter().position(|option| *option == value))
            .map_or(0, |index| index + 1);

        let slots = options.len() as isize + 1;
        let next = (current as isize + delta).rem_euclid(slots) as usize;
        let raw = if next == 0 {
            ""
        } else {
            options[next - 1].as_str()
        };
        self.selection.set_field(field, raw);

        match self.selection.value(field) {
            Some(value) => self.set_status(format!("{}: {value}", field.title())),
            None if options.is_empty() => self.set_status(format!(
                "No {} options for the current selection",
                field.title()
            )),
            None => self.set_status(field.placeholder()),
        }
    }

    fn shift_tab(&mut self, delta: isize) {
        let tabs = ResultTab::ALL;
        let next = (self.tab.index() as isize + delta).rem_euclid(tabs.len() as isize) as usize;
        self.tab = tabs[next];
    }

    fn select_current(&mut self) {
        match self.focus {
            Focus::Selectors => self.cycle_option(1),
            Focus::Results if self.tab == ResultTab::Pods => {
                self.pods.select_at_cursor();
                if let Some(pod) = self.pods.selected() {
                    self.status = format!("Selected pod {pod}. Press l for logs, d to describe.");
                }
            }
            Focus::Results => {}
        }
    }
}

fn superseded_note(dispatched: Dispatched) -> String {
    match dispatched {
        Dispatched::Superseded { previous, .. } => format!(" (replacing #{previous})"),
        Dispatched::Started { .. } | Dispatched::Rejected => String::new(),
    }
}

fn names_status<T, E: Display>(label: &str, namespace: &str, result: &Result<Vec<T>, E>) -> String {
    match result {
        Ok(names) => format!("{} {label} in {namespace}", names.len()),
        Err(error) => format!("Fetching {label} failed: {error}"),
    }
}

fn text_status<E: Display>(label: &str, pod: &str, result: &Result<String, E>) -> String {
    match result {
        Ok(_) => format!("{label} loaded for {pod}"),
        Err(error) => format!("{label} failed for {pod}: {error}"),
    }
}

fn one_line(text: &str) -> String {
    let line = text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");
    line.to_string()
}

#[cfg(test)]
mod tests {
    use super::{App, AppCommand, Focus, InputMode, ResultTab};
    use crate::cache::SelectionCache;
    use crate::dispatch::tests::pending_dispatcher;
    use crate::dispatch::{Completion, Dispatched, OpKind, Outcome, Request};
    use crate::input::Action;
    use crate::model::{Inventory, PodRow, Region};
    use crate::provider::{MergeOutcome, ProviderError};
    use crate::selection::{ClusterTarget, SelectionField};
    use std::cell::RefCell;
    use std::collections::{BTreeMap, BTreeSet};
    use std::rc::Rc;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct MemoryCache {
        stored: Rc<RefCell<Option<BTreeMap<String, String>>>>,
    }

    impl SelectionCache for MemoryCache {
        fn save(&self, selections: &BTreeMap<String, String>) -> anyhow::Result<()> {
            *self.stored.borrow_mut() = Some(selections.clone());
            Ok(())
        }

        fn load(
            &self,
            defaults: &BTreeMap<String, String>,
            valid_options: &BTreeMap<String, BTreeSet<String>>,
        ) -> BTreeMap<String, String> {
            let stored = self.stored.borrow().clone().unwrap_or_default();
            defaults
                .iter()
                .map(|(field, default)| {
                    let value = stored
                        .get(field)
                        .filter(|value| valid_options[field].contains(*value))
                        .unwrap_or(default);
                    (field.clone(), value.clone())
                })
                .collect()
        }
    }

    fn app_with(cache: MemoryCache) -> App {
        let (dispatcher, _rx) = pending_dispatcher();
        App::new(Arc::new(Inventory::builtin()), dispatcher, Box::new(cache))
    }

    fn app() -> App {
        app_with(MemoryCache::default())
    }

    fn target(cluster: &str) -> ClusterTarget {
        ClusterTarget {
            subscription: "sub-na-sit".to_string(),
            resource_group: "rg-na-sit-01".to_string(),
            cluster: cluster.to_string(),
        }
    }

    fn select_cluster(app: &mut App, cluster: &str) {
        let selection = app.selection_mut();
        selection.set_field(SelectionField::Region, "NA");
        selection.set_field(SelectionField::Environment, "SIT");
        selection.set_field(SelectionField::Subscription, "sub-na-sit");
        selection.set_field(SelectionField::ResourceGroup, "rg-na-sit-01");
        selection.set_field(SelectionField::Cluster, cluster);
        selection.set_field(SelectionField::Namespace, "global-ai-mlops-sit");
    }

    fn ticket(dispatched: Dispatched) -> u64 {
        match dispatched {
            Dispatched::Started { ticket } | Dispatched::Superseded { ticket, .. } => ticket,
            Dispatched::Rejected => panic!("request was rejected"),
        }
    }

    fn merge_completion(ticket: u64, cluster: &str, success: bool) -> Completion {
        Completion {
            ticket,
            request: Request::Merge(target(cluster)),
            outcome: Outcome::Merge(MergeOutcome {
                message: format!("merged {cluster}"),
                success,
            }),
        }
    }

    fn merged_app() -> App {
        let mut app = app();
        select_cluster(&mut app, "aks-na-sit-1");
        let merge = ticket(app.request_merge());
        app.on_completion(merge_completion(merge, "aks-na-sit-1", true));
        assert!(app.selection().merge_succeeded());
        app
    }

    fn pod(name: &str) -> PodRow {
        PodRow {
            name: name.to_string(),
            status: "Running".to_string(),
            age: "1h".to_string(),
            restart_count: 0,
        }
    }

    #[tokio::test]
    async fn later_merge_wins_over_late_earlier_completion() {
        let mut app = app();
        select_cluster(&mut app, "aks-na-sit-1");
        let first = ticket(app.request_merge());

        app.selection_mut()
            .set_field(SelectionField::Cluster, "aks-na-sit-3");
        let second = app.request_merge();
        assert!(matches!(second, Dispatched::Superseded { previous, .. } if previous == first));
        assert!(app.status().contains(&format!("(replacing #{first})")));

        app.on_completion(merge_completion(ticket(second), "aks-na-sit-3", false));
        assert!(!app.selection().merge_succeeded());
        assert!(!app.merge.loading);

        app.on_completion(merge_completion(first, "aks-na-sit-1", true));
        assert!(!app.selection().merge_succeeded());
        assert_eq!(app.merge.message(), Some("merged aks-na-sit-3"));
    }

    #[tokio::test]
    async fn merge_finishing_after_cluster_change_leaves_merge_view_untouched() {
        let cache = MemoryCache::default();
        let mut app = app_with(cache.clone());
        select_cluster(&mut app, "aks-na-sit-1");
        let merge = ticket(app.request_merge());
        let status_before = app.status().to_string();

        app.selection_mut()
            .set_field(SelectionField::Cluster, "aks-na-sit-3");
        app.on_completion(merge_completion(merge, "aks-na-sit-1", true));

        assert!(!app.selection().merge_succeeded());
        assert_eq!(app.selection().last_merged(), None);
        assert!(!app.merge.loading);
        assert_eq!(app.merge.message(), None);
        assert!(!app.merge.success());
        assert_eq!(app.merge.target(), None);
        assert_eq!(app.status(), status_before);
        assert!(cache.stored.borrow().is_none());
    }

    #[tokio::test]
    async fn logs_and_describe_need_a_live_merge_as_well_as_a_pod() {
        let mut app = merged_app();
        let pods = ticket(app.request_fetch(OpKind::Pods));
        app.on_completion(Completion {
            ticket: pods,
            request: Request::Pods {
                namespace: "global-ai-mlops-sit".to_string(),
            },
            outcome: Outcome::Pods(Ok(vec![pod("pod-1")])),
        });
        app.pods.select("pod-1");
        assert!(app.logs_eligible());
        assert!(app.describe_eligible());

        app.selection_mut()
            .set_field(SelectionField::Cluster, "aks-na-sit-3");
        assert_eq!(app.pods.selected(), Some("pod-1"));
        assert!(!app.logs_eligible());
        assert!(!app.describe_eligible());
        assert_eq!(app.request_fetch(OpKind::Describe), Dispatched::Rejected);
    }

    #[tokio::test]
    async fn successful_merge_is_cached_and_disables_remerge() {
        let cache = MemoryCache::default();
        let mut app = app_with(cache.clone());
        select_cluster(&mut app, "aks-na-sit-1");
        let merge = ticket(app.request_merge());
        assert!(app.merge.loading);

        app.on_completion(merge_completion(merge, "aks-na-sit-1", true));
        assert!(app.selection().merge_succeeded());
        assert!(!app.merge_eligible());
        assert_eq!(app.request_merge(), Dispatched::Rejected);

        let saved = cache.stored.borrow().clone().expect("cache saved");
        assert_eq!(saved["cluster"], "aks-na-sit-1");
        assert_eq!(saved["namespace"], "global-ai-mlops-sit");
    }

    #[tokio::test]
    async fn cached_selection_is_restored_on_startup() {
        let cache = MemoryCache::default();
        let mut stored = BTreeMap::new();
        stored.insert("region".to_string(), "NA".to_string());
        stored.insert("environment".to_string(), "SIT".to_string());
        stored.insert("subscription".to_string(), "sub-na-sit".to_string());
        stored.insert("resource_group".to_string(), "rg-na-sit-02".to_string());
        stored.insert("cluster".to_string(), "aks-na-sit-1".to_string());
        stored.insert("namespace".to_string(), "not-a-namespace".to_string());
        *cache.stored.borrow_mut() = Some(stored);

        let app = app_with(cache);
        let selection = app.selection();
        assert_eq!(selection.region(), Some(Region::Na));
        assert_eq!(selection.resource_group(), Some("rg-na-sit-02"));
        assert_eq!(selection.cluster(), None);
        assert_eq!(selection.namespace(), None);
        assert!(!selection.merge_succeeded());
    }

    #[tokio::test]
    async fn fetches_are_gated_on_a_successful_merge() {
        let mut app = app();
        select_cluster(&mut app, "aks-na-sit-1");
        assert_eq!(app.request_fetch(OpKind::Pods), Dispatched::Rejected);
        assert!(!app.pods.loading);

        let mut app = merged_app();
        assert!(app.fetch_eligible(OpKind::Pods));
        assert!(app.request_fetch(OpKind::Pods).accepted());
        assert!(app.pods.loading);
        assert_eq!(app.tab(), ResultTab::Pods);
        assert!(!app.fetch_eligible(OpKind::Pods));
    }

    #[tokio::test]
    async fn failed_pod_fetch_leaves_logs_and_describe_disabled() {
        let mut app = merged_app();
        let pods = ticket(app.request_fetch(OpKind::Pods));
        assert_eq!(app.request_fetch(OpKind::Pods), Dispatched::Rejected);

        app.on_completion(Completion {
            ticket: pods,
            request: Request::Pods {
                namespace: "global-ai-mlops-sit".to_string(),
            },
            outcome: Outcome::Pods(Err(ProviderError::Transport(
                "connection reset".to_string(),
            ))),
        });

        assert!(!app.pods.loading);
        assert!(app.pods.rows().is_empty());
        assert!(app.status().contains("connection reset"));
        assert!(!app.logs_eligible());
        assert!(!app.describe_eligible());
        assert_eq!(app.request_fetch(OpKind::Logs), Dispatched::Rejected);
    }

    #[tokio::test]
    async fn logs_follow_the_selected_pod() {
        let mut app = merged_app();
        let pods = ticket(app.request_fetch(OpKind::Pods));
        app.on_completion(Completion {
            ticket: pods,
            request: Request::Pods {
                namespace: "global-ai-mlops-sit".to_string(),
            },
            outcome: Outcome::Pods(Ok(vec![pod("pod-1"), pod("pod-2")])),
        });

        app.pods.select("pod-1");
        let first = ticket(app.request_fetch(OpKind::Logs));
        app.pods.select("pod-2");
        let second = app.request_fetch(OpKind::Logs);
        assert!(matches!(second, Dispatched::Superseded { .. }));

        app.on_completion(Completion {
            ticket: first,
            request: Request::Logs {
                pod: "pod-1".to_string(),
                namespace: "global-ai-mlops-sit".to_string(),
            },
            outcome: Outcome::Logs(Ok("old".to_string())),
        });
        assert_eq!(app.logs.text(), "");
        assert!(app.logs.loading);

        app.on_completion(Completion {
            ticket: ticket(second),
            request: Request::Logs {
                pod: "pod-2".to_string(),
                namespace: "global-ai-mlops-sit".to_string(),
            },
            outcome: Outcome::Logs(Ok("line one\nline two".to_string())),
        });
        assert_eq!(app.logs.pod(), Some("pod-2"));
        assert!(!app.logs.loading);
    }

    #[tokio::test]
    async fn option_cycling_wraps_through_unselected() {
        let mut app = app();
        assert_eq!(app.focused_field(), SelectionField::Region);

        app.apply_action(Action::NextOption);
        assert_eq!(app.selection().region(), Some(Region::Apac));
        app.apply_action(Action::PrevOption);
        assert_eq!(app.selection().region(), None);
        app.apply_action(Action::PrevOption);
        assert_eq!(app.selection().region(), Some(Region::Na));

        app.apply_action(Action::Down);
        assert_eq!(app.focused_field(), SelectionField::Environment);
        app.apply_action(Action::ClearField);
        assert_eq!(app.selection().environment(), None);
    }

    #[tokio::test]
    async fn filter_mode_filters_the_active_text_tab() {
        let mut app = app();
        app.logs.update("pod-1", Ok("alpha\nbeta\nalphabet".to_string()));
        app.apply_action(Action::SwitchTab(4));
        assert_eq!(app.tab(), ResultTab::Logs);
        assert_eq!(app.focus(), Focus::Results);

        app.apply_action(Action::StartFilter);
        assert_eq!(app.mode(), InputMode::Filter);
        for c in "alp".chars() {
            app.apply_action(Action::InputChar(c));
        }
        assert_eq!(app.logs.filtered(), vec!["alpha", "alphabet"]);
        assert_eq!(app.apply_action(Action::Quit), AppCommand::None);

        app.apply_action(Action::CancelInput);
        assert_eq!(app.mode(), InputMode::Normal);
        assert_eq!(app.logs.filtered().len(), 3);
        assert_eq!(app.apply_action(Action::Quit), AppCommand::Quit);
    }

    #[tokio::test]
    async fn new_logs_close_an_open_filter_on_the_logs_tab() {
        let mut app = merged_app();
        let pods = ticket(app.request_fetch(OpKind::Pods));
        app.on_completion(Completion {
            ticket: pods,
            request: Request::Pods {
                namespace: "global-ai-mlops-sit".to_string(),
            },
            outcome: Outcome::Pods(Ok(vec![pod("pod-1")])),
        });
        app.pods.select("pod-1");
        app.logs.update("pod-1", Ok("alpha\nbeta".to_string()));

        app.apply_action(Action::SwitchTab(4));
        app.apply_action(Action::StartFilter);
        app.apply_action(Action::InputChar('a'));
        app.apply_action(Action::InputChar('l'));
        assert_eq!(app.logs.filtered(), vec!["alpha"]);

        app.apply_action(Action::CancelInput);
        app.apply_action(Action::StartFilter);
        app.apply_action(Action::InputChar('b'));
        let logs = ticket(app.request_fetch(OpKind::Logs));
        app.on_completion(Completion {
            ticket: logs,
            request: Request::Logs {
                pod: "pod-1".to_string(),
                namespace: "global-ai-mlops-sit".to_string(),
            },
            outcome: Outcome::Logs(Ok("gamma\nbravo\nbeta".to_string())),
        });

        assert_eq!(app.mode(), InputMode::Normal);
        assert_eq!(app.filter_input(), "");
        assert_eq!(app.logs.filtered().len(), 3);

        app.apply_action(Action::StartFilter);
        app.apply_action(Action::InputChar('g'));
        assert_eq!(app.logs.filtered(), vec!["gamma"]);
    }

    #[test]
    fn status_is_flattened_to_one_line() {
        assert_eq!(super::one_line("\n  ERROR: boom  \ndetails"), "ERROR: boom");
        assert_eq!(super::one_line(""), "");
    }
}
