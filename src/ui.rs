use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Tabs, Wrap};

use crate::app::{App, Focus, InputMode, ResultTab};
use crate::dispatch::OpKind;
use crate::selection::SelectionField;
use crate::views::{NamesView, TextView};

const BG: Color = Color::Rgb(9, 15, 25);
const PANEL: Color = Color::Rgb(16, 27, 44);
const ACCENT: Color = Color::Rgb(52, 211, 153);
const MUTED: Color = Color::Rgb(140, 156, 178);
const WARN: Color = Color::Rgb(251, 191, 36);
const ERROR: Color = Color::Rgb(248, 113, 113);
const HIGHLIGHT: Color = Color::Rgb(24, 36, 58);

pub fn render(frame: &mut Frame, app: &App) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, root[0], app);
    render_body(frame, root[1], app);
    render_footer(frame, root[2], app);

    if app.show_help() {
        render_help_modal(frame, app);
    }
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let selection = app.selection();
    let merged = match selection.last_merged() {
        Some(target) if selection.merge_succeeded() => {
            Span::styled(format!("ctx {}", target.cluster), Style::default().fg(ACCENT))
        }
        Some(target) => Span::styled(
            format!("last merged {}", target.cluster),
            Style::default().fg(MUTED),
        ),
        None => Span::styled("no cluster merged", Style::default().fg(MUTED)),
    };

    let line = Line::from(vec![
        Span::styled(
            " aksnav ",
            Style::default()
                .fg(BG)
                .bg(ACCENT)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!("provider:{}", app.provider_label()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  "),
        merged,
    ]);
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(BG)), area);
}

fn render_body(frame: &mut Frame, area: Rect, app: &App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(44), Constraint::Min(20)])
        .split(area);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(4)])
        .split(columns[0]);
    render_selectors(frame, left[0], app);
    render_actions(frame, left[1], app);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3)])
        .split(columns[1]);
    render_tabs(frame, right[0], app);
    render_result(frame, right[1], app);
}

fn render_selectors(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus() == Focus::Selectors;
    let selection = app.selection();

    let lines = SelectionField::ALL
        .iter()
        .map(|field| {
            let current = *field == app.focused_field();
            let marker = if current && focused { "› " } else { "  " };
            let value = selection.value(*field);
            let value_span = match value {
                Some(value) => Span::styled(value, Style::default().fg(Color::White)),
                None if selection.options(*field).is_empty() => {
                    Span::styled("-", Style::default().fg(MUTED))
                }
                None => Span::styled(field.placeholder(), Style::default().fg(MUTED)),
            };
            let label_style = if current {
                Style::default().fg(ACCENT).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(MUTED)
            };

            Line::from(vec![
                Span::styled(marker, Style::default().fg(ACCENT)),
                Span::styled(format!("{:<15}", field.title()), label_style),
                value_span,
            ])
        })
        .collect::<Vec<_>>();

    let paragraph = Paragraph::new(lines).block(panel_block("Selection", focused));
    frame.render_widget(paragraph, area);
}

fn render_actions(frame: &mut Frame, area: Rect, app: &App) {
    let actions = [
        ("m", "Merge", OpKind::Merge),
        ("p", "Pods", OpKind::Pods),
        ("s", "Secrets", OpKind::Secrets),
        ("D", "Deployments", OpKind::Deployments),
        ("l", "Logs", OpKind::Logs),
        ("d", "Describe", OpKind::Describe),
    ];

    let mut lines = actions
        .iter()
        .map(|(key, label, kind)| {
            let style = if app.fetch_eligible(*kind) {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(MUTED).add_modifier(Modifier::DIM)
            };
            Line::from(vec![
                Span::styled(format!(" {key} "), Style::default().fg(ACCENT)),
                Span::styled(label.to_string(), style),
            ])
        })
        .collect::<Vec<_>>();

    if let Some(pod) = app.pods.selected() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(" pod ", Style::default().fg(MUTED)),
            Span::styled(compact_text(pod, 36), Style::default().fg(WARN)),
        ]));
    }

    frame.render_widget(
        Paragraph::new(lines).block(panel_block("Actions", false)),
        area,
    );
}

fn render_tabs(frame: &mut Frame, area: Rect, app: &App) {
    let titles = ResultTab::ALL
        .iter()
        .enumerate()
        .map(|(index, tab)| {
            let spinner = if tab_loading(app, *tab) { "*" } else { "" };
            Line::from(format!("{} {}{spinner}", index + 1, tab.title()))
        })
        .collect::<Vec<_>>();
    let selected = ResultTab::ALL
        .iter()
        .position(|tab| *tab == app.tab())
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(MUTED).bg(BG))
        .highlight_style(Style::default().fg(ACCENT).add_modifier(Modifier::BOLD))
        .divider("│");
    frame.render_widget(tabs, area);
}

fn tab_loading(app: &App, tab: ResultTab) -> bool {
    match tab {
        ResultTab::Merge => app.merge.loading,
        ResultTab::Pods => app.pods.loading,
        ResultTab::Secrets => app.secrets.loading,
        ResultTab::Deployments => app.deployments.loading,
        ResultTab::Logs => app.logs.loading,
        ResultTab::Describe => app.describe.loading,
    }
}

fn render_result(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus() == Focus::Results;
    match app.tab() {
        ResultTab::Merge => render_merge(frame, area, app, focused),
        ResultTab::Pods => render_pods(frame, area, app, focused),
        ResultTab::Secrets => render_names(frame, area, "Secrets", &app.secrets, focused),
        ResultTab::Deployments => {
            render_names(frame, area, "Deployments", &app.deployments, focused)
        }
        ResultTab::Logs => render_text(frame, area, "Logs", &app.logs, focused, false),
        ResultTab::Describe => render_text(frame, area, "Describe", &app.describe, focused, true),
    }
}

fn render_merge(frame: &mut Frame, area: Rect, app: &App, focused: bool) {
    let view = &app.merge;
    let mut lines = Vec::new();
    if let Some(pending) = app.selection().pending_merge()
        && view.loading
    {
        lines.push(Line::styled(
            format!("Merging credentials for {pending}..."),
            Style::default().fg(WARN),
        ));
    }
    if let Some(target) = view.target() {
        lines.push(Line::from(vec![
            Span::styled("target  ", Style::default().fg(MUTED)),
            Span::raw(target.to_string()),
        ]));
    }
    if let Some(message) = view.message() {
        let color = if view.success() { ACCENT } else { ERROR };
        lines.push(Line::from(""));
        lines.extend(
            message
                .lines()
                .map(|line| Line::styled(line.to_string(), Style::default().fg(color))),
        );
    }
    if lines.is_empty() {
        lines.push(Line::styled(
            "Select a cluster and press m to merge its credentials.",
            Style::default().fg(MUTED),
        ));
    }

    let paragraph = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(panel_block("Merge", focused));
    frame.render_widget(paragraph, area);
}

fn render_pods(frame: &mut Frame, area: Rect, app: &App, focused: bool) {
    let view = &app.pods;
    if let Some(error) = view.error() {
        render_error(frame, area, "Pods", error, focused);
        return;
    }

    let header = Row::new(["NAME", "STATUS", "AGE", "RESTARTS"].map(|title| {
        Cell::from(title).style(Style::default().add_modifier(Modifier::BOLD))
    }))
    .style(Style::default().fg(ACCENT));

    let rows = view.rows().iter().map(|row| {
        let selected = view.selected() == Some(row.name.as_str());
        let name_style = if selected {
            Style::default().fg(WARN).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        Row::new(vec![
            Cell::from(row.name.clone()).style(name_style),
            Cell::from(row.status.clone()).style(Style::default().fg(status_color(&row.status))),
            Cell::from(row.age.clone()),
            Cell::from(row.restart_count.to_string()),
        ])
    });

    let title = match view.refreshed_at() {
        Some(at) => format!("Pods ({}) @ {}", view.rows().len(), at.format("%H:%M:%S")),
        None => "Pods".to_string(),
    };
    let table = Table::new(
        rows,
        [
            Constraint::Percentage(50),
            Constraint::Percentage(20),
            Constraint::Percentage(15),
            Constraint::Percentage(15),
        ],
    )
    .header(header)
    .block(panel_block(&title, focused))
    .column_spacing(1)
    .row_highlight_style(Style::default().bg(HIGHLIGHT).add_modifier(Modifier::BOLD))
    .highlight_symbol("> ");

    let mut state = TableState::default();
    if !view.rows().is_empty() {
        state.select(Some(view.cursor()));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_names(frame: &mut Frame, area: Rect, title: &str, view: &NamesView, focused: bool) {
    if let Some(error) = view.error() {
        render_error(frame, area, title, error, focused);
        return;
    }

    let rows = view
        .names()
        .iter()
        .map(|name| Row::new(vec![Cell::from(name.clone())]));
    let table = Table::new(rows, [Constraint::Percentage(100)])
        .block(panel_block(&format!("{title} ({})", view.names().len()), focused))
        .row_highlight_style(Style::default().bg(HIGHLIGHT))
        .highlight_symbol("> ");

    let mut state = TableState::default();
    if !view.names().is_empty() {
        state.select(Some(view.cursor()));
    }
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_text(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    view: &TextView,
    focused: bool,
    yaml: bool,
) {
    if let Some(error) = view.error() {
        render_error(frame, area, title, error, focused);
        return;
    }

    let lines = view.filtered();
    let text = if yaml {
        Text::from(lines.iter().map(|line| highlight_yaml_line(line)).collect::<Vec<_>>())
    } else {
        Text::from(
            lines
                .iter()
                .map(|line| Line::from(line.to_string()))
                .collect::<Vec<_>>(),
        )
    };

    let mut heading = match view.pod() {
        Some(pod) => format!("{title}: {pod}"),
        None => title.to_string(),
    };
    if !view.filter_text().is_empty() {
        heading.push_str(&format!(
            " [/{}] {}/{}",
            view.filter_text(),
            lines.len(),
            view.text().lines().count()
        ));
    }

    let scroll = u16::try_from(view.scroll()).unwrap_or(u16::MAX);
    let paragraph = Paragraph::new(text)
        .block(panel_block(&heading, focused))
        .style(Style::default().fg(Color::White))
        .scroll((scroll, 0));
    frame.render_widget(paragraph, area);
}

fn render_error(frame: &mut Frame, area: Rect, title: &str, error: &str, focused: bool) {
    let panel = Paragraph::new(Text::from(error.to_string()))
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title(format!("{title} Error"))
                .borders(Borders::ALL)
                .border_style(if focused {
                    Style::default().fg(ERROR)
                } else {
                    Style::default().fg(MUTED)
                })
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(ERROR));
    frame.render_widget(panel, area);
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let line = match app.mode() {
        InputMode::Filter => Line::from(vec![
            Span::styled(" / ", Style::default().fg(BG).bg(WARN)),
            Span::raw(" "),
            Span::styled(app.filter_input().to_string(), Style::default().fg(Color::White)),
            Span::styled("▏", Style::default().fg(WARN)),
        ]),
        InputMode::Normal => Line::from(vec![
            Span::styled(" ? help ", Style::default().fg(BG).bg(MUTED)),
            Span::raw(" "),
            Span::styled(
                compact_text(app.status(), usize::from(area.width.saturating_sub(10))),
                Style::default().fg(status_text_color(app.status())),
            ),
        ]),
    };
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(BG)), area);
}

fn render_help_modal(frame: &mut Frame, app: &App) {
    let area = centered_rect(70, 60, frame.area());
    frame.render_widget(Clear, area);

    let lines = [
        format!("aksnav help  provider:{}", app.provider_label()),
        String::new(),
        "Tab          switch focus between selectors and results".to_string(),
        "j/k ↑/↓      move field focus, cursor or scroll".to_string(),
        "←/→ Enter    cycle the focused selector's options".to_string(),
        "x Backspace  clear the focused selector".to_string(),
        "m            merge credentials for the selected cluster".to_string(),
        "p s D        fetch pods, secrets, deployments".to_string(),
        "Enter        select the pod under the cursor (Pods tab)".to_string(),
        "l d          logs or describe for the selected pod".to_string(),
        "1-6 [ ]      switch result tab".to_string(),
        "/            filter Logs or Describe, Esc clears".to_string(),
        "q Ctrl+c     quit".to_string(),
    ];

    let modal = Paragraph::new(lines.into_iter().map(Line::from).collect::<Vec<_>>())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(ACCENT))
                .style(Style::default().bg(PANEL)),
        )
        .style(Style::default().fg(Color::White));
    frame.render_widget(modal, area);
}

fn panel_block(title: &str, focused: bool) -> Block<'static> {
    Block::default()
        .title(title.to_string())
        .borders(Borders::ALL)
        .border_style(if focused {
            Style::default().fg(ACCENT)
        } else {
            Style::default().fg(MUTED)
        })
        .style(Style::default().bg(PANEL))
}

fn status_color(status: &str) -> Color {
    match status {
        "Running" | "Succeeded" => ACCENT,
        "Pending" => WARN,
        "Failed" | "Unknown" => ERROR,
        _ => Color::White,
    }
}

fn status_text_color(status: &str) -> Color {
    let lower = status.to_ascii_lowercase();
    if lower.contains("failed") || lower.contains("error") || lower.contains("not found") {
        ERROR
    } else if lower.contains("ignored") || lower.contains("already") || lower.contains("first") {
        WARN
    } else {
        Color::White
    }
}

fn highlight_yaml_line(line: &str) -> Line<'static> {
    let indent_len = line.len() - line.trim_start_matches([' ', '\t']).len();
    let (indent, content) = line.split_at(indent_len);

    let mut spans = vec![Span::raw(indent.to_string())];
    let content = match content.strip_prefix("- ") {
        Some(rest) => {
            spans.push(Span::styled("- ", Style::default().fg(ACCENT)));
            rest
        }
        None => content,
    };

    match content.split_once(':') {
        Some((key, value)) if !key.is_empty() && !key.contains(' ') => {
            spans.push(Span::styled(
                key.to_string(),
                Style::default().fg(Color::Rgb(103, 232, 249)),
            ));
            spans.push(Span::styled(":", Style::default().fg(MUTED)));
            spans.push(Span::raw(value.to_string()));
        }
        _ => spans.push(Span::raw(content.to_string())),
    }
    Line::from(spans)
}

fn compact_text(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        return value.to_string();
    }

    if max_chars <= 1 {
        return "…".to_string();
    }

    let mut out = value
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    out.push('…');
    out
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{compact_text, highlight_yaml_line};

    #[test]
    fn compact_text_truncates_with_ellipsis() {
        assert_eq!(compact_text("aks-na-sit-1", 20), "aks-na-sit-1");
        assert_eq!(compact_text("aks-na-sit-1", 6), "aks-n…");
    }

    #[test]
    fn yaml_keys_are_split_from_values() {
        let line = highlight_yaml_line("  - name: main");
        let contents = line
            .spans
            .iter()
            .map(|span| span.content.as_ref())
            .collect::<Vec<_>>();
        assert_eq!(contents, vec!["  ", "- ", "name", ":", " main"]);
    }
}
