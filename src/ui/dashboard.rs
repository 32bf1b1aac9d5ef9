use chrono::Utc;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding, Paragraph},
    Frame,
};

use super::styles;
use super::utils::{format_relative_time, shorten_path, truncate};
use crate::app::{App, Category};
use crate::git::{CommandRunner, Divergence};

const SUMMARY_WIDTH: u16 = 38;

/// Render the dashboard: repository summary on the left, changed files on the right
pub fn render<R: CommandRunner + 'static>(f: &mut Frame, area: Rect, app: &App<R>) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(SUMMARY_WIDTH), Constraint::Min(1)])
        .split(area);

    render_summary(f, columns[0], app);
    match &app.diff_preview {
        Some(diff) => {
            let panes = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
                .split(columns[1]);
            render_files(f, panes[0], app);
            render_diff(f, panes[1], app, diff);
        }
        None => render_files(f, columns[1], app),
    }
}

fn label(text: &str) -> Span<'static> {
    Span::styled(format!("{:<12}", text), styles::dim_style())
}

fn divergence_spans(d: Divergence) -> Vec<Span<'static>> {
    if d.is_even() {
        return vec![Span::styled("up to date", styles::dim_style())];
    }
    vec![
        Span::styled(format!("↑{}", d.ahead), styles::added_style()),
        Span::raw(" "),
        Span::styled(format!("↓{}", d.behind), styles::deleted_style()),
    ]
}

fn render_summary<R: CommandRunner + 'static>(f: &mut Frame, area: Rect, app: &App<R>) {
    let snap = &app.snapshot;
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(vec![
        label("Branch"),
        Span::styled(
            snap.branch_label().to_string(),
            Style::default()
                .fg(styles::GREEN)
                .add_modifier(Modifier::BOLD),
        ),
    ]));

    let summary = snap.summary();
    let summary_style = if snap.files.is_empty() {
        styles::added_style()
    } else {
        Style::default().fg(styles::YELLOW)
    };
    lines.push(Line::from(vec![
        label("Status"),
        Span::styled(summary.to_string(), summary_style),
    ]));

    let mut upstream = vec![label("Upstream")];
    upstream.extend(divergence_spans(snap.upstream));
    lines.push(Line::from(upstream));

    match &snap.default_comparison {
        Some(cmp) if cmp.is_default => lines.push(Line::from(vec![
            label("Default"),
            Span::styled(format!("on {}", cmp.default_branch), styles::dim_style()),
        ])),
        Some(cmp) => {
            let mut spans = vec![
                label("Default"),
                Span::styled(format!("{} ", cmp.default_branch), Style::default().fg(styles::CYAN)),
            ];
            spans.extend(divergence_spans(cmp.divergence));
            lines.push(Line::from(spans));
        }
        None => lines.push(Line::from(vec![
            label("Default"),
            Span::styled("unknown", styles::dim_style()),
        ])),
    }

    let last_commit = match snap.last_commit {
        Some(time) => format_relative_time(time, Utc::now()),
        None if snap.has_failed(Category::LastCommit) => "unavailable".to_string(),
        None => "no commits".to_string(),
    };
    lines.push(Line::from(vec![
        label("Last commit"),
        Span::styled(last_commit, Style::default().fg(styles::TEXT)),
    ]));

    lines.push(Line::from(vec![
        label("Lines"),
        Span::styled(format!("+{}", snap.totals.added), styles::added_style()),
        Span::raw(" "),
        Span::styled(format!("-{}", snap.totals.deleted), styles::deleted_style()),
    ]));

    let local = snap.branches.iter().filter(|b| !b.is_remote).count();
    let remote = snap.branches.len() - local;
    lines.push(Line::from(vec![
        label("Branches"),
        Span::styled(
            format!("{} local · {} remote", local, remote),
            Style::default().fg(styles::TEXT),
        ),
    ]));

    if snap.skipped_lines > 0 {
        lines.push(Line::from(vec![
            label("Skipped"),
            Span::styled(
                format!("{} unparsable lines", snap.skipped_lines),
                Style::default().fg(styles::YELLOW),
            ),
        ]));
    }

    if !snap.errors.is_empty() {
        lines.push(Line::from(""));
        for err in &snap.errors {
            lines.push(Line::from(vec![
                Span::styled(" ✗ ", styles::deleted_style()),
                Span::styled(err.category.label().to_string(), styles::deleted_style()),
            ]));
        }
    }

    let block = Block::default()
        .title(Span::styled(format!(" {} ", app.repo_name()), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style())
        .padding(Padding::horizontal(1))
        .style(styles::surface_style());

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_files<R: CommandRunner + 'static>(f: &mut Frame, area: Rect, app: &App<R>) {
    let snap = &app.snapshot;
    let title = format!(" CHANGES ({}) ", snap.files.len());
    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style())
        .style(styles::surface_style());

    if snap.files.is_empty() {
        let message = if snap.has_failed(Category::Status) {
            " status unavailable"
        } else {
            " working tree clean"
        };
        f.render_widget(
            Paragraph::new(Span::styled(message, styles::dim_style())).block(block),
            area,
        );
        return;
    }

    // Keep the selection inside the viewport
    let viewport = area.height.saturating_sub(2) as usize;
    let scroll = if viewport == 0 {
        0
    } else {
        app.selected_file.saturating_sub(viewport.saturating_sub(1))
    };

    let inner_width = area.width.saturating_sub(2) as usize;
    let items: Vec<ListItem> = snap
        .files
        .iter()
        .enumerate()
        .skip(scroll)
        .take(viewport)
        .map(|(idx, file)| {
            let code_style = file
                .staged_status
                .or(file.status)
                .map(styles::status_style)
                .unwrap_or_else(styles::dim_style);
            let stat = snap.file_stat(&file.path);
            let stat_text = stat
                .map(|s| format!("+{} -{}", s.added, s.deleted))
                .unwrap_or_default();
            let staged_marker = if file.is_staged { "●" } else { " " };
            let path_width = inner_width.saturating_sub(8 + stat_text.chars().count() + 1);
            let path = shorten_path(&file.path, path_width);
            let padding = path_width.saturating_sub(path.chars().count());

            let mut spans = vec![
                Span::styled(format!(" {} ", file.display_status()), code_style),
                Span::styled(format!("{} ", staged_marker), styles::added_style()),
                Span::raw(path),
                Span::raw(" ".repeat(padding + 1)),
            ];
            if let Some(s) = stat {
                spans.push(Span::styled(format!("+{}", s.added), styles::added_style()));
                spans.push(Span::raw(" "));
                spans.push(Span::styled(format!("-{}", s.deleted), styles::deleted_style()));
            }

            let style = if idx == app.selected_file {
                styles::selected_style()
            } else {
                styles::surface_style()
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}

fn render_diff<R: CommandRunner + 'static>(f: &mut Frame, area: Rect, app: &App<R>, diff: &str) {
    let title = match app.selected_file() {
        Some(file) if file.is_staged => format!(" DIFF {} (staged) ", file.path),
        Some(file) => format!(" DIFF {} ", file.path),
        None => " DIFF ".to_string(),
    };
    let block = Block::default()
        .title(Span::styled(title, styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style())
        .style(styles::surface_style());

    if diff.is_empty() {
        f.render_widget(
            Paragraph::new(Span::styled(" no diff", styles::dim_style())).block(block),
            area,
        );
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let viewport = area.height.saturating_sub(2) as usize;
    let lines: Vec<Line> = diff
        .lines()
        .take(viewport)
        .map(|line| Line::from(Span::styled(truncate(line, width), diff_line_style(line))))
        .collect();
    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn diff_line_style(line: &str) -> Style {
    if line.starts_with("+++") || line.starts_with("---") {
        Style::default().fg(styles::BRIGHT).add_modifier(Modifier::BOLD)
    } else if line.starts_with("@@") {
        styles::hunk_header_style()
    } else if line.starts_with('+') {
        styles::added_style()
    } else if line.starts_with('-') {
        styles::deleted_style()
    } else if line.starts_with("diff ") || line.starts_with("index ") {
        styles::dim_style()
    } else {
        Style::default().fg(styles::TEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_lines_are_styled_by_prefix() {
        assert_eq!(diff_line_style("+added"), styles::added_style());
        assert_eq!(diff_line_style("-gone"), styles::deleted_style());
        assert_eq!(diff_line_style("@@ -1,2 +1,3 @@"), styles::hunk_header_style());
        assert_ne!(diff_line_style("+++ b/src/lib.rs"), styles::added_style());
        assert_ne!(diff_line_style("--- a/src/lib.rs"), styles::deleted_style());
        assert_eq!(diff_line_style(" context"), Style::default().fg(styles::TEXT));
    }
}
