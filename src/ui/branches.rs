use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::styles;
use super::utils::truncate;
use crate::app::{App, Category};
use crate::git::CommandRunner;

/// Render the branch list, local branches first as git reports them
pub fn render<R: CommandRunner + 'static>(f: &mut Frame, area: Rect, app: &App<R>) {
    let branches = app.visible_branches();
    let block = Block::default()
        .title(Span::styled(
            format!(" BRANCHES ({}) ", branches.len()),
            styles::title_style(),
        ))
        .borders(Borders::ALL)
        .border_style(styles::border_style())
        .style(styles::surface_style());

    if branches.is_empty() {
        let message = if app.snapshot.has_failed(Category::Branches) {
            " branches unavailable"
        } else {
            " no branches"
        };
        f.render_widget(
            Paragraph::new(Span::styled(message, styles::dim_style())).block(block),
            area,
        );
        return;
    }

    let name_width = branches
        .iter()
        .map(|b| b.name.chars().count())
        .max()
        .unwrap_or(0)
        .min(40);

    let viewport = area.height.saturating_sub(2) as usize;
    let scroll = app
        .selected_branch
        .saturating_sub(viewport.saturating_sub(1));

    let items: Vec<ListItem> = branches
        .iter()
        .enumerate()
        .skip(scroll)
        .take(viewport)
        .map(|(idx, branch)| {
            let marker = if branch.is_current { "*" } else { " " };
            let name_style = if branch.is_current {
                Style::default()
                    .fg(styles::GREEN)
                    .add_modifier(Modifier::BOLD)
            } else if branch.is_remote {
                Style::default().fg(styles::RED)
            } else {
                Style::default().fg(styles::TEXT)
            };

            let mut spans = vec![
                Span::styled(format!(" {} ", marker), styles::added_style()),
                Span::styled(
                    format!("{:<width$} ", truncate(&branch.name, name_width), width = name_width),
                    name_style,
                ),
                Span::styled(format!("{} ", branch.hash), Style::default().fg(styles::YELLOW)),
            ];

            if !branch.upstream.is_empty() {
                let d = branch.divergence();
                let remote_ref = branch
                    .upstream
                    .split_once(':')
                    .map_or(branch.upstream.as_str(), |(name, _)| name);
                let tracking = if d.is_even() {
                    format!("[{}] ", remote_ref)
                } else {
                    format!("[{} ↑{} ↓{}] ", remote_ref, d.ahead, d.behind)
                };
                spans.push(Span::styled(tracking, Style::default().fg(styles::BLUE)));
            }
            spans.push(Span::styled(branch.last_commit.clone(), styles::dim_style()));

            let style = if idx == app.selected_branch {
                styles::selected_style()
            } else {
                styles::surface_style()
            };
            ListItem::new(Line::from(spans)).style(style)
        })
        .collect();

    f.render_widget(List::new(items).block(block), area);
}
