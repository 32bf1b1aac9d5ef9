use chrono::Utc;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::styles;
use super::utils::{format_relative_time, truncate};
use crate::app::{App, Category};
use crate::git::{CommandRunner, GraphRow};

/// Render the commit graph starting at `app.graph_scroll`
pub fn render<R: CommandRunner + 'static>(f: &mut Frame, area: Rect, app: &App<R>) {
    let graph = &app.snapshot.graph;
    let commits = graph.iter().filter(|r| r.commit.is_some()).count();
    let block = Block::default()
        .title(Span::styled(format!(" GRAPH ({}) ", commits), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style())
        .style(styles::surface_style());

    if graph.is_empty() {
        let message = if app.snapshot.has_failed(Category::Graph) {
            " graph unavailable"
        } else {
            " no commits"
        };
        f.render_widget(
            Paragraph::new(Span::styled(message, styles::dim_style())).block(block),
            area,
        );
        return;
    }

    let now = Utc::now();
    let viewport = area.height.saturating_sub(2) as usize;
    let width = area.width.saturating_sub(2) as usize;
    let lines: Vec<Line> = graph
        .iter()
        .skip(app.graph_scroll)
        .take(viewport)
        .map(|row| graph_line(row, width, now))
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
}

/// Color each lane glyph by its column so parallel lines stay distinguishable
fn glyph_spans(glyphs: &str) -> Vec<Span<'static>> {
    glyphs
        .chars()
        .enumerate()
        .map(|(col, ch)| {
            let style = match ch {
                '*' => Style::default()
                    .fg(styles::BRIGHT)
                    .add_modifier(Modifier::BOLD),
                ' ' => Style::default(),
                _ => Style::default().fg(styles::LANE_COLORS[(col / 2) % styles::LANE_COLORS.len()]),
            };
            Span::styled(ch.to_string(), style)
        })
        .collect()
}

fn graph_line(row: &GraphRow, width: usize, now: chrono::DateTime<Utc>) -> Line<'static> {
    let mut spans = glyph_spans(&row.glyphs);
    let Some(commit) = &row.commit else {
        return Line::from(spans);
    };

    spans.push(Span::styled(
        format!("{} ", commit.short_hash),
        Style::default().fg(styles::YELLOW),
    ));
    if !commit.refs.is_empty() {
        spans.push(Span::styled(
            format!("({}) ", commit.refs.join(", ")),
            Style::default()
                .fg(styles::CYAN)
                .add_modifier(Modifier::BOLD),
        ));
    }

    let meta = format!(
        " {} · {}",
        commit.author,
        format_relative_time(commit.date, now)
    );
    let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let subject_width = width.saturating_sub(used + meta.chars().count());
    let subject_style = if commit.is_merge() {
        styles::dim_style()
    } else {
        Style::default().fg(styles::TEXT)
    };
    spans.push(Span::styled(truncate(&commit.subject, subject_width), subject_style));
    spans.push(Span::styled(meta, styles::dim_style()));
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::Commit;
    use chrono::TimeZone;

    fn commit_row(glyphs: &str, subject: &str) -> GraphRow {
        GraphRow {
            glyphs: glyphs.to_string(),
            commit: Some(Commit {
                hash: "a".repeat(40),
                short_hash: "aaaaaaa".to_string(),
                author: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                date: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
                refs: vec!["HEAD -> main".to_string()],
                parents: vec!["b".repeat(40)],
                subject: subject.to_string(),
            }),
        }
    }

    fn text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn connector_rows_render_glyphs_only() {
        let row = GraphRow {
            glyphs: "|\\".to_string(),
            commit: None,
        };
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(text(&graph_line(&row, 80, now)), "|\\");
    }

    #[test]
    fn commit_rows_show_hash_refs_and_subject() {
        let now = Utc.timestamp_opt(1_700_000_000 + 7200, 0).unwrap();
        let rendered = text(&graph_line(&commit_row("* ", "fix parser"), 120, now));
        assert_eq!(
            rendered,
            "* aaaaaaa (HEAD -> main) fix parser Ada · 2h ago"
        );
    }

    #[test]
    fn long_subjects_are_truncated_to_fit() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let line = graph_line(&commit_row("* ", &"x".repeat(200)), 60, now);
        assert!(text(&line).chars().count() <= 60);
    }
}
