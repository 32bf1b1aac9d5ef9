use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::styles;
use crate::app::{App, View};
use crate::git::CommandRunner;

/// Compute the display width of a list of spans
fn spans_width(spans: &[Span]) -> usize {
    spans.iter().map(|s| s.content.chars().count()).sum()
}

/// Top bar: `repo · branch` on the left, view tabs on the right
pub fn render_top_bar<R: CommandRunner + 'static>(f: &mut Frame, area: Rect, app: &App<R>) {
    let mut left: Vec<Span> = vec![
        Span::styled(format!(" {}", app.repo_name()), Style::default().fg(styles::CYAN)),
        Span::styled(" · ", styles::border_style()),
        Span::styled(
            app.snapshot.branch_label().to_string(),
            Style::default().fg(styles::GREEN),
        ),
    ];
    if app.refreshing {
        left.push(Span::styled(" ⟳", styles::dim_style()));
    }

    let mut right: Vec<Span> = Vec::new();
    for (i, view) in View::ALL.iter().enumerate() {
        let label = format!(" {} {} ", i + 1, view.label());
        if *view == app.view {
            right.push(Span::styled(label, styles::badge_style(styles::BLUE)));
        } else {
            right.push(Span::styled(label, Style::default().fg(styles::MUTED)));
        }
    }

    let gap = (area.width as usize).saturating_sub(spans_width(&left) + spans_width(&right));
    left.push(Span::raw(" ".repeat(gap)));
    left.extend(right);

    f.render_widget(
        Paragraph::new(Line::from(left)).style(styles::panel_style()),
        area,
    );
}

fn hint<'a>(key: &'a str, action: &'a str) -> [Span<'a>; 2] {
    [
        Span::styled(key, styles::key_hint_style()),
        Span::styled(format!(" {}  ", action), styles::dim_style()),
    ]
}

/// Bottom bar: an open prompt, else the latest notification, else key hints
pub fn render_bottom_bar<R: CommandRunner + 'static>(f: &mut Frame, area: Rect, app: &App<R>) {
    if let Some(prompt) = &app.prompt {
        let mut spans = vec![
            Span::styled(format!(" {} ", prompt.kind.label()), styles::badge_style(styles::YELLOW)),
            Span::styled(format!(" {}", prompt.input), Style::default().fg(styles::TEXT)),
            Span::styled("█", Style::default().fg(styles::YELLOW)),
            Span::raw("  "),
        ];
        spans.extend(hint("Enter", "confirm"));
        spans.extend(hint("Esc", "cancel"));
        f.render_widget(
            Paragraph::new(Line::from(spans)).style(styles::panel_style()),
            area,
        );
        return;
    }

    if let Some((message, _)) = &app.notification {
        let accent = if message.starts_with("Failed") {
            styles::RED
        } else {
            styles::GREEN
        };
        let spans = vec![
            Span::styled(" ● ", Style::default().fg(accent)),
            Span::styled(message.as_str(), Style::default().fg(styles::TEXT)),
        ];
        f.render_widget(
            Paragraph::new(Line::from(spans)).style(styles::panel_style()),
            area,
        );
        return;
    }

    let mut spans: Vec<Span> = vec![Span::raw(" ")];
    match app.view {
        View::Dashboard => {
            spans.extend(hint("j/k", "select"));
            spans.extend(hint("s", "stage"));
            spans.extend(hint("u", "unstage"));
            spans.extend(hint("a", "stage all"));
            spans.extend(hint("c", "commit"));
            spans.extend(hint("d", "diff"));
        }
        View::Branches => {
            spans.extend(hint("j/k", "select"));
            spans.extend(hint("Enter", "checkout"));
            spans.extend(hint("n", "new"));
            spans.extend(hint("d/D", "delete"));
        }
        View::Graph => {
            spans.extend(hint("j/k", "scroll"));
        }
    }
    spans.extend(hint("Tab", "view"));
    spans.extend(hint("r", "refresh"));
    spans.extend(hint("q", "quit"));

    let errors = app.snapshot.errors.len();
    let status = if errors > 0 {
        Span::styled(
            format!("{} failed ", errors),
            Style::default().fg(styles::RED),
        )
    } else if app.watching {
        Span::styled("watching ", styles::dim_style())
    } else {
        Span::raw("")
    };
    let gap = (area.width as usize).saturating_sub(spans_width(&spans) + status.content.chars().count());
    spans.push(Span::raw(" ".repeat(gap)));
    spans.push(status);

    f.render_widget(
        Paragraph::new(Line::from(spans)).style(styles::panel_style()),
        area,
    );
}
