mod branches;
mod dashboard;
mod graph;
mod status_bar;
mod styles;
mod utils;

use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::Frame;

use crate::app::{App, View};
use crate::git::CommandRunner;

/// Render the entire UI
pub fn draw<R: CommandRunner + 'static>(f: &mut Frame, app: &App<R>) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // top bar
            Constraint::Min(1),    // main content
            Constraint::Length(1), // bottom bar
        ])
        .split(f.area());

    status_bar::render_top_bar(f, outer[0], app);

    match app.view {
        View::Dashboard => dashboard::render(f, outer[1], app),
        View::Branches => branches::render(f, outer[1], app),
        View::Graph => graph::render(f, outer[1], app),
    }

    status_bar::render_bottom_bar(f, outer[2], app);
}
