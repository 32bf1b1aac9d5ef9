use ratatui::style::{Color, Modifier, Style};

use crate::git::ChangeStatus;

// ── Background colors ──
pub const BG: Color = Color::Rgb(12, 12, 12);
pub const SURFACE: Color = Color::Rgb(20, 20, 20);
pub const PANEL: Color = Color::Rgb(26, 26, 26);
pub const BORDER: Color = Color::Rgb(42, 42, 42);

// ── Text colors ──
pub const TEXT: Color = Color::Rgb(200, 200, 200);
pub const DIM: Color = Color::Rgb(102, 102, 102);
pub const MUTED: Color = Color::Rgb(136, 136, 136);
pub const BRIGHT: Color = Color::Rgb(232, 232, 232);

// ── Accent colors ──
pub const BLUE: Color = Color::Rgb(96, 165, 250);
pub const CYAN: Color = Color::Rgb(34, 211, 238);
pub const GREEN: Color = Color::Rgb(74, 222, 128);
pub const YELLOW: Color = Color::Rgb(250, 204, 21);
pub const RED: Color = Color::Rgb(248, 113, 113);
pub const PURPLE: Color = Color::Rgb(167, 139, 250);

/// Colors cycled across graph lanes
pub const LANE_COLORS: [Color; 5] = [BLUE, PURPLE, CYAN, YELLOW, GREEN];

// ── Composed styles ──

pub fn surface_style() -> Style {
    Style::default().fg(TEXT).bg(SURFACE)
}

pub fn panel_style() -> Style {
    Style::default().bg(PANEL)
}

pub fn dim_style() -> Style {
    Style::default().fg(DIM)
}

pub fn border_style() -> Style {
    Style::default().fg(BORDER)
}

pub fn title_style() -> Style {
    Style::default().fg(BRIGHT).add_modifier(Modifier::BOLD)
}

pub fn selected_style() -> Style {
    Style::default().fg(BLUE).bg(Color::Rgb(26, 42, 58))
}

pub fn key_hint_style() -> Style {
    Style::default().fg(MUTED).add_modifier(Modifier::BOLD)
}

pub fn badge_style(accent: Color) -> Style {
    Style::default()
        .fg(BG)
        .bg(accent)
        .add_modifier(Modifier::BOLD)
}

pub fn added_style() -> Style {
    Style::default().fg(GREEN)
}

pub fn deleted_style() -> Style {
    Style::default().fg(RED)
}

pub fn hunk_header_style() -> Style {
    Style::default().fg(PURPLE)
}

pub fn status_style(status: ChangeStatus) -> Style {
    let color = match status {
        ChangeStatus::Added | ChangeStatus::Untracked => GREEN,
        ChangeStatus::Deleted => RED,
        ChangeStatus::Modified => YELLOW,
        ChangeStatus::Renamed | ChangeStatus::Copied => PURPLE,
        ChangeStatus::Updated => CYAN,
    };
    Style::default().fg(color).add_modifier(Modifier::BOLD)
}
