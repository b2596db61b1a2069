//! Colours and text styles for every screen

use ratatui::style::{Color, Modifier, Style};

/// Built once at startup and passed to every draw function
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    pub border: Style,
    pub title: Style,
    pub subtitle: Style,
    pub text: Style,
    pub muted: Style,
    pub accent: Style,
    pub selected: Style,
    pub success: Style,
    pub danger: Style,
    pub key: Style,
}

impl Theme {
    /// Deep-space palette: indigo frame, cyan accents
    pub fn quantum() -> Self {
        Self {
            border: Style::default().fg(Color::Indexed(61)),
            title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            subtitle: Style::default().fg(Color::Indexed(147)),
            text: Style::default().fg(Color::Gray),
            muted: Style::default().fg(Color::DarkGray),
            accent: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            selected: Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            success: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            danger: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            key: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::quantum()
    }
}
