//! Semantic color roles for the TUI.
//!
//! `ThemeVariant` picks a `ColorPalette`; `StyleMap` resolves role names to
//! concrete ratatui styles at render time.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Case-insensitive lookup of a config value.
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

/// Every semantic UI role mapped to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- Topic tree --
    pub tree_normal: Style,
    pub tree_selected: Style,
    pub tree_completed: Style,
    pub tree_marker: Style,
    pub tree_open: Style,

    // -- Detail pane --
    pub detail_title: Style,
    pub detail_heading: Style,
    pub detail_body: Style,
    pub detail_section: Style,
    pub detail_placeholder: Style,
    pub detail_code_block: Style,
    pub detail_inline_code: Style,
    pub detail_emphasis: Style,
    pub detail_strong: Style,
    pub detail_link: Style,
    pub badge_pending: Style,
    pub badge_completed: Style,
    pub resource_kind: Style,
    pub resource_summary: Style,
    pub list_selected: Style,
    pub answer: Style,

    // -- Chrome --
    pub header: Style,
    pub status_bar: Style,
    pub status_busy: Style,
    pub error: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
    pub input_border: Style,
    pub notice_border: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            tree_normal: Style::default(),
            tree_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            tree_completed: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::CROSSED_OUT),
            tree_marker: Style::default().fg(Color::Cyan),
            tree_open: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),

            detail_title: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            detail_heading: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default(),
            detail_section: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            detail_placeholder: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            detail_code_block: Style::default().fg(Color::Yellow).bg(Color::Black),
            detail_inline_code: Style::default().fg(Color::Yellow),
            detail_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            detail_strong: Style::default().add_modifier(Modifier::BOLD),
            detail_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            badge_pending: Style::default().fg(Color::Black).bg(Color::Yellow),
            badge_completed: Style::default().fg(Color::Black).bg(Color::Green),
            resource_kind: Style::default().fg(Color::Magenta),
            resource_summary: Style::default().fg(Color::Gray),
            list_selected: Style::default().bg(Color::DarkGray).fg(Color::White),
            answer: Style::default().fg(Color::Green),

            header: Style::default().add_modifier(Modifier::BOLD),
            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            status_busy: Style::default().bg(Color::DarkGray).fg(Color::Yellow),
            error: Style::default().fg(Color::Red),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
            input_border: Style::default().fg(Color::Yellow),
            notice_border: Style::default().fg(Color::Red),
        }
    }

    fn light() -> Self {
        Self {
            tree_normal: Style::default().fg(Color::Black),
            tree_selected: Style::default().bg(Color::Blue).fg(Color::White),
            tree_completed: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::CROSSED_OUT),
            tree_marker: Style::default().fg(Color::Blue),
            tree_open: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),

            detail_title: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            detail_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            detail_body: Style::default().fg(Color::Black),
            detail_section: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            detail_placeholder: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            detail_code_block: Style::default().fg(Color::DarkGray).bg(Color::White),
            detail_inline_code: Style::default().fg(Color::DarkGray),
            detail_emphasis: Style::default().add_modifier(Modifier::ITALIC),
            detail_strong: Style::default().add_modifier(Modifier::BOLD),
            detail_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            badge_pending: Style::default().fg(Color::White).bg(Color::Magenta),
            badge_completed: Style::default().fg(Color::White).bg(Color::Green),
            resource_kind: Style::default().fg(Color::Magenta),
            resource_summary: Style::default().fg(Color::DarkGray),
            list_selected: Style::default().bg(Color::Blue).fg(Color::White),
            answer: Style::default().fg(Color::Green),

            header: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            status_busy: Style::default().bg(Color::White).fg(Color::Magenta),
            error: Style::default().fg(Color::Red),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
            input_border: Style::default().fg(Color::Magenta),
            notice_border: Style::default().fg(Color::Red),
        }
    }

    fn roles(&self) -> [(&'static str, Style); 29] {
        [
            ("tree_normal", self.tree_normal),
            ("tree_selected", self.tree_selected),
            ("tree_completed", self.tree_completed),
            ("tree_marker", self.tree_marker),
            ("tree_open", self.tree_open),
            ("detail_title", self.detail_title),
            ("detail_heading", self.detail_heading),
            ("detail_body", self.detail_body),
            ("detail_section", self.detail_section),
            ("detail_placeholder", self.detail_placeholder),
            ("detail_code_block", self.detail_code_block),
            ("detail_inline_code", self.detail_inline_code),
            ("detail_emphasis", self.detail_emphasis),
            ("detail_strong", self.detail_strong),
            ("detail_link", self.detail_link),
            ("badge_pending", self.badge_pending),
            ("badge_completed", self.badge_completed),
            ("resource_kind", self.resource_kind),
            ("resource_summary", self.resource_summary),
            ("list_selected", self.list_selected),
            ("answer", self.answer),
            ("header", self.header),
            ("status_bar", self.status_bar),
            ("status_busy", self.status_busy),
            ("error", self.error),
            ("panel_border", self.panel_border),
            ("panel_border_focused", self.panel_border_focused),
            ("input_border", self.input_border),
            ("notice_border", self.notice_border),
        ]
    }
}

/// Role name to style lookup, rebuilt whenever the theme changes.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

impl StyleMap {
    pub fn from_palette(p: &ColorPalette) -> Self {
        Self {
            map: p.roles().into_iter().collect(),
        }
    }

    /// `Style::default()` for unknown roles.
    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}
