use crate::app::{App, Focus};
use ratatui::{layout::Rect, widgets::Paragraph, Frame};
use std::borrow::Cow;

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Render the status bar
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 1 || area.height < 1 {
        return;
    }

    let text: Cow<'_, str> = if let Some((msg, _)) = &app.status_message {
        Cow::Borrowed(msg.as_ref())
    } else if let Some(label) = app.busy_label() {
        let frame = SPINNER[app.spinner_frame % SPINNER.len()];
        Cow::Owned(format!("{frame} {label}..."))
    } else if app.input.is_some() {
        Cow::Borrowed("[Enter] submit [Esc] cancel [Ctrl+u] clear")
    } else {
        Cow::Borrowed(match (app.selection.is_open(), app.focus) {
            (false, _) => "[Enter] open [Space] expand [g]enerate [H] completed [C]ollapse [m]odel [?]help [q]uit",
            (true, Focus::Tree) => "[x] done [e]laborate [a]sk [u]rl [p]df [Tab] panels [Esc] close [?]help",
            (true, Focus::Resources) => "[o]pen [u]rl [p]df [Tab] next [Esc] tree",
            (true, Focus::Concepts) => "[Enter] activities [G]enerate [Tab] next [Esc] tree",
            (true, Focus::Activities) => "[1-5] complete with score [G]enerate [Tab] next [Esc] tree",
        })
    };

    let style = if app.busy_label().is_some() && app.status_message.is_none() {
        app.style("status_busy")
    } else {
        app.style("status_bar")
    };

    f.render_widget(Paragraph::new(text).style(style), area);
}
