//! Render functions for the TUI.

use crate::app::{App, InputState, Notice};
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use super::{detail, help, status, tree};

/// Minimum terminal dimensions required for normal operation.
pub(super) const MIN_WIDTH: u16 = 60;
pub(super) const MIN_HEIGHT: u16 = 12;

/// Main render dispatch function.
pub(super) fn render(f: &mut Frame, app: &App) {
    let area = f.area();
    if area.width < 1 || area.height < 1 {
        return;
    }

    if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
        let msg = if area.height < 3 || area.width < 20 {
            Paragraph::new("Too small")
        } else {
            Paragraph::new(format!(
                "Terminal too small\n\nMinimum: {MIN_WIDTH}x{MIN_HEIGHT}\nCurrent: {}x{}",
                area.width, area.height
            ))
            .alignment(Alignment::Center)
        };
        f.render_widget(msg, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_main(f, app, chunks[1]);
    status::render(f, app, chunks[2]);

    if let Some(input) = &app.input {
        render_input_overlay(f, app, input);
    }
    if let Some(notice) = &app.notice {
        render_notice_overlay(f, app, notice);
    }
    if app.show_help {
        help::render(f, app);
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let filter = if app.show_completed {
        "all topics"
    } else {
        "pending only"
    };
    let right = format!("{} | {} ", app.selected_model_label(), filter);
    let left_width = (area.width as usize).saturating_sub(right.chars().count() + 1);
    let left = truncate_to_width(" autodidact", left_width);
    let pad = (area.width as usize).saturating_sub(left.chars().count() + right.chars().count());

    let line = Line::from(vec![
        Span::styled(left.into_owned(), app.style("header")),
        Span::raw(" ".repeat(pad)),
        Span::styled(right, app.style("header")),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

/// Tree on the left; the detail pane on the right while a topic is open.
fn render_main(f: &mut Frame, app: &App, area: Rect) {
    let Some(topic) = app.selection.topic() else {
        tree::render(f, app, area);
        return;
    };

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    tree::render(f, app, main_chunks[0]);
    detail::render(f, app, topic, main_chunks[1]);
}

fn render_input_overlay(f: &mut Frame, app: &App, input: &InputState) {
    let area = f.area();
    let width = 70u16.min(area.width.saturating_sub(4));
    let height = 5u16.min(area.height.saturating_sub(4));
    let overlay = centered_fixed(width, height, area);
    if overlay.width < 10 || overlay.height < 3 {
        return;
    }

    f.render_widget(Clear, overlay);

    // keep the tail visible while typing past the box width
    let inner = overlay.width.saturating_sub(4) as usize;
    let chars: Vec<char> = input.buffer.chars().collect();
    let start = chars.len().saturating_sub(inner);
    let visible: String = chars[start..].iter().collect();

    let paragraph = Paragraph::new(vec![
        Line::from(format!("> {visible}_")),
        Line::from(""),
        Line::from(Span::styled(
            "(Enter) Submit  (Esc) Cancel",
            app.style("detail_placeholder"),
        )),
    ])
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style("input_border"))
            .title(input.purpose.title()),
    );
    f.render_widget(paragraph, overlay);
}

fn render_notice_overlay(f: &mut Frame, app: &App, notice: &Notice) {
    let area = f.area();
    let width = 60u16.min(area.width.saturating_sub(4));
    let height = 9u16.min(area.height.saturating_sub(4));
    let overlay = centered_fixed(width, height, area);
    if overlay.width < 10 || overlay.height < 5 {
        return;
    }

    f.render_widget(Clear, overlay);

    let paragraph = Paragraph::new(vec![
        Line::from(Span::styled(
            strip_control_chars(&notice.message).into_owned(),
            app.style("error"),
        )),
        Line::from(""),
        Line::from("(Enter/Esc) Dismiss"),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(app.style("notice_border"))
            .title(format!(" {} ", notice.title)),
    );
    f.render_widget(paragraph, overlay);
}

fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

/// Create a centered rectangle with the given percentage of the parent area.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    centered_fixed(
        area.width * percent_x / 100,
        area.height * percent_y / 100,
        area,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, Topic, TopicStatus};
    use crate::config::Config;
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn test_app() -> App {
        let api = ApiClient::new("http://localhost:8000", Duration::from_secs(1)).unwrap();
        App::new(api, &Config::default())
    }

    fn draw(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| render(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content
            .chunks(width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn topic(id: &str, title: &str, parent: Option<&str>) -> Topic {
        Topic {
            id: id.into(),
            title: title.into(),
            description: None,
            parent_id: parent.map(str::to_string),
            order_index: 0,
            status: TopicStatus::Pending,
        }
    }

    #[test]
    fn test_empty_store_message() {
        let mut app = test_app();
        app.apply_topics(Vec::new());
        assert!(draw(&app, 80, 20).contains("No topics yet."));
    }

    #[test]
    fn test_tree_and_placeholder_description() {
        let mut app = test_app();
        app.apply_topics(vec![
            topic("a", "Algebra", None),
            topic("b", "Groups", Some("a")),
        ]);
        app.select_topic("b");
        let screen = draw(&app, 100, 24);
        assert!(screen.contains("Algebra"));
        assert!(screen.contains("Groups"));
        assert!(screen.contains("No description yet. Press e to elaborate."));
        assert!(screen.contains("PENDING"));
    }

    #[test]
    fn test_tiny_terminal() {
        let app = test_app();
        assert!(draw(&app, 30, 5).contains("Terminal too small"));
        assert!(draw(&app, 10, 2).contains("Too small"));
    }

    #[test]
    fn test_notice_overlay() {
        let mut app = test_app();
        app.apply_topics(Vec::new());
        app.show_notice("Could not add resource", "HTTP 400");
        let screen = draw(&app, 80, 20);
        assert!(screen.contains("Could not add resource"));
        assert!(screen.contains("HTTP 400"));
    }
}
