use crate::api::TopicStatus;
use crate::app::{App, Focus};
use crate::util::{strip_control_chars, truncate_to_width};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

/// Render the topic tree panel
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let focused = app.focus == Focus::Tree;
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            app.style("panel_border_focused")
        } else {
            app.style("panel_border")
        })
        .title(format!(" Topics ({}) ", app.store.len()));

    let rows = app.tree_rows();
    if rows.is_empty() {
        let text = if !app.topics_loaded {
            "Loading topics..."
        } else if app.store.is_empty() {
            "No topics yet. Press g to generate a syllabus."
        } else {
            "All topics are completed. Press H to show them."
        };
        let paragraph = Paragraph::new(Span::styled(text, app.style("detail_placeholder")))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let inner_width = area.width.saturating_sub(2) as usize;
    let open_id = app.selection.id();

    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            let indent = "  ".repeat(row.depth);
            let marker = match (row.has_children, row.is_expanded) {
                (true, true) => "▾ ",
                (true, false) => "▸ ",
                (false, _) => "  ",
            };
            let check = match row.status {
                TopicStatus::Completed => "✓ ",
                TopicStatus::Pending => "",
            };

            let used = indent.len() + 2 + check.chars().count();
            let title = strip_control_chars(&row.title);
            let title = truncate_to_width(&title, inner_width.saturating_sub(used)).into_owned();

            let title_style = if open_id == Some(row.id.as_str()) {
                app.style("tree_open")
            } else if row.status == TopicStatus::Completed {
                app.style("tree_completed")
            } else {
                app.style("tree_normal")
            };

            ListItem::new(Line::from(vec![
                Span::raw(indent),
                Span::styled(marker, app.style("tree_marker")),
                Span::styled(check, app.style("tree_marker")),
                Span::styled(title, title_style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(if focused {
            app.style("tree_selected")
        } else {
            app.style("tree_normal")
        });

    let mut state = ListState::default().with_selected(Some(app.tree_cursor));
    f.render_stateful_widget(list, area, &mut state);
}
