//! Detail pane for the selected topic.
//!
//! Top: title, status badge, Markdown description and the last assistant
//! answer. Bottom: resources, concepts and activities side by side.

use crate::app::{App, Focus};
use crate::api::Topic;
use crate::theme::StyleMap;
use crate::util::{format_relative_time, single_line, strip_control_chars, truncate_to_width};
use chrono::Utc;
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

const NO_DESCRIPTION: &str = "No description yet. Press e to elaborate.";

pub fn render(f: &mut Frame, app: &App, topic: &Topic, area: Rect) {
    if area.width < 3 || area.height < 3 {
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    render_description(f, app, topic, chunks[0]);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(34),
            Constraint::Percentage(33),
            Constraint::Percentage(33),
        ])
        .split(chunks[1]);

    render_resources(f, app, lists[0]);
    render_concepts(f, app, lists[1]);
    render_activities(f, app, lists[2]);
}

fn render_description(f: &mut Frame, app: &App, topic: &Topic, area: Rect) {
    let badge_style = if topic.is_completed() {
        app.style("badge_completed")
    } else {
        app.style("badge_pending")
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                strip_control_chars(&topic.title).into_owned(),
                app.style("detail_title"),
            ),
            Span::raw("  "),
            Span::styled(format!(" {} ", topic.status.badge()), badge_style),
        ]),
        Line::from(""),
    ];

    match topic.description_text() {
        Some(md) => lines.extend(render_markdown(&strip_control_chars(md), &app.theme)),
        None => lines.push(Line::from(Span::styled(
            NO_DESCRIPTION,
            app.style("detail_placeholder"),
        ))),
    }

    if let Some(answer) = &app.answer {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("Q: {}", single_line(&strip_control_chars(&answer.question))),
            app.style("detail_section"),
        )));
        lines.extend(
            strip_control_chars(&answer.text)
                .lines()
                .map(|l| Line::from(Span::styled(l.to_string(), app.style("answer")))),
        );
    }

    let paragraph = Paragraph::new(Text::from(lines))
        .block(panel_block(app, " Topic ", false))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    f.render_widget(paragraph, area);
}

fn render_resources(f: &mut Frame, app: &App, area: Rect) {
    let text_width = area.width.saturating_sub(4) as usize;
    let now = Utc::now();
    let items: Vec<ListItem> = if app.resources.is_empty() {
        vec![placeholder(app, "No resources. u: URL, p: PDF")]
    } else {
        app.resources
            .iter()
            .map(|r| {
                let tag = format!("[{}] ", r.kind.label());
                let age = r
                    .created_at
                    .as_deref()
                    .map(|ts| format_relative_time(ts, now))
                    .filter(|s| !s.is_empty())
                    .map(|s| format!(" {s}"))
                    .unwrap_or_default();
                let target = strip_control_chars(&r.path_or_url);
                let room = text_width.saturating_sub(tag.len() + age.len());
                let mut lines = vec![Line::from(vec![
                    Span::styled(tag, app.style("resource_kind")),
                    Span::raw(truncate_to_width(&target, room).into_owned()),
                    Span::styled(age, app.style("resource_summary")),
                ])];
                if let Some(summary) = r.content_summary.as_deref().filter(|s| !s.trim().is_empty()) {
                    let summary = single_line(&strip_control_chars(summary)).into_owned();
                    lines.push(Line::from(Span::styled(
                        truncate_to_width(&summary, text_width).into_owned(),
                        app.style("resource_summary"),
                    )));
                }
                ListItem::new(lines)
            })
            .collect()
    };

    let title = format!(" Resources ({}) ", app.resources.len());
    render_list(f, app, items, app.resource_cursor, Focus::Resources, title, area);
}

fn render_concepts(f: &mut Frame, app: &App, area: Rect) {
    let text_width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = if app.concepts.is_empty() {
        vec![placeholder(app, "No concepts. G to generate")]
    } else {
        app.concepts
            .iter()
            .map(|c| {
                let marker = if app.active_concept.as_deref() == Some(c.id.as_str()) {
                    "> "
                } else {
                    "  "
                };
                let title = single_line(&strip_control_chars(&c.title)).into_owned();
                ListItem::new(format!(
                    "{marker}{}",
                    truncate_to_width(&title, text_width.saturating_sub(2))
                ))
            })
            .collect()
    };

    let title = format!(" Concepts ({}) ", app.concepts.len());
    render_list(f, app, items, app.concept_cursor, Focus::Concepts, title, area);
}

fn render_activities(f: &mut Frame, app: &App, area: Rect) {
    let text_width = area.width.saturating_sub(4) as usize;
    let items: Vec<ListItem> = match app.active_concept() {
        None => vec![placeholder(app, "Select a concept")],
        Some(_) if app.activities.is_empty() => {
            vec![placeholder(app, "No activities. G to generate")]
        }
        Some(_) => app
            .activities
            .iter()
            .map(|a| {
                let check = if a.is_completed() { "[x]" } else { "[ ]" };
                let score = a.user_score.map(|s| format!(" {s}/5")).unwrap_or_default();
                let head = format!("{check} {}{score}", a.kind.label());
                let instructions = single_line(&strip_control_chars(&a.instructions)).into_owned();
                ListItem::new(vec![
                    Line::from(Span::styled(head, app.style("resource_kind"))),
                    Line::from(truncate_to_width(&instructions, text_width).into_owned()),
                ])
            })
            .collect(),
    };

    let title = match app.active_concept() {
        Some(c) => format!(
            " {} ",
            truncate_to_width(&single_line(&c.title), area.width.saturating_sub(4) as usize)
        ),
        None => " Activities ".to_string(),
    };
    render_list(f, app, items, app.activity_cursor, Focus::Activities, title, area);
}

fn render_list(
    f: &mut Frame,
    app: &App,
    items: Vec<ListItem>,
    cursor: usize,
    panel: Focus,
    title: String,
    area: Rect,
) {
    let focused = app.focus == panel;
    let list = List::new(items)
        .block(panel_block(app, title, focused))
        .highlight_style(if focused {
            app.style("list_selected")
        } else {
            Style::default()
        });

    let mut state = ListState::default().with_selected(Some(cursor));
    f.render_stateful_widget(list, area, &mut state);
}

fn placeholder<'a>(app: &App, text: &'a str) -> ListItem<'a> {
    ListItem::new(Span::styled(text, app.style("detail_placeholder")))
}

fn panel_block<'a>(app: &App, title: impl Into<Line<'a>>, focused: bool) -> Block<'a> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(if focused {
            app.style("panel_border_focused")
        } else {
            app.style("panel_border")
        })
        .title(title)
}

/// Converts Markdown to styled lines.
pub fn render_markdown(md: &str, theme: &StyleMap) -> Vec<Line<'static>> {
    let parser = Parser::new(md);
    let mut lines: Vec<Line<'static>> = Vec::with_capacity(md.lines().count());
    let mut current_spans: Vec<Span<'static>> = Vec::with_capacity(4);
    let mut in_code_block = false;
    let mut in_heading = false;
    let mut in_emphasis = false;
    let mut in_strong = false;
    let mut in_link = false;
    let mut list_depth: usize = 0;

    fn flush(lines: &mut Vec<Line<'static>>, spans: &mut Vec<Span<'static>>) {
        if !spans.is_empty() {
            lines.push(Line::from(std::mem::take(spans)));
        }
    }

    for event in parser {
        match event {
            Event::Start(Tag::Heading { .. }) => in_heading = true,
            Event::End(TagEnd::Heading(_)) => {
                flush(&mut lines, &mut current_spans);
                lines.push(Line::from(""));
                in_heading = false;
            }
            Event::End(TagEnd::Paragraph) => {
                flush(&mut lines, &mut current_spans);
                if list_depth == 0 {
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::CodeBlock(_)) => in_code_block = true,
            Event::End(TagEnd::CodeBlock) => {
                in_code_block = false;
                lines.push(Line::from(""));
            }
            Event::Start(Tag::List(_)) => {
                flush(&mut lines, &mut current_spans);
                list_depth += 1;
            }
            Event::End(TagEnd::List(_)) => {
                list_depth = list_depth.saturating_sub(1);
                if list_depth == 0 {
                    lines.push(Line::from(""));
                }
            }
            Event::Start(Tag::Item) => {
                flush(&mut lines, &mut current_spans);
                let indent = "  ".repeat(list_depth.saturating_sub(1));
                current_spans.push(Span::raw(format!("{indent}• ")));
            }
            Event::End(TagEnd::Item) => flush(&mut lines, &mut current_spans),
            Event::Start(Tag::Emphasis) => in_emphasis = true,
            Event::End(TagEnd::Emphasis) => in_emphasis = false,
            Event::Start(Tag::Strong) => in_strong = true,
            Event::End(TagEnd::Strong) => in_strong = false,
            Event::Start(Tag::Link { .. }) => in_link = true,
            Event::End(TagEnd::Link) => in_link = false,
            Event::Text(text) => {
                if in_code_block {
                    // code blocks keep their line structure
                    for code_line in text.lines() {
                        lines.push(Line::from(Span::styled(
                            code_line.to_string(),
                            theme.resolve("detail_code_block"),
                        )));
                    }
                    continue;
                }
                let style = if in_heading {
                    theme.resolve("detail_heading")
                } else if in_link {
                    theme.resolve("detail_link")
                } else if in_strong {
                    theme.resolve("detail_strong")
                } else if in_emphasis {
                    theme.resolve("detail_emphasis")
                } else {
                    theme.resolve("detail_body")
                };
                current_spans.push(Span::styled(text.into_string(), style));
            }
            Event::Code(code) => {
                current_spans.push(Span::styled(
                    format!("`{code}`"),
                    theme.resolve("detail_inline_code"),
                ));
            }
            Event::SoftBreak => current_spans.push(Span::raw(" ")),
            Event::HardBreak => flush(&mut lines, &mut current_spans),
            _ => {}
        }
    }

    flush(&mut lines, &mut current_spans);

    while lines.last().is_some_and(|l| l.width() == 0) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::ThemeVariant;

    fn theme() -> StyleMap {
        StyleMap::from_palette(&ThemeVariant::Dark.palette())
    }

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_empty_input() {
        assert!(render_markdown("", &theme()).is_empty());
    }

    #[test]
    fn test_heading_is_styled() {
        let t = theme();
        let lines = render_markdown("# Sets\n\nA set is a collection.", &t);
        assert_eq!(plain(&lines), vec!["Sets", "", "A set is a collection."]);
        assert_eq!(lines[0].spans[0].style, t.resolve("detail_heading"));
    }

    #[test]
    fn test_list_items_get_bullets() {
        let lines = render_markdown("- unions\n- intersections\n  - nested", &theme());
        assert_eq!(
            plain(&lines),
            vec!["• unions", "• intersections", "  • nested"]
        );
    }

    #[test]
    fn test_code_block_keeps_lines() {
        let t = theme();
        let lines = render_markdown("```\nfn main() {}\nlet x = 1;\n```", &t);
        assert_eq!(plain(&lines), vec!["fn main() {}", "let x = 1;"]);
        assert_eq!(lines[1].spans[0].style, t.resolve("detail_code_block"));
    }

    #[test]
    fn test_inline_styles() {
        let t = theme();
        let lines = render_markdown("Use **bold**, *italic* and `code`.", &t);
        let spans = &lines[0].spans;
        assert!(spans
            .iter()
            .any(|s| s.content == "bold" && s.style == t.resolve("detail_strong")));
        assert!(spans.iter().any(|s| s.content == "`code`"));
    }
}
