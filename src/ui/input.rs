//! Keyboard input handling.
//!
//! Overlays (help, notice, text input) capture every key while visible.
//! Otherwise the key is looked up in the keybinding registry under the
//! focused panel's context.

use crate::app::{App, AppEvent, Focus, InputPurpose, InputState, Operation};
use crate::keybindings::Action as KbAction;
use crate::util::{
    validate_pdf_path, validate_resource_url, validate_url_for_open, MAX_INPUT_LENGTH,
};
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::{
    load_topic_panes, spawn_activities_load, spawn_models_load, spawn_topics_load, start_add_url,
    start_ask, start_complete_activity, start_elaborate, start_generate,
    start_generate_activities, start_generate_concepts, start_pdf_upload, start_status_toggle,
};
use super::Action;

/// Lines moved per detail scroll step.
const DETAIL_SCROLL_STEP: u16 = 5;

/// Main input dispatch function.
pub fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    if app.show_help {
        return handle_help_input(app, code);
    }

    if app.notice.is_some() {
        if matches!(code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char('q')) {
            app.notice = None;
        }
        return Action::Continue;
    }

    if let Some(state) = app.input.take() {
        handle_text_input(app, state, code, modifiers, event_tx);
        return Action::Continue;
    }

    handle_browse_input(app, code, modifiers, event_tx)
}

/// Captures all keys: j/k/Up/Down scroll, Esc/q/? dismiss.
fn handle_help_input(app: &mut App, code: KeyCode) -> Action {
    match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        _ => {}
    }
    Action::Continue
}

/// Edits the open text overlay. `state` was taken out of `app.input`; it is
/// put back unless the overlay closes.
fn handle_text_input(
    app: &mut App,
    mut state: InputState,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) {
    match code {
        KeyCode::Esc => {
            if state.purpose == InputPurpose::Prompt {
                app.prompt_draft = state.buffer;
            }
            return;
        }
        KeyCode::Enter => {
            submit_input(app, state, event_tx);
            return;
        }
        KeyCode::Backspace => {
            state.buffer.pop();
        }
        KeyCode::Char('u') if modifiers.contains(KeyModifiers::CONTROL) => {
            state.buffer.clear();
        }
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
            if state.buffer.chars().count() < MAX_INPUT_LENGTH {
                state.buffer.push(c);
            } else {
                app.set_status(format!("Input limited to {MAX_INPUT_LENGTH} characters"));
            }
        }
        _ => {}
    }
    app.input = Some(state);
}

fn submit_input(app: &mut App, state: InputState, event_tx: &mpsc::Sender<AppEvent>) {
    let text = state.buffer.trim().to_string();
    if text.is_empty() && !state.purpose.allows_empty() {
        app.set_status("Type something first, or Esc to cancel");
        app.input = Some(state);
        return;
    }

    match state.purpose {
        InputPurpose::Prompt => {
            app.prompt_draft = text.clone();
            start_generate(app, text, event_tx);
        }
        InputPurpose::Elaborate { topic_id } => start_elaborate(app, topic_id, text, event_tx),
        InputPurpose::Ask { topic_id } => start_ask(app, topic_id, text, event_tx),
        InputPurpose::ResourceUrl { ref topic_id } => match validate_resource_url(&text) {
            Ok(url) => start_add_url(app, topic_id.clone(), url, event_tx),
            Err(e) => {
                app.set_status(e.to_string());
                app.input = Some(state);
            }
        },
        InputPurpose::PdfPath { ref topic_id } => match validate_pdf_path(&text) {
            Ok(path) => start_pdf_upload(app, topic_id.clone(), path, event_tx),
            Err(e) => {
                app.set_status(e.to_string());
                app.input = Some(state);
            }
        },
    }
}

fn handle_browse_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Action {
    let Some(action) = app
        .keybindings
        .action_for_key(code, modifiers, app.focus.context())
    else {
        return Action::Continue;
    };

    match action {
        KbAction::Quit => return Action::Quit,
        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::CycleFocus => app.cycle_focus(),
        KbAction::Back => {
            if app.focus != Focus::Tree {
                app.focus = Focus::Tree;
            } else if app.selection.is_open() {
                app.close_detail();
            }
        }
        KbAction::Select => handle_select(app, event_tx),
        KbAction::ToggleExpand => app.toggle_cursor_expansion(),
        KbAction::ExpandNode => app.expand_cursor(),
        KbAction::CollapseNode => app.collapse_cursor(),
        KbAction::CollapseAll => app.collapse_all(),
        KbAction::ToggleShowCompleted => {
            if app.toggle_show_completed() {
                app.set_status("Showing completed topics");
            } else {
                app.set_status("Hiding completed topics");
            }
        }
        KbAction::Generate => {
            if app.is_busy(Operation::Generate) {
                app.set_status("Generating syllabus already in progress");
            } else {
                app.open_input(InputPurpose::Prompt);
            }
        }
        KbAction::CycleModel => match app.cycle_model().map(str::to_string) {
            Some(name) => app.set_status(format!("Model: {name}")),
            None => app.set_status("No models available"),
        },
        KbAction::Refresh => {
            app.set_status("Refreshing...");
            spawn_topics_load(app, event_tx);
            if app.models.is_empty() {
                spawn_models_load(app, event_tx);
            }
        }
        KbAction::ToggleStatus => {
            if require_open_topic(app).is_some() {
                start_status_toggle(app, event_tx);
            }
        }
        KbAction::Elaborate => {
            if let Some(topic_id) = require_open_topic(app) {
                app.open_input(InputPurpose::Elaborate { topic_id });
            }
        }
        KbAction::Ask => {
            if let Some(topic_id) = require_open_topic(app) {
                app.open_input(InputPurpose::Ask { topic_id });
            }
        }
        KbAction::AddUrl => {
            if let Some(topic_id) = require_open_topic(app) {
                app.open_input(InputPurpose::ResourceUrl { topic_id });
            }
        }
        KbAction::UploadPdf => {
            if let Some(topic_id) = require_open_topic(app) {
                app.open_input(InputPurpose::PdfPath { topic_id });
            }
        }
        KbAction::OpenResource => open_selected_resource(app),
        KbAction::GenerateConcepts => {
            if require_open_topic(app).is_some() {
                start_generate_concepts(app, event_tx);
            }
        }
        KbAction::GenerateActivities => start_generate_activities(app, event_tx),
        KbAction::CompleteActivity(score) => start_complete_activity(app, score, event_tx),
        KbAction::ScrollDetailDown => app.scroll_detail(true, DETAIL_SCROLL_STEP),
        KbAction::ScrollDetailUp => app.scroll_detail(false, DETAIL_SCROLL_STEP),
        KbAction::CycleTheme => {
            let name = app.cycle_theme();
            app.set_status(format!("Theme: {name}"));
        }
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
        }
    }

    Action::Continue
}

/// Enter, interpreted by the focused panel.
fn handle_select(app: &mut App, event_tx: &mpsc::Sender<AppEvent>) {
    match app.focus {
        Focus::Tree => {
            if let Some(id_changed) = app.activate_cursor_row() {
                load_topic_panes(app, id_changed, event_tx);
            }
        }
        Focus::Concepts => {
            if let Some(concept_id) = app.activate_cursor_concept() {
                app.focus = Focus::Activities;
                spawn_activities_load(app, concept_id, event_tx);
            }
        }
        Focus::Resources => open_selected_resource(app),
        Focus::Activities => app.set_status("Press 1-5 to complete with a score"),
    }
}

fn require_open_topic(app: &mut App) -> Option<String> {
    let id = app.selection.id().map(str::to_string);
    if id.is_none() {
        app.set_status("Open a topic first (Enter)");
    }
    id
}

fn open_selected_resource(app: &mut App) {
    if app.selected_resource().is_none() {
        return;
    }
    let Some(target) = app.selected_resource_url() else {
        app.set_status("Only URL resources can be opened");
        return;
    };
    // server data is untrusted; never hand a non-web URL to the OS opener
    match validate_url_for_open(target) {
        Err(e) => app.set_status(e.to_string()),
        Ok(url) => match open::that(url.as_str()) {
            Ok(()) => app.set_status("Opening in browser..."),
            Err(e) => app.set_status(format!("Failed to open browser: {e}")),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiClient, Resource, ResourceKind, Topic, TopicStatus};
    use crate::config::Config;
    use std::time::Duration;

    fn test_app() -> App {
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(50)).unwrap();
        let mut app = App::new(api, &Config::default());
        app.apply_topics(vec![
            Topic {
                id: "r".into(),
                title: "Root".into(),
                description: None,
                parent_id: None,
                order_index: 0,
                status: TopicStatus::Pending,
            },
            Topic {
                id: "c".into(),
                title: "Child".into(),
                description: None,
                parent_id: Some("r".into()),
                order_index: 0,
                status: TopicStatus::Pending,
            },
        ]);
        app
    }

    fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx)
    }

    fn type_text(app: &mut App, text: &str, tx: &mpsc::Sender<AppEvent>) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), tx);
        }
    }

    #[tokio::test]
    async fn test_quit() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Quit));
    }

    #[tokio::test]
    async fn test_enter_toggles_and_opens() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        press(&mut app, KeyCode::Enter, &tx);
        assert_eq!(app.selection.id(), Some("r"));
        assert!(!app.expansion.is_expanded("r"));

        press(&mut app, KeyCode::Esc, &tx);
        assert!(!app.selection.is_open());
    }

    #[tokio::test]
    async fn test_topic_actions_need_open_topic() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        press(&mut app, KeyCode::Char('a'), &tx);
        assert!(app.input.is_none());
        assert!(app.status_message.is_some());
    }

    #[tokio::test]
    async fn test_empty_prompt_is_ignored() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        press(&mut app, KeyCode::Char('g'), &tx);
        type_text(&mut app, "   ", &tx);
        press(&mut app, KeyCode::Enter, &tx);
        assert!(app.input.is_some());
        assert!(!app.is_busy(Operation::Generate));
    }

    #[tokio::test]
    async fn test_prompt_draft_survives_cancel() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        press(&mut app, KeyCode::Char('g'), &tx);
        type_text(&mut app, "Category theory", &tx);
        press(&mut app, KeyCode::Esc, &tx);
        assert!(app.input.is_none());
        assert_eq!(app.prompt_draft, "Category theory");

        press(&mut app, KeyCode::Char('g'), &tx);
        press(&mut app, KeyCode::Backspace, &tx);
        assert_eq!(
            app.input.as_ref().map(|i| i.buffer.as_str()),
            Some("Category theor")
        );
    }

    #[tokio::test]
    async fn test_invalid_url_keeps_overlay_open() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        app.select_topic("r");
        press(&mut app, KeyCode::Char('u'), &tx);
        type_text(&mut app, "ftp://example.com/file", &tx);
        press(&mut app, KeyCode::Enter, &tx);

        assert!(app.input.is_some());
        assert!(!app.is_busy(Operation::Upload));
    }

    #[tokio::test]
    async fn test_ask_marks_assistant_busy() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        app.select_topic("r");
        press(&mut app, KeyCode::Char('a'), &tx);
        type_text(&mut app, "Why?", &tx);
        press(&mut app, KeyCode::Enter, &tx);

        assert!(app.input.is_none());
        assert!(app.is_busy(Operation::Assistant));

        // elaborate shares the assistant slot
        press(&mut app, KeyCode::Char('e'), &tx);
        press(&mut app, KeyCode::Enter, &tx);
        assert!(app.is_busy(Operation::Assistant));
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert!(msg.contains("already in progress"));
    }

    #[tokio::test]
    async fn test_notice_captures_keys() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        app.show_notice("Failed", "nope");
        assert!(matches!(press(&mut app, KeyCode::Char('q'), &tx), Action::Continue));
        assert!(app.notice.is_none());
    }

    #[tokio::test]
    async fn test_help_overlay_scrolls_and_closes() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        press(&mut app, KeyCode::Char('?'), &tx);
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('j'), &tx);
        assert_eq!(app.help_scroll_offset, 1);
        press(&mut app, KeyCode::Esc, &tx);
        assert!(!app.show_help);
        assert_eq!(app.help_scroll_offset, 0);
    }

    #[tokio::test]
    async fn test_collapse_all_keeps_detail_open() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        app.select_topic("c");
        handle_input(&mut app, KeyCode::Char('C'), KeyModifiers::SHIFT, &tx);
        assert!(app.expansion.is_empty());
        assert_eq!(app.selection.id(), Some("c"));
    }

    fn resource(id: &str, kind: ResourceKind, target: &str) -> Resource {
        Resource {
            id: id.into(),
            topic_id: "r".into(),
            kind,
            path_or_url: target.into(),
            content_summary: None,
            created_at: None,
        }
    }

    #[tokio::test]
    async fn test_open_resource_refuses_pdf_and_non_web_urls() {
        let mut app = test_app();
        let (tx, _rx) = mpsc::channel(16);
        app.select_topic("r");
        app.apply_resources(
            "r",
            vec![
                resource("p", ResourceKind::Pdf, "uploads/notes.pdf"),
                resource("f", ResourceKind::Url, "file:///etc/passwd"),
            ],
        );
        app.focus = Focus::Resources;

        press(&mut app, KeyCode::Char('o'), &tx);
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert_eq!(msg, "Only URL resources can be opened");

        press(&mut app, KeyCode::Char('j'), &tx);
        assert_eq!(app.resource_cursor, 1);
        press(&mut app, KeyCode::Char('o'), &tx);
        let (msg, _) = app.status_message.as_ref().unwrap();
        assert!(msg.contains("Unsupported scheme: file"), "status: {msg}");
    }
}
