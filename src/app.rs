use crate::api::{
    Activity, ApiClient, ApiError, Concept, LlmModel, Resource, ResourceKind, Topic,
};
use crate::config::Config;
use crate::keybindings::{Context as KbContext, KeybindingRegistry};
use crate::syllabus::{
    visible_rows, ExpansionSet, Resolution, Selection, TopicForest, TopicStore, VisibleRow,
};
use crate::theme::{StyleMap, ThemeVariant};
use ratatui::style::Style;
use std::borrow::Cow;
use std::collections::HashSet;
use tokio::time::{Duration, Instant};

/// How long a status bar message stays up.
pub const STATUS_TTL: Duration = Duration::from_secs(3);

/// Model picked by default when the backend offers it and config names none.
pub const PREFERRED_MODEL_FRAGMENT: &str = "gemini-1.5-flash";

// ============================================================================
// Focus, operations, overlays
// ============================================================================

/// Which panel receives navigation keys. The side panels exist only while
/// the detail pane is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Tree,
    Resources,
    Concepts,
    Activities,
}

impl Focus {
    pub fn context(self) -> KbContext {
        match self {
            Self::Tree => KbContext::Tree,
            Self::Resources => KbContext::Resources,
            Self::Concepts => KbContext::Concepts,
            Self::Activities => KbContext::Activities,
        }
    }

    fn next(self, detail_open: bool) -> Self {
        if !detail_open {
            return Self::Tree;
        }
        match self {
            Self::Tree => Self::Resources,
            Self::Resources => Self::Concepts,
            Self::Concepts => Self::Activities,
            Self::Activities => Self::Tree,
        }
    }
}

/// A backend write that disables its trigger while outstanding.
///
/// Elaborate and ask share `Assistant`; URL and PDF uploads share `Upload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Generate,
    StatusUpdate,
    Assistant,
    Upload,
    GenerateConcepts,
    GenerateActivities,
    CompleteActivity,
}

impl Operation {
    pub const ALL: [Operation; 7] = [
        Self::Generate,
        Self::StatusUpdate,
        Self::Assistant,
        Self::Upload,
        Self::GenerateConcepts,
        Self::GenerateActivities,
        Self::CompleteActivity,
    ];

    /// Name reported by `AppEvent::TaskPanicked`.
    pub fn task_name(self) -> &'static str {
        match self {
            Self::Generate => "generate",
            Self::StatusUpdate => "status_update",
            Self::Assistant => "assistant",
            Self::Upload => "upload",
            Self::GenerateConcepts => "generate_concepts",
            Self::GenerateActivities => "generate_activities",
            Self::CompleteActivity => "complete_activity",
        }
    }

    pub fn busy_label(self) -> &'static str {
        match self {
            Self::Generate => "Generating syllabus",
            Self::StatusUpdate => "Updating status",
            Self::Assistant => "Thinking",
            Self::Upload => "Adding resource",
            Self::GenerateConcepts => "Generating concepts",
            Self::GenerateActivities => "Generating activities",
            Self::CompleteActivity => "Saving score",
        }
    }
}

/// What the text overlay is collecting. Topic-bound inputs remember the topic
/// they were opened for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputPurpose {
    Prompt,
    Elaborate { topic_id: String },
    Ask { topic_id: String },
    ResourceUrl { topic_id: String },
    PdfPath { topic_id: String },
}

impl InputPurpose {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Prompt => " What do you want to learn? ",
            Self::Elaborate { .. } => " Elaborate (optional instruction) ",
            Self::Ask { .. } => " Ask a question about this topic ",
            Self::ResourceUrl { .. } => " Add URL resource ",
            Self::PdfPath { .. } => " Upload PDF (local path) ",
        }
    }

    /// Elaborate may be sent with no instruction; everything else needs text.
    pub fn allows_empty(&self) -> bool {
        matches!(self, Self::Elaborate { .. })
    }
}

#[derive(Debug, Clone)]
pub struct InputState {
    pub purpose: InputPurpose,
    pub buffer: String,
}

/// Blocking message shown for failed writes; dismissed with Enter or Esc.
#[derive(Debug, Clone)]
pub struct Notice {
    pub title: Cow<'static, str>,
    pub message: String,
}

/// The assistant's last answer for the selected topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub question: String,
    pub text: String,
}

// ============================================================================
// Events
// ============================================================================

/// Results reported by background tasks to the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    TopicsLoaded(Result<Vec<Topic>, ApiError>),
    ModelsLoaded(Result<Vec<LlmModel>, ApiError>),
    SyllabusGenerated(Result<Topic, ApiError>),
    StatusUpdated {
        topic_id: String,
        result: Result<Topic, ApiError>,
    },
    TopicElaborated {
        topic_id: String,
        result: Result<Topic, ApiError>,
    },
    QuestionAnswered {
        topic_id: String,
        question: String,
        result: Result<String, ApiError>,
    },
    ResourcesLoaded {
        topic_id: String,
        result: Result<Vec<Resource>, ApiError>,
    },
    ResourceAdded {
        topic_id: String,
        result: Result<Resource, ApiError>,
    },
    ConceptsLoaded {
        topic_id: String,
        result: Result<Vec<Concept>, ApiError>,
    },
    ConceptsGenerated {
        topic_id: String,
        result: Result<Vec<Concept>, ApiError>,
    },
    ActivitiesLoaded {
        concept_id: String,
        result: Result<Vec<Activity>, ApiError>,
    },
    ActivitiesGenerated {
        concept_id: String,
        result: Result<Vec<Activity>, ApiError>,
    },
    ActivityCompleted {
        concept_id: String,
        result: Result<Activity, ApiError>,
    },
    /// A background task panicked. `task` is an `Operation::task_name` or a
    /// read task name such as "load_topics".
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state. Mutated only by the UI loop.
pub struct App {
    pub api: ApiClient,

    pub theme_variant: ThemeVariant,
    pub theme: StyleMap,
    pub keybindings: KeybindingRegistry,

    // Topic hierarchy view state
    pub store: TopicStore,
    pub expansion: ExpansionSet,
    pub selection: Selection,
    pub show_completed: bool,
    /// Set once the first topic list arrives; separates "loading" from empty.
    pub topics_loaded: bool,
    /// Flattened tree, recomputed whenever the store, expansion set or filter
    /// changes.
    rows: Vec<VisibleRow>,
    pub tree_cursor: usize,

    // Models
    pub models: Vec<LlmModel>,
    pub selected_model: Option<usize>,
    pub preferred_model: Option<String>,

    // Detail pane, bound to the selected topic
    pub resources: Vec<Resource>,
    pub resource_cursor: usize,
    pub answer: Option<Answer>,
    pub detail_scroll: u16,
    pub concepts: Vec<Concept>,
    pub concept_cursor: usize,
    /// Concept whose activities are shown.
    pub active_concept: Option<String>,
    pub activities: Vec<Activity>,
    pub activity_cursor: usize,

    pub focus: Focus,
    pub input: Option<InputState>,
    /// Last syllabus prompt; kept after a failed generate so it can be retried.
    pub prompt_draft: String,
    pub notice: Option<Notice>,
    in_flight: HashSet<Operation>,

    pub status_message: Option<(Cow<'static, str>, Instant)>,
    pub needs_redraw: bool,
    pub show_help: bool,
    pub help_scroll_offset: usize,
    pub spinner_frame: usize,
}

impl App {
    pub fn new(api: ApiClient, config: &Config) -> Self {
        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme in config, using dark");
            ThemeVariant::Dark
        });

        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&config.keybindings) {
            tracing::warn!(%warning, "Keybinding override skipped");
        }

        Self {
            api,
            theme_variant,
            theme: StyleMap::from_palette(&theme_variant.palette()),
            keybindings,
            store: TopicStore::new(),
            expansion: ExpansionSet::new(),
            selection: Selection::new(),
            show_completed: config.show_completed,
            topics_loaded: false,
            rows: Vec::new(),
            tree_cursor: 0,
            models: Vec::new(),
            selected_model: None,
            preferred_model: config.default_model.clone(),
            resources: Vec::new(),
            resource_cursor: 0,
            answer: None,
            detail_scroll: 0,
            concepts: Vec::new(),
            concept_cursor: 0,
            active_concept: None,
            activities: Vec::new(),
            activity_cursor: 0,
            focus: Focus::Tree,
            input: None,
            prompt_draft: String::new(),
            notice: None,
            in_flight: HashSet::new(),
            status_message: None,
            needs_redraw: true,
            show_help: false,
            help_scroll_offset: 0,
            spinner_frame: 0,
        }
    }

    // ------------------------------------------------------------------
    // Theme
    // ------------------------------------------------------------------

    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }

    pub fn set_theme(&mut self, variant: ThemeVariant) {
        self.theme_variant = variant;
        self.theme = StyleMap::from_palette(&variant.palette());
        self.needs_redraw = true;
    }

    /// Returns the new theme's name for the status bar.
    pub fn cycle_theme(&mut self) -> &'static str {
        let next = self.theme_variant.next();
        self.set_theme(next);
        next.name()
    }

    // ------------------------------------------------------------------
    // Topic refresh
    // ------------------------------------------------------------------

    /// Installs a freshly fetched topic list.
    ///
    /// Order matters: the store is replaced first, then the roots are
    /// auto-expanded if the expansion set is empty, then the selection is
    /// re-resolved against the new records. A lost selection closes the
    /// detail pane and drops everything bound to it.
    pub fn apply_topics(&mut self, topics: Vec<Topic>) -> Resolution {
        self.store.replace(topics);
        self.topics_loaded = true;

        let forest = TopicForest::build(self.store.topics());
        if self.expansion.auto_expand_roots_once(forest.root_ids()) {
            tracing::debug!(roots = self.expansion.len(), "Auto-expanded root topics");
        }

        let resolution = self.selection.resolve_after_refresh(self.store.topics());
        if resolution == Resolution::Lost {
            self.clear_topic_panes();
            self.focus = Focus::Tree;
            self.input = self.input.take().filter(|i| i.purpose == InputPurpose::Prompt);
        }

        self.rebuild_rows();
        tracing::debug!(
            topics = self.store.len(),
            rows = self.rows.len(),
            ?resolution,
            "Applied topic snapshot"
        );
        resolution
    }

    fn rebuild_rows(&mut self) {
        let cursor_id = self.rows.get(self.tree_cursor).map(|r| r.id.clone());

        let forest = TopicForest::build(self.store.topics());
        self.rows = visible_rows(&forest, &self.expansion, self.show_completed);

        if let Some(idx) = cursor_id.and_then(|id| self.nearest_rendered_row(id)) {
            self.tree_cursor = idx;
        }
        self.clamp_selections();
        self.needs_redraw = true;
    }

    /// Row index of `id`, or of its closest ancestor that is still rendered
    /// when `id` itself was filtered out or collapsed away.
    fn nearest_rendered_row(&self, id: String) -> Option<usize> {
        let mut seen = HashSet::new();
        let mut current = Some(id);
        while let Some(id) = current {
            if let Some(idx) = self.rows.iter().position(|r| r.id == id) {
                return Some(idx);
            }
            if !seen.insert(id.clone()) {
                break;
            }
            current = self.store.get(&id).and_then(|t| t.parent_id.clone());
        }
        None
    }

    /// Rows of the topic tree in display order.
    pub fn tree_rows(&self) -> &[VisibleRow] {
        &self.rows
    }

    pub fn cursor_row(&self) -> Option<&VisibleRow> {
        self.rows.get(self.tree_cursor)
    }

    /// Keeps every list cursor inside its list.
    pub fn clamp_selections(&mut self) {
        fn clamp(cursor: usize, len: usize) -> usize {
            cursor.min(len.saturating_sub(1))
        }
        self.tree_cursor = clamp(self.tree_cursor, self.rows.len());
        self.resource_cursor = clamp(self.resource_cursor, self.resources.len());
        self.concept_cursor = clamp(self.concept_cursor, self.concepts.len());
        self.activity_cursor = clamp(self.activity_cursor, self.activities.len());

        debug_assert!(self.rows.is_empty() || self.tree_cursor < self.rows.len());
    }

    // ------------------------------------------------------------------
    // Selection and detail pane
    // ------------------------------------------------------------------

    /// Opens the detail pane on `id`. Returns `None` for an unknown id,
    /// otherwise whether the selected id changed. A change drops the answer
    /// and pedagogy state of the previous topic.
    pub fn select_topic(&mut self, id: &str) -> Option<bool> {
        let topic = self.store.get(id)?.clone();
        let changed = self.selection.select(topic);
        if changed {
            self.clear_topic_panes();
        }
        self.needs_redraw = true;
        Some(changed)
    }

    /// Enter on a tree row. Toggles the row's expansion when it has children
    /// and, independently, opens it in the detail pane.
    pub fn activate_cursor_row(&mut self) -> Option<bool> {
        let row = self.cursor_row()?.clone();
        if row.has_children {
            self.expansion.toggle(&row.id);
            self.rebuild_rows();
        }
        self.select_topic(&row.id)
    }

    /// Closes the detail pane. The expansion set is untouched.
    pub fn close_detail(&mut self) {
        self.selection.clear();
        self.clear_topic_panes();
        self.focus = Focus::Tree;
        self.needs_redraw = true;
    }

    fn clear_topic_panes(&mut self) {
        self.resources.clear();
        self.resource_cursor = 0;
        self.answer = None;
        self.detail_scroll = 0;
        self.concepts.clear();
        self.concept_cursor = 0;
        self.active_concept = None;
        self.activities.clear();
        self.activity_cursor = 0;
    }

    fn is_selected(&self, topic_id: &str) -> bool {
        self.selection.id() == Some(topic_id)
    }

    // ------------------------------------------------------------------
    // Expansion and filtering
    // ------------------------------------------------------------------

    pub fn toggle_cursor_expansion(&mut self) {
        if let Some(id) = self.cursor_row().map(|r| r.id.clone()) {
            self.expansion.toggle(&id);
            self.rebuild_rows();
        }
    }

    pub fn expand_cursor(&mut self) {
        let Some(row) = self.cursor_row() else { return };
        if row.has_children && !row.is_expanded {
            let id = row.id.clone();
            self.expansion.expand(&id);
            self.rebuild_rows();
        }
    }

    /// Collapses the cursor row, or moves to its parent when there is
    /// nothing to collapse.
    pub fn collapse_cursor(&mut self) {
        let Some(row) = self.cursor_row() else { return };
        if row.has_children && row.is_expanded {
            let id = row.id.clone();
            self.expansion.collapse(&id);
            self.rebuild_rows();
            return;
        }

        let parent_id = self
            .store
            .get(&row.id)
            .and_then(|t| t.parent_id.as_deref());
        if let Some(idx) = parent_id.and_then(|p| self.rows.iter().position(|r| r.id == p)) {
            self.tree_cursor = idx;
            self.needs_redraw = true;
        }
    }

    /// Empties the expansion set. The detail pane stays as it is.
    pub fn collapse_all(&mut self) {
        self.expansion.collapse_all();
        self.rebuild_rows();
    }

    /// Returns the new flag.
    pub fn toggle_show_completed(&mut self) -> bool {
        self.show_completed = !self.show_completed;
        self.rebuild_rows();
        self.show_completed
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn nav_up(&mut self) {
        match self.focus {
            Focus::Tree => self.tree_cursor = self.tree_cursor.saturating_sub(1),
            Focus::Resources => self.resource_cursor = self.resource_cursor.saturating_sub(1),
            Focus::Concepts => self.concept_cursor = self.concept_cursor.saturating_sub(1),
            Focus::Activities => self.activity_cursor = self.activity_cursor.saturating_sub(1),
        }
        self.needs_redraw = true;
    }

    pub fn nav_down(&mut self) {
        match self.focus {
            Focus::Tree => self.tree_cursor = self.tree_cursor.saturating_add(1),
            Focus::Resources => self.resource_cursor = self.resource_cursor.saturating_add(1),
            Focus::Concepts => self.concept_cursor = self.concept_cursor.saturating_add(1),
            Focus::Activities => self.activity_cursor = self.activity_cursor.saturating_add(1),
        }
        self.clamp_selections();
        self.needs_redraw = true;
    }

    pub fn cycle_focus(&mut self) {
        self.focus = self.focus.next(self.selection.is_open());
        self.needs_redraw = true;
    }

    pub fn scroll_detail(&mut self, down: bool, lines: u16) {
        self.detail_scroll = if down {
            self.detail_scroll.saturating_add(lines)
        } else {
            self.detail_scroll.saturating_sub(lines)
        };
        self.needs_redraw = true;
    }

    // ------------------------------------------------------------------
    // Models
    // ------------------------------------------------------------------

    /// Installs the model list and picks the default: the configured model if
    /// offered, else the first containing "gemini-1.5-flash", else the first.
    pub fn set_models(&mut self, models: Vec<LlmModel>) {
        let preferred = self
            .preferred_model
            .as_deref()
            .and_then(|want| models.iter().position(|m| m.name == want));
        if preferred.is_none() {
            if let Some(want) = &self.preferred_model {
                tracing::warn!(model = %want, "Configured model not offered by backend");
            }
        }

        self.selected_model = preferred
            .or_else(|| {
                models
                    .iter()
                    .position(|m| m.name.contains(PREFERRED_MODEL_FRAGMENT))
            })
            .or(if models.is_empty() { None } else { Some(0) });
        self.models = models;
        self.needs_redraw = true;
    }

    /// Name sent as `model_name`; `None` omits it.
    pub fn selected_model_name(&self) -> Option<&str> {
        self.selected_model
            .and_then(|i| self.models.get(i))
            .map(|m| m.name.as_str())
    }

    pub fn selected_model_label(&self) -> &str {
        self.selected_model
            .and_then(|i| self.models.get(i))
            .map_or("default model", |m| m.display_name.as_str())
    }

    /// Returns the newly selected model's display name.
    pub fn cycle_model(&mut self) -> Option<&str> {
        if self.models.is_empty() {
            return None;
        }
        let next = self.selected_model.map_or(0, |i| (i + 1) % self.models.len());
        self.selected_model = Some(next);
        self.needs_redraw = true;
        self.models.get(next).map(|m| m.display_name.as_str())
    }

    // ------------------------------------------------------------------
    // In-flight operations
    // ------------------------------------------------------------------

    /// Marks `op` as outstanding. Returns false, and says so in the status
    /// bar, when it already is.
    pub fn begin(&mut self, op: Operation) -> bool {
        if !self.in_flight.insert(op) {
            self.set_status(format!("{} already in progress", op.busy_label()));
            return false;
        }
        self.needs_redraw = true;
        true
    }

    pub fn finish(&mut self, op: Operation) {
        self.in_flight.remove(&op);
        self.needs_redraw = true;
    }

    /// Releases the operation a panicked task was running, if any.
    pub fn finish_task(&mut self, task: &str) {
        if let Some(op) = Operation::ALL.into_iter().find(|op| op.task_name() == task) {
            self.finish(op);
        }
    }

    pub fn is_busy(&self, op: Operation) -> bool {
        self.in_flight.contains(&op)
    }

    /// Label of one outstanding operation, for the status bar spinner.
    pub fn busy_label(&self) -> Option<&'static str> {
        Operation::ALL
            .into_iter()
            .find(|op| self.in_flight.contains(op))
            .map(Operation::busy_label)
    }

    pub fn tick(&mut self) {
        if !self.in_flight.is_empty() {
            self.spinner_frame = self.spinner_frame.wrapping_add(1);
            self.needs_redraw = true;
        }
    }

    // ------------------------------------------------------------------
    // Side panes
    // ------------------------------------------------------------------

    /// Returns false when the list belongs to a topic that is no longer shown.
    pub fn apply_resources(&mut self, topic_id: &str, resources: Vec<Resource>) -> bool {
        if !self.is_selected(topic_id) {
            return false;
        }
        self.resources = resources;
        self.clamp_selections();
        self.needs_redraw = true;
        true
    }

    pub fn selected_resource(&self) -> Option<&Resource> {
        self.resources.get(self.resource_cursor)
    }

    /// The cursor resource's URL, if it is a URL resource.
    pub fn selected_resource_url(&self) -> Option<&str> {
        self.selected_resource()
            .filter(|r| r.kind == ResourceKind::Url)
            .map(|r| r.path_or_url.as_str())
    }

    pub fn set_answer(&mut self, topic_id: &str, question: String, text: String) -> bool {
        if !self.is_selected(topic_id) {
            return false;
        }
        self.answer = Some(Answer { question, text });
        self.needs_redraw = true;
        true
    }

    pub fn apply_concepts(&mut self, topic_id: &str, concepts: Vec<Concept>) -> bool {
        if !self.is_selected(topic_id) {
            return false;
        }
        self.concepts = concepts;
        let still_there = self
            .active_concept
            .as_deref()
            .is_some_and(|id| self.concepts.iter().any(|c| c.id == id));
        if !still_there {
            self.active_concept = None;
            self.activities.clear();
        }
        self.clamp_selections();
        self.needs_redraw = true;
        true
    }

    /// Makes the cursor concept the active one. Returns its id so the caller
    /// can load its activities.
    pub fn activate_cursor_concept(&mut self) -> Option<String> {
        let id = self.concepts.get(self.concept_cursor)?.id.clone();
        if self.active_concept.as_deref() != Some(id.as_str()) {
            self.activities.clear();
            self.activity_cursor = 0;
        }
        self.active_concept = Some(id.clone());
        self.needs_redraw = true;
        Some(id)
    }

    pub fn active_concept(&self) -> Option<&Concept> {
        let id = self.active_concept.as_deref()?;
        self.concepts.iter().find(|c| c.id == id)
    }

    pub fn apply_activities(&mut self, concept_id: &str, activities: Vec<Activity>) -> bool {
        if self.active_concept.as_deref() != Some(concept_id) {
            return false;
        }
        self.activities = activities;
        self.clamp_selections();
        self.needs_redraw = true;
        true
    }

    pub fn selected_activity(&self) -> Option<&Activity> {
        self.activities.get(self.activity_cursor)
    }

    // ------------------------------------------------------------------
    // Overlays and status
    // ------------------------------------------------------------------

    /// Opens the text input. The prompt overlay starts from the last draft.
    pub fn open_input(&mut self, purpose: InputPurpose) {
        let buffer = match purpose {
            InputPurpose::Prompt => self.prompt_draft.clone(),
            _ => String::new(),
        };
        self.input = Some(InputState { purpose, buffer });
        self.needs_redraw = true;
    }

    pub fn show_notice(&mut self, title: impl Into<Cow<'static, str>>, message: impl Into<String>) {
        let title = title.into();
        let message = message.into();
        tracing::info!(%title, %message, "Showing notice");
        self.notice = Some(Notice { title, message });
        self.needs_redraw = true;
    }

    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
        self.needs_redraw = true;
    }

    /// Drops the status message once it is older than `STATUS_TTL`. Returns
    /// true if one was dropped.
    pub fn clear_expired_status(&mut self) -> bool {
        match &self.status_message {
            Some((_, since)) if since.elapsed() >= STATUS_TTL => {
                self.status_message = None;
                true
            }
            _ => false,
        }
    }
}
