//! Keybinding registry: maps key events to actions per focus context, with
//! overrides from the `[keybindings]` table in config.toml.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    CycleFocus,
    Back,
    Select,
    ToggleExpand,
    ExpandNode,
    CollapseNode,
    CollapseAll,
    ToggleShowCompleted,
    Generate,
    CycleModel,
    Refresh,
    ToggleStatus,
    Elaborate,
    Ask,
    AddUrl,
    UploadPdf,
    OpenResource,
    GenerateConcepts,
    GenerateActivities,
    /// Self-assessment score, 1 to 5.
    CompleteActivity(u8),
    ScrollDetailDown,
    ScrollDetailUp,
    CycleTheme,
    ShowHelp,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit",
            Self::NavDown => "Move down",
            Self::NavUp => "Move up",
            Self::CycleFocus => "Cycle panel focus",
            Self::Back => "Close detail pane / dismiss",
            Self::Select => "Open topic (toggles children too)",
            Self::ToggleExpand => "Expand / collapse topic",
            Self::ExpandNode => "Expand topic",
            Self::CollapseNode => "Collapse topic",
            Self::CollapseAll => "Collapse all topics",
            Self::ToggleShowCompleted => "Show / hide completed topics",
            Self::Generate => "Generate a new syllabus",
            Self::CycleModel => "Cycle LLM model",
            Self::Refresh => "Reload topics",
            Self::ToggleStatus => "Mark learned / pending",
            Self::Elaborate => "Elaborate topic",
            Self::Ask => "Ask about topic",
            Self::AddUrl => "Add URL resource",
            Self::UploadPdf => "Upload PDF resource",
            Self::OpenResource => "Open resource in browser",
            Self::GenerateConcepts => "Generate key concepts",
            Self::GenerateActivities => "Generate activities",
            Self::CompleteActivity(_) => "Complete activity with score",
            Self::ScrollDetailDown => "Scroll detail down",
            Self::ScrollDetailUp => "Scroll detail up",
            Self::CycleTheme => "Cycle theme",
            Self::ShowHelp => "Show help",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context. Follows the focused panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    Tree,
    Resources,
    Concepts,
    Activities,
}

impl Context {
    pub fn label(self) -> &'static str {
        match self {
            Self::Global => "Global",
            Self::Tree => "Topic tree",
            Self::Resources => "Resources",
            Self::Concepts => "Concepts",
            Self::Activities => "Activities",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn char(c: char) -> Self {
        Self::plain(KeyCode::Char(c))
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    /// Terminals report upper-case letters with SHIFT set; bindings are
    /// registered by the character alone.
    fn normalized(code: KeyCode, modifiers: KeyModifiers) -> Self {
        let modifiers = match code {
            KeyCode::Char(_) => modifiers.difference(KeyModifiers::SHIFT),
            _ => modifiers,
        };
        Self::new(code, modifiers)
    }
}

/// Parses a config key string: "q", "Ctrl+d", "Enter", "Space", "F5".
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+").or_else(|| s.strip_prefix("ctrl+")) {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    let named = match s.to_lowercase().as_str() {
        "enter" | "return" => Some(KeyCode::Enter),
        "esc" | "escape" => Some(KeyCode::Esc),
        "tab" => Some(KeyCode::Tab),
        "up" => Some(KeyCode::Up),
        "down" => Some(KeyCode::Down),
        "left" => Some(KeyCode::Left),
        "right" => Some(KeyCode::Right),
        "backspace" => Some(KeyCode::Backspace),
        "space" => Some(KeyCode::Char(' ')),
        _ => None,
    };
    if let Some(code) = named {
        return Some(KeySpec::plain(code));
    }

    if let Some(n) = s
        .strip_prefix(['F', 'f'])
        .and_then(|digits| digits.parse::<u8>().ok())
    {
        return (1..=12).contains(&n).then(|| KeySpec::plain(KeyCode::F(n)));
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::char(c)),
        _ => None,
    }
}

fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::F(n) => format!("F{n}"),
        _ => "?".to_string(),
    };

    format!("{modifier}{key_name}")
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Context-aware key lookup. The same key can mean different things in
/// different panels; anything unbound in a panel falls back to Global.
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// Registration order, for the help screen.
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use Context::*;

        let global = [
            (KeySpec::char('q'), Action::Quit),
            (KeySpec::char('j'), Action::NavDown),
            (KeySpec::plain(KeyCode::Down), Action::NavDown),
            (KeySpec::char('k'), Action::NavUp),
            (KeySpec::plain(KeyCode::Up), Action::NavUp),
            (KeySpec::plain(KeyCode::Tab), Action::CycleFocus),
            (KeySpec::plain(KeyCode::Esc), Action::Back),
            (KeySpec::plain(KeyCode::Enter), Action::Select),
            (KeySpec::char('g'), Action::Generate),
            (KeySpec::char('m'), Action::CycleModel),
            (KeySpec::char('r'), Action::Refresh),
            (KeySpec::char('H'), Action::ToggleShowCompleted),
            (KeySpec::char('C'), Action::CollapseAll),
            (KeySpec::char('x'), Action::ToggleStatus),
            (KeySpec::char('e'), Action::Elaborate),
            (KeySpec::char('a'), Action::Ask),
            (KeySpec::char('u'), Action::AddUrl),
            (KeySpec::char('p'), Action::UploadPdf),
            (KeySpec::ctrl('d'), Action::ScrollDetailDown),
            (KeySpec::ctrl('u'), Action::ScrollDetailUp),
            (KeySpec::char('T'), Action::CycleTheme),
            (KeySpec::char('?'), Action::ShowHelp),
        ];
        for (key, action) in global {
            self.bind(Global, key, action);
        }

        self.bind(Tree, KeySpec::char(' '), Action::ToggleExpand);
        self.bind(Tree, KeySpec::char('l'), Action::ExpandNode);
        self.bind(Tree, KeySpec::plain(KeyCode::Right), Action::ExpandNode);
        self.bind(Tree, KeySpec::char('h'), Action::CollapseNode);
        self.bind(Tree, KeySpec::plain(KeyCode::Left), Action::CollapseNode);

        self.bind(Resources, KeySpec::char('o'), Action::OpenResource);
        self.bind(Resources, KeySpec::plain(KeyCode::Enter), Action::OpenResource);

        self.bind(Concepts, KeySpec::char('G'), Action::GenerateConcepts);

        self.bind(Activities, KeySpec::char('G'), Action::GenerateActivities);
        for score in crate::api::ACTIVITY_SCORE_RANGE {
            let digit = char::from(b'0' + score);
            self.bind(Activities, KeySpec::char(digit), Action::CompleteActivity(score));
        }
    }

    /// Applies `[keybindings]` overrides from config.
    ///
    /// Keys are action names ("quit", "collapse_all"), values are key strings.
    /// The new key replaces the old one in every context the action was bound
    /// in. Returns a warning per entry that could not be applied.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{action_name}', ignoring"));
                continue;
            };
            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{key_str}' for action '{action_name}', ignoring"
                ));
                continue;
            };

            let mut contexts: Vec<Context> = self
                .bindings
                .iter()
                .filter(|(_, _, a)| *a == action)
                .map(|(c, _, _)| *c)
                .collect();
            contexts.dedup();

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);
            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(action = %action_name, key = %key_str, "Applied keybinding override");
        }

        warnings
    }

    pub fn action_for_key(
        &self,
        code: KeyCode,
        modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        let key = KeySpec::normalized(code, modifiers);

        self.lookup.get(&(context, key)).copied().or_else(|| {
            (context != Context::Global)
                .then(|| self.lookup.get(&(Context::Global, key)).copied())
                .flatten()
        })
    }

    /// (context, key label, description) rows for the help screen.
    pub fn all_bindings(&self) -> Vec<(Context, String, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_action_name(name: &str) -> Option<Action> {
    let action = match name.to_lowercase().replace('-', "_").as_str() {
        "quit" => Action::Quit,
        "nav_down" | "down" => Action::NavDown,
        "nav_up" | "up" => Action::NavUp,
        "cycle_focus" | "focus" => Action::CycleFocus,
        "back" => Action::Back,
        "select" => Action::Select,
        "toggle_expand" | "toggle" => Action::ToggleExpand,
        "expand" | "expand_node" => Action::ExpandNode,
        "collapse" | "collapse_node" => Action::CollapseNode,
        "collapse_all" => Action::CollapseAll,
        "toggle_show_completed" | "show_completed" => Action::ToggleShowCompleted,
        "generate" => Action::Generate,
        "cycle_model" | "model" => Action::CycleModel,
        "refresh" => Action::Refresh,
        "toggle_status" | "status" => Action::ToggleStatus,
        "elaborate" => Action::Elaborate,
        "ask" => Action::Ask,
        "add_url" => Action::AddUrl,
        "upload_pdf" => Action::UploadPdf,
        "open_resource" | "open" => Action::OpenResource,
        "generate_concepts" => Action::GenerateConcepts,
        "generate_activities" => Action::GenerateActivities,
        "scroll_detail_down" | "scroll_down" => Action::ScrollDetailDown,
        "scroll_detail_up" | "scroll_up" => Action::ScrollDetailUp,
        "cycle_theme" | "theme" => Action::CycleTheme,
        "show_help" | "help" => Action::ShowHelp,
        _ => return None,
    };
    Some(action)
}
