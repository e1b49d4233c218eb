use serde::{Deserialize, Serialize};

// ============================================================================
// Topics
// ============================================================================

/// Learning progress of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    #[default]
    Pending,
    Completed,
}

impl TopicStatus {
    /// Wire value used in the `status` query parameter.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// The status a "mark learned / mark pending" toggle moves to.
    pub fn toggled(self) -> Self {
        match self {
            Self::Pending => Self::Completed,
            Self::Completed => Self::Pending,
        }
    }

    /// Upper-case badge text for the detail pane.
    pub fn badge(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
        }
    }
}

/// A node of the syllabus as returned by `GET /topics/`.
///
/// The server also sends `created_at`; unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub order_index: i64,
    #[serde(default)]
    pub status: TopicStatus,
}

impl Topic {
    pub fn is_completed(&self) -> bool {
        self.status == TopicStatus::Completed
    }

    /// Description text, or `None` when the backend has not generated one yet.
    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
    }
}

/// An LLM the backend can route requests to (`GET /topics/models`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmModel {
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskResponse {
    pub answer: String,
}

// ============================================================================
// Resources
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Pdf,
    Url,
    Text,
}

impl ResourceKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Pdf => "PDF",
            Self::Url => "URL",
            Self::Text => "TEXT",
        }
    }
}

/// Material attached to a topic. `raw_content` is not decoded;
/// it holds the full extracted text and is never displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    pub topic_id: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    pub path_or_url: String,
    #[serde(default)]
    pub content_summary: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

// ============================================================================
// Pedagogy
// ============================================================================

/// A key concept generated for a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concept {
    pub id: String,
    pub topic_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order_index: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Read,
    Watch,
    Quiz,
    Code,
    Write,
    #[serde(other)]
    Other,
}

impl ActivityKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Watch => "WATCH",
            Self::Quiz => "QUIZ",
            Self::Code => "CODE",
            Self::Write => "WRITE",
            Self::Other => "TASK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityStatus {
    #[default]
    Pending,
    Completed,
}

/// A practice task generated for a concept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: String,
    pub concept_id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub instructions: String,
    #[serde(default)]
    pub content: serde_json::Value,
    #[serde(default)]
    pub status: ActivityStatus,
    #[serde(default)]
    pub user_score: Option<u8>,
}

impl Activity {
    pub fn is_completed(&self) -> bool {
        self.status == ActivityStatus::Completed
    }
}

/// Self-assessment scores accepted by `PATCH /pedagogy/activities/{id}/complete`.
pub const ACTIVITY_SCORE_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

// ============================================================================
// Request bodies
// ============================================================================

#[derive(Debug, Serialize)]
pub(crate) struct ElaborateRequest<'a> {
    pub instruction: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AskRequest<'a> {
    pub question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateConceptsRequest<'a> {
    pub topic_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GenerateActivitiesRequest<'a> {
    pub concept_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompleteActivityRequest {
    pub user_score: u8,
}
