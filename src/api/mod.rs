//! HTTP client for the syllabus backend.

mod client;
mod error;
mod types;

pub use client::{ApiClient, MAX_PDF_SIZE};
pub use error::ApiError;
pub use types::{
    Activity, ActivityKind, ActivityStatus, Concept, LlmModel, Resource, ResourceKind, Topic,
    TopicStatus, ACTIVITY_SCORE_RANGE,
};
