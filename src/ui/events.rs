//! Application event handling.
//!
//! Applies background task results to `App`. Read failures are logged and the
//! previous state is kept; write failures raise a blocking notice and leave
//! local state untouched. Every successful write triggers a refetch of what
//! it changed.

use crate::api::ApiError;
use crate::app::{App, AppEvent, Operation};
use crate::syllabus::Resolution;
use tokio::sync::mpsc;

use super::helpers::{
    spawn_activities_load, spawn_concepts_load, spawn_resources_load, spawn_topics_load,
};

/// Handle one event from a background task.
pub fn handle_app_event(app: &mut App, event: AppEvent, event_tx: &mpsc::Sender<AppEvent>) {
    match event {
        AppEvent::TopicsLoaded(Ok(topics)) => {
            if app.apply_topics(topics) == Resolution::Refreshed {
                if let Some(id) = app.selection.id().map(str::to_string) {
                    spawn_resources_load(app, id, event_tx);
                }
            }
        }
        AppEvent::TopicsLoaded(Err(e)) => read_failed(app, "topics", &e),

        AppEvent::ModelsLoaded(Ok(models)) => {
            tracing::debug!(count = models.len(), "Models loaded");
            app.set_models(models);
        }
        AppEvent::ModelsLoaded(Err(e)) => {
            // requests fall back to the backend's default model
            tracing::warn!(error = %e, "Failed to load models");
        }

        AppEvent::SyllabusGenerated(result) => {
            app.finish(Operation::Generate);
            match result {
                Ok(root) => {
                    tracing::info!(topic_id = %root.id, title = %root.title, "Syllabus generated");
                    app.prompt_draft.clear();
                    app.set_status(format!("Syllabus created: {}", root.title));
                    spawn_topics_load(app, event_tx);
                }
                Err(e) => write_failed(app, "Could not generate syllabus", &e),
            }
        }

        AppEvent::StatusUpdated { topic_id, result } => {
            app.finish(Operation::StatusUpdate);
            match result {
                Ok(topic) => {
                    tracing::info!(topic_id = %topic_id, status = topic.status.as_str(), "Topic status updated");
                    app.set_status(if topic.is_completed() {
                        "Marked as learned"
                    } else {
                        "Marked as pending"
                    });
                    spawn_topics_load(app, event_tx);
                }
                Err(e) => write_failed(app, "Could not update status", &e),
            }
        }

        AppEvent::TopicElaborated { topic_id, result } => {
            app.finish(Operation::Assistant);
            match result {
                Ok(_) => {
                    tracing::info!(topic_id = %topic_id, "Topic elaborated");
                    app.set_status(
                        "Topic expanded successfully! Check description and resources.",
                    );
                    // resources reload when the refresh resolves the selection
                    spawn_topics_load(app, event_tx);
                }
                Err(e) => write_failed(app, "Could not elaborate topic", &e),
            }
        }

        AppEvent::QuestionAnswered {
            topic_id,
            question,
            result,
        } => {
            app.finish(Operation::Assistant);
            match result {
                Ok(answer) => {
                    if !app.set_answer(&topic_id, question, answer) {
                        tracing::debug!(topic_id = %topic_id, "Answer arrived for a topic no longer shown");
                    }
                    spawn_topics_load(app, event_tx);
                }
                Err(e) => write_failed(app, "Could not get an answer", &e),
            }
        }

        AppEvent::ResourcesLoaded { topic_id, result } => match result {
            Ok(resources) => {
                if !app.apply_resources(&topic_id, resources) {
                    tracing::debug!(topic_id = %topic_id, "Dropped resources for a topic no longer shown");
                }
            }
            Err(e) => read_failed(app, "resources", &e),
        },

        AppEvent::ResourceAdded { topic_id, result } => {
            app.finish(Operation::Upload);
            match result {
                Ok(resource) => {
                    tracing::info!(topic_id = %topic_id, resource_id = %resource.id, "Resource added");
                    app.set_status(format!("Added {} resource", resource.kind.label()));
                    spawn_topics_load(app, event_tx);
                }
                Err(e) => write_failed(app, "Could not add resource", &e),
            }
        }

        AppEvent::ConceptsLoaded { topic_id, result } => match result {
            Ok(concepts) => {
                app.apply_concepts(&topic_id, concepts);
            }
            Err(e) => read_failed(app, "concepts", &e),
        },

        AppEvent::ConceptsGenerated { topic_id, result } => {
            app.finish(Operation::GenerateConcepts);
            match result {
                Ok(concepts) => {
                    app.set_status(format!("Generated {} concepts", concepts.len()));
                    if app.selection.id() == Some(topic_id.as_str()) {
                        spawn_concepts_load(app, topic_id, event_tx);
                    }
                }
                Err(e) => write_failed(app, "Could not generate concepts", &e),
            }
        }

        AppEvent::ActivitiesLoaded { concept_id, result } => match result {
            Ok(activities) => {
                app.apply_activities(&concept_id, activities);
            }
            Err(e) => read_failed(app, "activities", &e),
        },

        AppEvent::ActivitiesGenerated { concept_id, result } => {
            app.finish(Operation::GenerateActivities);
            match result {
                Ok(activities) => {
                    app.set_status(format!("Generated {} activities", activities.len()));
                    reload_activities(app, concept_id, event_tx);
                }
                Err(e) => write_failed(app, "Could not generate activities", &e),
            }
        }

        AppEvent::ActivityCompleted { concept_id, result } => {
            app.finish(Operation::CompleteActivity);
            match result {
                Ok(activity) => {
                    let score = activity.user_score.map_or_else(String::new, |s| format!(" ({s}/5)"));
                    app.set_status(format!("Activity completed{score}"));
                    reload_activities(app, concept_id, event_tx);
                }
                Err(e) => write_failed(app, "Could not complete activity", &e),
            }
        }

        AppEvent::TaskPanicked { task, error } => {
            tracing::error!(task, error = %error, "Background task panicked");
            app.finish_task(task);
            app.set_status(format!("Internal error in {task} task"));
        }
    }
}

fn reload_activities(app: &App, concept_id: String, event_tx: &mpsc::Sender<AppEvent>) {
    if app.active_concept.as_deref() == Some(concept_id.as_str()) {
        spawn_activities_load(app, concept_id, event_tx);
    }
}

/// Reads keep the last good state on screen.
fn read_failed(app: &mut App, what: &str, error: &ApiError) {
    tracing::warn!(error = %error, what, "Read request failed, keeping previous state");
    app.set_status(format!("Could not load {what}: {error}"));
}

fn write_failed(app: &mut App, title: &'static str, error: &ApiError) {
    tracing::error!(error = %error, "{title}");
    app.show_notice(title, error.to_string());
}
