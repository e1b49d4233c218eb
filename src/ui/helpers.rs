//! Background task spawning.
//!
//! Every backend call runs on its own task and reports back through the
//! `AppEvent` channel. Writes go through `App::begin` first so a second
//! trigger is refused while one is outstanding.

use crate::app::{App, AppEvent, Operation};
use crate::api::TopicStatus;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Wraps a future to catch panics and convert them to errors.
///
/// Tokio swallows a panicking task; this turns the panic payload into a
/// message the UI can show.
pub(super) async fn catch_task_panic<F, T>(future: F) -> Result<T, String>
where
    F: Future<Output = T>,
{
    AssertUnwindSafe(future)
        .catch_unwind()
        .await
        .map_err(|panic| {
            if let Some(s) = panic.downcast_ref::<&'static str>() {
                s.to_string()
            } else if let Some(s) = panic.downcast_ref::<String>() {
                s.clone()
            } else if let Some(e) = panic.downcast_ref::<Box<dyn std::error::Error + Send>>() {
                e.to_string()
            } else {
                format!("Unknown panic: {:?}", (*panic).type_id())
            }
        })
}

fn event_name(event: &AppEvent) -> &'static str {
    match event {
        AppEvent::TopicsLoaded(_) => "TopicsLoaded",
        AppEvent::ModelsLoaded(_) => "ModelsLoaded",
        AppEvent::SyllabusGenerated(_) => "SyllabusGenerated",
        AppEvent::StatusUpdated { .. } => "StatusUpdated",
        AppEvent::TopicElaborated { .. } => "TopicElaborated",
        AppEvent::QuestionAnswered { .. } => "QuestionAnswered",
        AppEvent::ResourcesLoaded { .. } => "ResourcesLoaded",
        AppEvent::ResourceAdded { .. } => "ResourceAdded",
        AppEvent::ConceptsLoaded { .. } => "ConceptsLoaded",
        AppEvent::ConceptsGenerated { .. } => "ConceptsGenerated",
        AppEvent::ActivitiesLoaded { .. } => "ActivitiesLoaded",
        AppEvent::ActivitiesGenerated { .. } => "ActivitiesGenerated",
        AppEvent::ActivityCompleted { .. } => "ActivityCompleted",
        AppEvent::TaskPanicked { .. } => "TaskPanicked",
    }
}

async fn send_event(tx: &mpsc::Sender<AppEvent>, event: AppEvent) {
    let name = event_name(&event);
    if let Err(e) = tx.send(event).await {
        tracing::warn!(error = %e, event = name, "Channel send failed (receiver dropped)");
    }
}

/// Runs `work` on a background task and forwards the event it produces.
/// A panic is reported as `AppEvent::TaskPanicked` under `task`.
pub(crate) fn spawn_task<F>(task: &'static str, tx: &mpsc::Sender<AppEvent>, work: F)
where
    F: Future<Output = AppEvent> + Send + 'static,
{
    let tx = tx.clone();
    tokio::spawn(async move {
        match catch_task_panic(work).await {
            Ok(event) => send_event(&tx, event).await,
            Err(panic_msg) => {
                tracing::error!(task, error = %panic_msg, "Background task panicked");
                send_event(
                    &tx,
                    AppEvent::TaskPanicked {
                        task,
                        error: panic_msg,
                    },
                )
                .await;
            }
        }
    });
}

// ============================================================================
// Reads
// ============================================================================

pub fn spawn_topics_load(app: &App, tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    spawn_task("load_topics", tx, async move {
        AppEvent::TopicsLoaded(api.list_topics().await)
    });
}

pub fn spawn_models_load(app: &App, tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    spawn_task("load_models", tx, async move {
        AppEvent::ModelsLoaded(api.list_models().await)
    });
}

pub(crate) fn spawn_resources_load(app: &App, topic_id: String, tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    spawn_task("load_resources", tx, async move {
        let result = api.list_resources(&topic_id).await;
        AppEvent::ResourcesLoaded { topic_id, result }
    });
}

pub(crate) fn spawn_concepts_load(app: &App, topic_id: String, tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    spawn_task("load_concepts", tx, async move {
        let result = api.list_concepts(&topic_id).await;
        AppEvent::ConceptsLoaded { topic_id, result }
    });
}

pub(crate) fn spawn_activities_load(app: &App, concept_id: String, tx: &mpsc::Sender<AppEvent>) {
    let api = app.api.clone();
    spawn_task("load_activities", tx, async move {
        let result = api.list_activities(&concept_id).await;
        AppEvent::ActivitiesLoaded { concept_id, result }
    });
}

/// Loads what the detail pane shows for the selected topic. Concepts are
/// fetched only when the selected id changed.
pub(crate) fn load_topic_panes(app: &App, id_changed: bool, tx: &mpsc::Sender<AppEvent>) {
    let Some(topic_id) = app.selection.id().map(str::to_string) else {
        return;
    };
    if id_changed {
        spawn_concepts_load(app, topic_id.clone(), tx);
    }
    spawn_resources_load(app, topic_id, tx);
}

// ============================================================================
// Writes
// ============================================================================

pub(crate) fn start_generate(app: &mut App, prompt: String, tx: &mpsc::Sender<AppEvent>) {
    if !app.begin(Operation::Generate) {
        return;
    }
    let api = app.api.clone();
    let model = app.selected_model_name().map(str::to_string);
    tracing::info!(model = ?model, "Generating syllabus");
    app.set_status("Generating syllabus...");

    spawn_task(Operation::Generate.task_name(), tx, async move {
        AppEvent::SyllabusGenerated(api.generate_syllabus(&prompt, model.as_deref()).await)
    });
}

/// Flips the selected topic between pending and completed.
pub(crate) fn start_status_toggle(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let Some(topic) = app.selection.topic() else {
        return;
    };
    let topic_id = topic.id.clone();
    let target: TopicStatus = topic.status.toggled();
    if !app.begin(Operation::StatusUpdate) {
        return;
    }
    let api = app.api.clone();

    spawn_task(Operation::StatusUpdate.task_name(), tx, async move {
        let result = api.update_status(&topic_id, target).await;
        AppEvent::StatusUpdated { topic_id, result }
    });
}

pub(crate) fn start_elaborate(
    app: &mut App,
    topic_id: String,
    instruction: String,
    tx: &mpsc::Sender<AppEvent>,
) {
    if !app.begin(Operation::Assistant) {
        return;
    }
    let api = app.api.clone();
    let model = app.selected_model_name().map(str::to_string);
    app.set_status("Elaborating topic...");

    spawn_task(Operation::Assistant.task_name(), tx, async move {
        let result = api
            .elaborate(&topic_id, instruction.trim(), model.as_deref())
            .await;
        AppEvent::TopicElaborated { topic_id, result }
    });
}

pub(crate) fn start_ask(
    app: &mut App,
    topic_id: String,
    question: String,
    tx: &mpsc::Sender<AppEvent>,
) {
    if !app.begin(Operation::Assistant) {
        return;
    }
    let api = app.api.clone();
    let model = app.selected_model_name().map(str::to_string);

    spawn_task(Operation::Assistant.task_name(), tx, async move {
        let result = api.ask(&topic_id, &question, model.as_deref()).await;
        AppEvent::QuestionAnswered {
            topic_id,
            question,
            result,
        }
    });
}

pub(crate) fn start_add_url(
    app: &mut App,
    topic_id: String,
    url: url::Url,
    tx: &mpsc::Sender<AppEvent>,
) {
    if !app.begin(Operation::Upload) {
        return;
    }
    let api = app.api.clone();
    let model = app.selected_model_name().map(str::to_string);
    app.set_status("Fetching and summarizing URL...");

    spawn_task(Operation::Upload.task_name(), tx, async move {
        let result = api
            .add_url_resource(&topic_id, url.as_str(), model.as_deref())
            .await;
        AppEvent::ResourceAdded { topic_id, result }
    });
}

pub(crate) fn start_pdf_upload(
    app: &mut App,
    topic_id: String,
    path: PathBuf,
    tx: &mpsc::Sender<AppEvent>,
) {
    if !app.begin(Operation::Upload) {
        return;
    }
    let api = app.api.clone();
    let model = app.selected_model_name().map(str::to_string);
    tracing::info!(path = %path.display(), "Uploading PDF");
    app.set_status("Uploading PDF...");

    spawn_task(Operation::Upload.task_name(), tx, async move {
        let result = api.upload_pdf(&topic_id, &path, model.as_deref()).await;
        AppEvent::ResourceAdded { topic_id, result }
    });
}

pub(crate) fn start_generate_concepts(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let Some(topic_id) = app.selection.id().map(str::to_string) else {
        return;
    };
    if !app.begin(Operation::GenerateConcepts) {
        return;
    }
    let api = app.api.clone();
    let model = app.selected_model_name().map(str::to_string);

    spawn_task(Operation::GenerateConcepts.task_name(), tx, async move {
        let result = api.generate_concepts(&topic_id, model.as_deref()).await;
        AppEvent::ConceptsGenerated { topic_id, result }
    });
}

pub(crate) fn start_generate_activities(app: &mut App, tx: &mpsc::Sender<AppEvent>) {
    let Some(concept_id) = app.active_concept.clone() else {
        app.set_status("Pick a concept first (Enter in the concepts panel)");
        return;
    };
    if !app.begin(Operation::GenerateActivities) {
        return;
    }
    let api = app.api.clone();
    let model = app.selected_model_name().map(str::to_string);

    spawn_task(Operation::GenerateActivities.task_name(), tx, async move {
        let result = api.generate_activities(&concept_id, model.as_deref()).await;
        AppEvent::ActivitiesGenerated { concept_id, result }
    });
}

pub(crate) fn start_complete_activity(app: &mut App, score: u8, tx: &mpsc::Sender<AppEvent>) {
    let Some(activity) = app.selected_activity() else {
        return;
    };
    if activity.is_completed() {
        app.set_status("Activity already completed");
        return;
    }
    let activity_id = activity.id.clone();
    let concept_id = activity.concept_id.clone();
    if !app.begin(Operation::CompleteActivity) {
        return;
    }
    let api = app.api.clone();

    spawn_task(Operation::CompleteActivity.task_name(), tx, async move {
        let result = api.complete_activity(&activity_id, score).await;
        AppEvent::ActivityCompleted { concept_id, result }
    });
}
