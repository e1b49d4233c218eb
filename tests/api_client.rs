//! Integration tests for `ApiClient` against a mock backend.
//!
//! Each test starts its own wiremock server and checks the method, path,
//! query string and body the client sends, and how it decodes the reply.

use autodidact::api::{
    ActivityKind, ActivityStatus, ApiClient, ApiError, ResourceKind, TopicStatus,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

fn topic_json(id: &str, parent: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "title": format!("Topic {id}"),
        "description": null,
        "parent_id": parent,
        "order_index": 0,
        "status": "pending"
    })
}

// ============================================================================
// Topics
// ============================================================================

#[tokio::test]
async fn test_list_topics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topics/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            topic_json("root", None),
            topic_json("child", Some("root")),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let topics = client_for(&server).list_topics().await.unwrap();
    assert_eq!(topics.len(), 2);
    assert_eq!(topics[1].parent_id.as_deref(), Some("root"));
    assert_eq!(topics[0].status, TopicStatus::Pending);
}

#[tokio::test]
async fn test_generate_syllabus_sends_prompt_and_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/topics/generate"))
        .and(query_param("prompt", "Linear algebra & friends"))
        .and(query_param("model_name", "models/gemini-1.5-flash"))
        .respond_with(ResponseTemplate::new(200).set_body_json(topic_json("root", None)))
        .expect(1)
        .mount(&server)
        .await;

    let root = client_for(&server)
        .generate_syllabus("Linear algebra & friends", Some("models/gemini-1.5-flash"))
        .await
        .unwrap();
    assert_eq!(root.id, "root");
}

#[tokio::test]
async fn test_update_status() {
    let server = MockServer::start().await;
    let mut done = topic_json("t1", None);
    done["status"] = json!("completed");
    Mock::given(method("PATCH"))
        .and(path("/topics/t1/status"))
        .and(query_param("status", "completed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(done))
        .expect(1)
        .mount(&server)
        .await;

    let topic = client_for(&server)
        .update_status("t1", TopicStatus::Completed)
        .await
        .unwrap();
    assert!(topic.is_completed());
}

#[tokio::test]
async fn test_elaborate_omits_missing_model() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/topics/t1/elaborate"))
        .and(body_json(json!({ "instruction": "more examples" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(topic_json("t1", None)))
        .expect(1)
        .mount(&server)
        .await;

    client_for(&server)
        .elaborate("t1", "more examples", None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_ask_returns_answer() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/topics/t1/ask"))
        .and(body_json(json!({ "question": "Why?", "model_name": "m" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "answer": "Because." })))
        .mount(&server)
        .await;

    let answer = client_for(&server).ask("t1", "Why?", Some("m")).await.unwrap();
    assert_eq!(answer, "Because.");
}

#[tokio::test]
async fn test_list_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topics/models"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "models/gemini-1.5-flash", "display_name": "Gemini 1.5 Flash" }
        ])))
        .mount(&server)
        .await;

    let models = client_for(&server).list_models().await.unwrap();
    assert_eq!(models[0].display_name, "Gemini 1.5 Flash");
}

// ============================================================================
// Resources
// ============================================================================

#[tokio::test]
async fn test_list_resources() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/resources/topic/t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": "r1",
            "topic_id": "t1",
            "type": "url",
            "path_or_url": "https://example.com/notes",
            "content_summary": "Notes",
            "created_at": "2024-03-01T10:00:00"
        }])))
        .mount(&server)
        .await;

    let resources = client_for(&server).list_resources("t1").await.unwrap();
    assert_eq!(resources[0].kind, ResourceKind::Url);
    assert_eq!(resources[0].content_summary.as_deref(), Some("Notes"));
}

#[tokio::test]
async fn test_add_url_resource() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/resources/add/url"))
        .and(query_param("topic_id", "t1"))
        .and(query_param("url", "https://example.com/a?b=c"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "r2",
            "topic_id": "t1",
            "type": "url",
            "path_or_url": "https://example.com/a?b=c"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let resource = client_for(&server)
        .add_url_resource("t1", "https://example.com/a?b=c", None)
        .await
        .unwrap();
    assert_eq!(resource.id, "r2");
    assert!(resource.content_summary.is_none());
}

#[tokio::test]
async fn test_upload_pdf_is_multipart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/resources/upload/pdf"))
        .and(body_string_contains("name=\"topic_id\""))
        .and(body_string_contains("filename=\"chapter.pdf\""))
        .and(body_string_contains("%PDF-1.4 test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "r3",
            "topic_id": "t1",
            "type": "pdf",
            "path_or_url": "uploads/chapter.pdf"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = std::env::temp_dir().join("autodidact_upload_test");
    std::fs::create_dir_all(&dir).unwrap();
    let pdf = dir.join("chapter.pdf");
    std::fs::write(&pdf, b"%PDF-1.4 test").unwrap();

    let resource = client_for(&server)
        .upload_pdf("t1", &pdf, Some("m"))
        .await
        .unwrap();
    assert_eq!(resource.kind, ResourceKind::Pdf);

    std::fs::remove_dir_all(&dir).ok();
}

// ============================================================================
// Pedagogy
// ============================================================================

#[tokio::test]
async fn test_concepts_list_and_generate() {
    let server = MockServer::start().await;
    let concepts = json!([
        { "id": "k1", "topic_id": "t1", "title": "Vectors", "description": null, "order_index": 0 }
    ]);
    Mock::given(method("GET"))
        .and(path("/pedagogy/concepts/"))
        .and(query_param("topic_id", "t1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(concepts.clone()))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/pedagogy/concepts/generate"))
        .and(body_json(json!({ "topic_id": "t1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(concepts))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert_eq!(client.list_concepts("t1").await.unwrap()[0].title, "Vectors");
    assert_eq!(client.generate_concepts("t1", None).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_activities_list_generate_complete() {
    let server = MockServer::start().await;
    let activity = json!({
        "id": "a1",
        "concept_id": "k1",
        "type": "quiz",
        "instructions": "Answer three questions",
        "content": { "questions": [] },
        "status": "pending",
        "user_score": null
    });
    let mut completed = activity.clone();
    completed["status"] = json!("completed");
    completed["user_score"] = json!(4);

    Mock::given(method("GET"))
        .and(path("/pedagogy/activities/"))
        .and(query_param("concept_id", "k1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([activity.clone()])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/pedagogy/activities/generate"))
        .and(body_json(json!({ "concept_id": "k1", "model_name": "m" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([activity])))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/pedagogy/activities/a1/complete"))
        .and(body_json(json!({ "user_score": 4 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completed))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let listed = client.list_activities("k1").await.unwrap();
    assert_eq!(listed[0].kind, ActivityKind::Quiz);
    assert_eq!(client.generate_activities("k1", Some("m")).await.unwrap().len(), 1);

    let done = client.complete_activity("a1", 4).await.unwrap();
    assert_eq!(done.status, ActivityStatus::Completed);
    assert_eq!(done.user_score, Some(4));
}

// ============================================================================
// Errors
// ============================================================================

#[tokio::test]
async fn test_http_error_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/topics/t1/ask"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({ "detail": "Topic not found" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server).ask("t1", "Why?", None).await.unwrap_err();
    match err {
        ApiError::HttpStatus { status, detail } => {
            assert_eq!(status, 404);
            assert_eq!(detail, "Topic not found");
        }
        other => panic!("expected HttpStatus, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_backend_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/topics/generate"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(topic_json("r", None))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = ApiClient::new(&server.uri(), Duration::from_millis(200)).unwrap();
    let err = client.generate_syllabus("x", None).await.unwrap_err();
    assert!(matches!(err, ApiError::Timeout), "got {err:?}");
}
