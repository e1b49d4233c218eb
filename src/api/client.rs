use super::error::{error_detail, ApiError};
use super::types::{
    Activity, AskRequest, AskResponse, CompleteActivityRequest, Concept, ElaborateRequest,
    GenerateActivitiesRequest, GenerateConceptsRequest, LlmModel, Resource, Topic, TopicStatus,
};
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Syllabus lists and LLM answers stay well under this.
const MAX_RESPONSE_SIZE: usize = 8 * 1024 * 1024;
pub const MAX_PDF_SIZE: u64 = 50 * 1024 * 1024;

const MAX_READ_RETRIES: u32 = 2;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

/// Thin typed wrapper over the syllabus backend.
///
/// Cloning is cheap: `reqwest::Client` is reference counted, so each spawned
/// task takes its own copy.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidBaseUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(60))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            timeout,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ------------------------------------------------------------------
    // Topics
    // ------------------------------------------------------------------

    pub async fn list_topics(&self) -> Result<Vec<Topic>, ApiError> {
        self.get_json(self.endpoint(&["topics", ""])).await
    }

    /// Asks the backend to build a syllabus for `prompt`; returns the new root.
    pub async fn generate_syllabus(
        &self,
        prompt: &str,
        model_name: Option<&str>,
    ) -> Result<Topic, ApiError> {
        let mut url = self.endpoint(&["topics", "generate"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("prompt", prompt);
            if let Some(model) = model_name {
                query.append_pair("model_name", model);
            }
        }
        self.write_json(Method::POST, url, None::<&()>).await
    }

    pub async fn update_status(
        &self,
        topic_id: &str,
        status: TopicStatus,
    ) -> Result<Topic, ApiError> {
        let mut url = self.endpoint(&["topics", topic_id, "status"]);
        url.query_pairs_mut().append_pair("status", status.as_str());
        self.write_json(Method::PATCH, url, None::<&()>).await
    }

    pub async fn elaborate(
        &self,
        topic_id: &str,
        instruction: &str,
        model_name: Option<&str>,
    ) -> Result<Topic, ApiError> {
        let url = self.endpoint(&["topics", topic_id, "elaborate"]);
        let body = ElaborateRequest {
            instruction,
            model_name,
        };
        self.write_json(Method::POST, url, Some(&body)).await
    }

    pub async fn ask(
        &self,
        topic_id: &str,
        question: &str,
        model_name: Option<&str>,
    ) -> Result<String, ApiError> {
        let url = self.endpoint(&["topics", topic_id, "ask"]);
        let body = AskRequest {
            question,
            model_name,
        };
        let response: AskResponse = self.write_json(Method::POST, url, Some(&body)).await?;
        Ok(response.answer)
    }

    pub async fn list_models(&self) -> Result<Vec<LlmModel>, ApiError> {
        self.get_json(self.endpoint(&["topics", "models"])).await
    }

    // ------------------------------------------------------------------
    // Resources
    // ------------------------------------------------------------------

    pub async fn list_resources(&self, topic_id: &str) -> Result<Vec<Resource>, ApiError> {
        self.get_json(self.endpoint(&["resources", "topic", topic_id]))
            .await
    }

    pub async fn add_url_resource(
        &self,
        topic_id: &str,
        resource_url: &str,
        model_name: Option<&str>,
    ) -> Result<Resource, ApiError> {
        let mut url = self.endpoint(&["resources", "add", "url"]);
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("topic_id", topic_id);
            query.append_pair("url", resource_url);
            if let Some(model) = model_name {
                query.append_pair("model_name", model);
            }
        }
        self.write_json(Method::POST, url, None::<&()>).await
    }

    /// Uploads a local PDF as a multipart form (`topic_id`, `file`, `model_name`).
    pub async fn upload_pdf(
        &self,
        topic_id: &str,
        path: &Path,
        model_name: Option<&str>,
    ) -> Result<Resource, ApiError> {
        let metadata = tokio::fs::metadata(path).await?;
        if !metadata.is_file() {
            return Err(ApiError::InvalidFile(format!("{} is not a file", path.display())));
        }
        if metadata.len() > MAX_PDF_SIZE {
            return Err(ApiError::InvalidFile(format!(
                "{} exceeds {} MB",
                path.display(),
                MAX_PDF_SIZE / (1024 * 1024)
            )));
        }

        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload.pdf".to_string());
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("application/pdf")?;

        let mut form = reqwest::multipart::Form::new()
            .text("topic_id", topic_id.to_string())
            .part("file", part);
        if let Some(model) = model_name {
            form = form.text("model_name", model.to_string());
        }

        let url = self.endpoint(&["resources", "upload", "pdf"]);
        tracing::debug!(%url, topic_id, path = %path.display(), "Uploading PDF resource");
        let response = self.send(self.http.post(url).multipart(form)).await?;
        decode(response).await
    }

    // ------------------------------------------------------------------
    // Pedagogy
    // ------------------------------------------------------------------

    pub async fn list_concepts(&self, topic_id: &str) -> Result<Vec<Concept>, ApiError> {
        let mut url = self.endpoint(&["pedagogy", "concepts", ""]);
        url.query_pairs_mut().append_pair("topic_id", topic_id);
        self.get_json(url).await
    }

    pub async fn generate_concepts(
        &self,
        topic_id: &str,
        model_name: Option<&str>,
    ) -> Result<Vec<Concept>, ApiError> {
        let url = self.endpoint(&["pedagogy", "concepts", "generate"]);
        let body = GenerateConceptsRequest {
            topic_id,
            model_name,
        };
        self.write_json(Method::POST, url, Some(&body)).await
    }

    pub async fn list_activities(&self, concept_id: &str) -> Result<Vec<Activity>, ApiError> {
        let mut url = self.endpoint(&["pedagogy", "activities", ""]);
        url.query_pairs_mut().append_pair("concept_id", concept_id);
        self.get_json(url).await
    }

    pub async fn generate_activities(
        &self,
        concept_id: &str,
        model_name: Option<&str>,
    ) -> Result<Vec<Activity>, ApiError> {
        let url = self.endpoint(&["pedagogy", "activities", "generate"]);
        let body = GenerateActivitiesRequest {
            concept_id,
            model_name,
        };
        self.write_json(Method::POST, url, Some(&body)).await
    }

    pub async fn complete_activity(
        &self,
        activity_id: &str,
        user_score: u8,
    ) -> Result<Activity, ApiError> {
        let url = self.endpoint(&["pedagogy", "activities", activity_id, "complete"]);
        let body = CompleteActivityRequest { user_score };
        self.write_json(Method::PATCH, url, Some(&body)).await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    /// Joins percent-encoded path segments onto the base URL. A trailing empty
    /// segment yields a trailing slash (`/topics/`), which FastAPI routes
    /// declared with one expect.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET with retry on transient failures (timeout, network, 5xx).
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        let mut attempt = 0;
        loop {
            let result = match self.send(self.http.get(url.clone())).await {
                Ok(response) => decode(response).await,
                Err(e) => Err(e),
            };
            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < MAX_READ_RETRIES => {
                    let delay = RETRY_BASE_DELAY * (1 << attempt);
                    tracing::debug!(
                        %url,
                        error = %e,
                        retry = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying read after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Mutating request. Never retried: a timed-out generate may still have
    /// created topics server-side.
    async fn write_json<B, T>(&self, method: Method, url: Url, body: Option<&B>) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        tracing::debug!(%method, %url, "Sending write request");
        let mut request = self.http.request(method, url);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(serde_json::to_vec(body)?);
        }
        let response = self.send(request).await?;
        decode(response).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        // The client timeout covers the body too; this outer one also bounds
        // connection setup under a stalled resolver.
        let response = tokio::time::timeout(self.timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout)?
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::Timeout
                } else {
                    ApiError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = read_limited_bytes(response, 64 * 1024)
                .await
                .unwrap_or_default();
            let detail = error_detail(&body);
            tracing::debug!(status = status.as_u16(), %detail, "Backend returned error status");
            return Err(ApiError::HttpStatus {
                status: status.as_u16(),
                detail,
            });
        }
        Ok(response)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

async fn read_limited_bytes(response: Response, limit: usize) -> Result<Vec<u8>, ApiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            if e.is_timeout() {
                ApiError::Timeout
            } else {
                ApiError::Network(e)
            }
        })?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(ApiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn endpoint_keeps_trailing_slash() {
        let api = ApiClient::new("http://localhost:8000", Duration::from_secs(1)).unwrap();
        assert_eq!(
            api.endpoint(&["topics", ""]).as_str(),
            "http://localhost:8000/topics/"
        );
        assert_eq!(
            api.endpoint(&["topics", "a b", "ask"]).as_str(),
            "http://localhost:8000/topics/a%20b/ask"
        );
    }

    #[test]
    fn endpoint_respects_base_path() {
        let api = ApiClient::new("http://example.com/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(
            api.endpoint(&["topics", "models"]).as_str(),
            "http://example.com/api/topics/models"
        );
    }

    #[test]
    fn rejects_non_http_base() {
        assert!(matches!(
            ApiClient::new("ftp://example.com", Duration::from_secs(1)),
            Err(ApiError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            ApiClient::new("not a url", Duration::from_secs(1)),
            Err(ApiError::InvalidBaseUrl(_))
        ));
    }

    #[tokio::test]
    async fn read_retries_on_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topics/models"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/topics/models"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"[{"name": "models/gemini-1.5-flash", "display_name": "Gemini Flash"}]"#,
            ))
            .mount(&server)
            .await;

        let models = client_for(&server).list_models().await.unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].display_name, "Gemini Flash");
    }

    #[tokio::test]
    async fn write_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/topics/t1/status"))
            .and(query_param("status", "completed"))
            .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"detail": "db down"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .update_status("t1", TopicStatus::Completed)
            .await
            .unwrap_err();
        match err {
            ApiError::HttpStatus { status, detail } => {
                assert_eq!(status, 500);
                assert_eq!(detail, "db down");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn oversized_response_is_rejected() {
        let server = MockServer::start().await;
        let huge = format!("[\"{}\"]", "x".repeat(MAX_RESPONSE_SIZE + 1));
        Mock::given(method("GET"))
            .and(path("/topics/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(huge))
            .mount(&server)
            .await;

        let err = client_for(&server).list_topics().await.unwrap_err();
        assert!(matches!(err, ApiError::ResponseTooLarge(_)));
    }

    #[tokio::test]
    async fn malformed_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/topics/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).list_topics().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn upload_rejects_missing_file() {
        let api = ApiClient::new("http://localhost:8000", Duration::from_secs(1)).unwrap();
        let path = std::env::temp_dir().join("autodidact_missing_upload.pdf");
        let err = api.upload_pdf("t1", &path, None).await.unwrap_err();
        assert!(matches!(err, ApiError::Io(_)));
    }
}
