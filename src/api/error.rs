use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error {status}: {detail}")]
    HttpStatus { status: u16, detail: String },
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid backend URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Cannot read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid file: {0}")]
    InvalidFile(String),
}

impl ApiError {
    /// Returns true if a read request that failed this way may be retried.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::Network(_) => true,
            ApiError::HttpStatus { status, .. } => *status >= 500,
            ApiError::ResponseTooLarge(_)
            | ApiError::Decode(_)
            | ApiError::InvalidBaseUrl(_)
            | ApiError::Io(_)
            | ApiError::InvalidFile(_) => false,
        }
    }
}

/// Pull the human-readable message out of an error body.
///
/// FastAPI answers `{"detail": "..."}` for raised `HTTPException`s and
/// `{"detail": [...]}` for validation failures; anything else is shown raw.
pub(crate) fn error_detail(body: &[u8]) -> String {
    const MAX_DETAIL_CHARS: usize = 300;

    let detail = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::Object(map)) => match map.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => serde_json::Value::Object(map).to_string(),
        },
        _ => String::from_utf8_lossy(body).trim().to_string(),
    };

    if detail.chars().count() > MAX_DETAIL_CHARS {
        let mut cut: String = detail.chars().take(MAX_DETAIL_CHARS).collect();
        cut.push_str("...");
        cut
    } else if detail.is_empty() {
        "no details".to_string()
    } else {
        detail
    }
}
