use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

#[derive(Error, Debug)]
pub enum PdfPathError {
    #[error("No file path given")]
    Empty,
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("Not a regular file: {0}")]
    NotAFile(String),
    #[error("Not a PDF (expected .pdf extension): {0}")]
    NotPdf(String),
}

/// Checks a URL the user wants attached to a topic. The backend fetches it,
/// so only http and https with a host are accepted.
pub fn validate_resource_url(input: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(input.trim())?;
    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlValidationError::MissingHost),
    }
}

/// Checks a stored resource URL before handing it to the system browser.
/// Server data could carry `file:` or `javascript:` URLs.
pub fn validate_url_for_open(input: &str) -> Result<Url, UrlValidationError> {
    validate_resource_url(input)
}

/// Resolves and checks a local PDF path typed by the user. A leading `~/` is
/// expanded from `$HOME`.
pub fn validate_pdf_path(input: &str) -> Result<PathBuf, PdfPathError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(PdfPathError::Empty);
    }

    let path = match input.strip_prefix("~/") {
        Some(rest) => match std::env::var_os("HOME") {
            Some(home) => Path::new(&home).join(rest),
            None => PathBuf::from(input),
        },
        None => PathBuf::from(input),
    };

    let is_pdf = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(PdfPathError::NotPdf(path.display().to_string()));
    }

    match std::fs::metadata(&path) {
        Ok(meta) if meta.is_file() => Ok(path),
        Ok(_) => Err(PdfPathError::NotAFile(path.display().to_string())),
        Err(_) => Err(PdfPathError::NotFound(path.display().to_string())),
    }
}
