//! Text sanitizing for terminal output, timestamp formatting, and validation
//! of user-supplied URLs and file paths.

mod text;
mod time;
mod validation;

pub use text::{display_width, single_line, strip_control_chars, truncate_to_width};
pub use time::{format_relative_time, parse_timestamp};
pub use validation::{
    validate_pdf_path, validate_resource_url, validate_url_for_open, PdfPathError,
    UrlValidationError,
};

/// Longest text accepted in any input overlay.
pub const MAX_INPUT_LENGTH: usize = 2000;
