//! Request validation
//!
//! Runs before any store or blob call. A request that fails here has had no
//! side effects.

use thiserror::Error;
use url::Url;

use super::request::{ContentChange, ContentSelector, NewPost, PostEdit, Upload};

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Title is required")]
    MissingTitle,

    #[error("Description is required")]
    MissingDescription,

    #[error("Image is required")]
    MissingImage,

    /// Upload without a usable name
    #[error("{0} has no file name")]
    MissingFileName(&'static str),

    #[error("{0} is empty")]
    EmptyUpload(&'static str),

    #[error("{what} too large: {size} bytes (max: {max})")]
    UploadTooLarge {
        what: &'static str,
        size: u64,
        max: u64,
    },

    /// Neither a content file nor an external URL was supplied
    #[error("Content file or external URL is required")]
    MissingContent,

    #[error("External URL is required")]
    MissingUrl,

    #[error("Malformed URL: {0}")]
    MalformedUrl(String),

    #[error("Position {position} out of range (max: {max})")]
    PositionOutOfRange { position: usize, max: usize },

    /// Unparseable or contradictory form input
    #[error("Invalid field {field}: {reason}")]
    InvalidField { field: String, reason: String },
}

impl ValidationError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ValidationError::UploadTooLarge { .. } => 413,
            _ => 400,
        }
    }
}

fn require_text(value: &str, missing: ValidationError) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(missing)
    } else {
        Ok(())
    }
}

fn validate_upload(upload: &Upload, what: &'static str) -> Result<(), ValidationError> {
    if upload.file_name.trim().is_empty() {
        return Err(ValidationError::MissingFileName(what));
    }
    if upload.bytes.is_empty() {
        return Err(ValidationError::EmptyUpload(what));
    }
    Ok(())
}

/// Reject any upload above `max_bytes` (0 means no limit).
///
/// Checked before the first blob call so an oversized edit leaves the
/// current files in place.
pub fn validate_upload_sizes<'a>(
    uploads: impl IntoIterator<Item = (&'static str, &'a Upload)>,
    max_bytes: u64,
) -> Result<(), ValidationError> {
    if max_bytes == 0 {
        return Ok(());
    }
    for (what, upload) in uploads {
        if upload.size() > max_bytes {
            return Err(ValidationError::UploadTooLarge {
                what,
                size: upload.size(),
                max: max_bytes,
            });
        }
    }
    Ok(())
}

/// Trimmed external URL; must be an absolute http(s) URL.
pub fn validate_external_url(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::MissingUrl);
    }
    let parsed = Url::parse(trimmed).map_err(|e| ValidationError::MalformedUrl(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
        return Err(ValidationError::MalformedUrl(format!(
            "{} is not an http(s) URL",
            trimmed
        )));
    }
    Ok(trimmed.to_string())
}

fn validate_content(content: &ContentSelector) -> Result<(), ValidationError> {
    match content {
        ContentSelector::File(upload) => validate_upload(upload, "Content file"),
        ContentSelector::ExternalUrl(url) => validate_external_url(url).map(|_| ()),
    }
}

fn validate_position(position: Option<usize>, max: usize) -> Result<(), ValidationError> {
    match position {
        Some(position) if position > max => {
            Err(ValidationError::PositionOutOfRange { position, max })
        }
        _ => Ok(()),
    }
}

/// Check an add against a collection currently holding `count` posts.
pub fn validate_new_post(request: &NewPost, count: usize) -> Result<(), ValidationError> {
    require_text(&request.title, ValidationError::MissingTitle)?;
    require_text(&request.description, ValidationError::MissingDescription)?;
    let image = request.image.as_ref().ok_or(ValidationError::MissingImage)?;
    validate_upload(image, "Image")?;
    validate_content(&request.content)?;
    validate_position(request.target_position, count)
}

/// Check an edit against a collection currently holding `count` posts
/// (including the one being edited).
pub fn validate_post_edit(request: &PostEdit, count: usize) -> Result<(), ValidationError> {
    require_text(&request.title, ValidationError::MissingTitle)?;
    require_text(&request.description, ValidationError::MissingDescription)?;
    if let Some(image) = &request.image {
        validate_upload(image, "Image")?;
    }
    if let ContentChange::Replace(content) = &request.content {
        validate_content(content)?;
    }
    validate_position(request.target_position, count.saturating_sub(1))
}
