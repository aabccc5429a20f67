//! Multipart post form
//!
//! Fields: `title`, `description`, `image` (file), `content_type`
//! (`file` | `url`), `content_file` (file), `external_url`, `position`.
//! A file input left empty by the browser arrives as a part with no name
//! and no bytes; it is treated as absent.

use axum::extract::multipart::{Field, Multipart, MultipartError};

use crate::post::Post;
use crate::service::{ContentChange, ContentSelector, NewPost, PostEdit, Upload, ValidationError};

fn invalid(field: &str, reason: impl Into<String>) -> ValidationError {
    ValidationError::InvalidField {
        field: field.to_string(),
        reason: reason.into(),
    }
}

fn multipart_error(e: MultipartError) -> ValidationError {
    invalid("multipart", e.body_text())
}

/// Raw form input before it becomes a service request
#[derive(Debug, Default)]
pub struct PostForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<Upload>,
    pub content_type: Option<String>,
    pub content_file: Option<Upload>,
    pub external_url: Option<String>,
    pub position: Option<usize>,
}

impl PostForm {
    pub async fn read(mut multipart: Multipart) -> Result<Self, ValidationError> {
        let mut form = PostForm::default();

        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "title" => form.title = Some(read_text(field).await?),
                "description" => form.description = Some(read_text(field).await?),
                "content_type" => form.content_type = Some(read_text(field).await?),
                "external_url" => form.external_url = Some(read_text(field).await?),
                "position" => form.position = parse_position(&read_text(field).await?)?,
                "image" => form.image = read_upload(field).await?,
                "content_file" => form.content_file = read_upload(field).await?,
                _ => {}
            }
        }
        Ok(form)
    }

    /// Content as selected on the form; `None` when nothing was supplied
    fn content(&mut self) -> Result<Option<ContentSelector>, ValidationError> {
        let file = self.content_file.take();
        let url = self
            .external_url
            .take()
            .filter(|url| !url.trim().is_empty());

        match self.content_type.as_deref().map(str::trim) {
            Some("file") => Ok(file.map(ContentSelector::File)),
            Some("url") => Ok(Some(ContentSelector::ExternalUrl(url.unwrap_or_default()))),
            Some("") | None => match (file, url) {
                (Some(_), Some(_)) => Err(invalid(
                    "content_type",
                    "send either content_file or external_url, not both",
                )),
                (Some(file), None) => Ok(Some(ContentSelector::File(file))),
                (None, Some(url)) => Ok(Some(ContentSelector::ExternalUrl(url))),
                (None, None) => Ok(None),
            },
            Some(other) => Err(invalid(
                "content_type",
                format!("expected 'file' or 'url', got '{}'", other),
            )),
        }
    }

    pub fn into_new_post(mut self) -> Result<NewPost, ValidationError> {
        let content = self.content()?.ok_or(ValidationError::MissingContent)?;
        Ok(NewPost {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            image: self.image,
            content,
            target_position: self.position,
        })
    }

    /// Edit request for `existing`. Absent image or content keeps the
    /// current one; choosing `file` without a file only works when the post
    /// already has file content.
    pub fn into_post_edit(mut self, existing: &Post) -> Result<PostEdit, ValidationError> {
        let wants_file = self.content_type.as_deref().map(str::trim) == Some("file");
        let content = match self.content()? {
            Some(selector) => ContentChange::Replace(selector),
            None if wants_file && existing.content_file_name().is_none() => {
                return Err(ValidationError::MissingContent)
            }
            None => ContentChange::Keep,
        };

        Ok(PostEdit {
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            image: self.image,
            content,
            target_position: self.position,
        })
    }
}

async fn read_text(field: Field<'_>) -> Result<String, ValidationError> {
    field.text().await.map_err(multipart_error)
}

async fn read_upload(field: Field<'_>) -> Result<Option<Upload>, ValidationError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let bytes = field.bytes().await.map_err(multipart_error)?;

    if file_name.is_empty() && bytes.is_empty() {
        return Ok(None);
    }
    Ok(Some(Upload::new(file_name, bytes.to_vec())))
}

fn parse_position(raw: &str) -> Result<Option<usize>, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| invalid("position", format!("'{}' is not a non-negative integer", raw)))
}
