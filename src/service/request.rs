//! Inputs to the post mutation service

/// A file handed over by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Exactly one kind of content per post
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSelector {
    File(Upload),
    ExternalUrl(String),
}

/// Content on edit
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentChange {
    #[default]
    Keep,
    Replace(ContentSelector),
}

/// Add a post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub description: String,
    /// Required; `Option` only so a missing image surfaces as a validation error
    pub image: Option<Upload>,
    pub content: ContentSelector,
    /// Display position; `None` appends
    pub target_position: Option<usize>,
}

impl NewPost {
    /// Files carried by the request, labelled for error messages
    pub fn uploads(&self) -> Vec<(&'static str, &Upload)> {
        let mut uploads = Vec::with_capacity(2);
        if let Some(image) = &self.image {
            uploads.push(("Image", image));
        }
        if let ContentSelector::File(file) = &self.content {
            uploads.push(("Content file", file));
        }
        uploads
    }
}

/// Edit an existing post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostEdit {
    pub title: String,
    pub description: String,
    /// Replacement image; `None` keeps the current one
    pub image: Option<Upload>,
    pub content: ContentChange,
    /// Display position; `None` keeps the current one
    pub target_position: Option<usize>,
}

impl PostEdit {
    /// Replacement files carried by the request
    pub fn uploads(&self) -> Vec<(&'static str, &Upload)> {
        let mut uploads = Vec::with_capacity(2);
        if let Some(image) = &self.image {
            uploads.push(("Image", image));
        }
        if let ContentChange::Replace(ContentSelector::File(file)) = &self.content {
            uploads.push(("Content file", file));
        }
        uploads
    }
}
