use thiserror::Error;

use crate::handle::Pending;

/// Failure of a content request. Recoverable: the caller keeps its last good content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("content api returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("malformed content response: {0}")]
    Malformed(String),

    #[error("content source dropped the request without answering")]
    Abandoned,

    #[error("content source rejected topic {topic:?}")]
    Rejected { topic: String },
}

/// Where an image's pixels live: inline base64 raster data or a fetchable reference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    Base64(String),
    Url(String),
}

pub type ImageHandle = Pending<Result<ImageSource, ContentError>>;

/// One generated caption and its (possibly still unresolved) image.
#[derive(Debug)]
pub struct ContentItem {
    pub caption: String,
    pub image: ImageHandle,
}

impl ContentItem {
    pub fn new(caption: impl Into<String>, image: ImageHandle) -> Self {
        Self {
            caption: caption.into(),
            image,
        }
    }

    pub fn ready(caption: impl Into<String>, image: ImageSource) -> Self {
        Self::new(caption, Pending::ready(Ok(image)))
    }
}

#[derive(Clone, Copy, Debug)]
pub struct ContentRequest<'a> {
    /// Topic as entered by the user.
    pub topic: &'a str,
    /// Text prompt built from the topic.
    pub prompt: &'a str,
    pub count: usize,
}

/// Source of generated decorations. Called from worker threads; may block.
pub trait GenerativeContentClient: Send + Sync {
    fn name(&self) -> &str;

    /// Up to `req.count` items. Image handles may resolve after this returns.
    fn request_content(&self, req: &ContentRequest<'_>) -> Result<Vec<ContentItem>, ContentError>;
}
