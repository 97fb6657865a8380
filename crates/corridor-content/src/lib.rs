//! Boundary to the generative content source: captions plus images that resolve later.
#![forbid(unsafe_code)]

mod client;
mod handle;
#[cfg(feature = "live")]
mod live;
mod offline;
mod prompt;

pub use client::{
    ContentError, ContentItem, ContentRequest, GenerativeContentClient, ImageHandle, ImageSource,
};
pub use handle::{Pending, Resolver, Take, pending};
#[cfg(feature = "live")]
pub use live::{LiveOptions, OpenAiClient};
pub use offline::OfflineClient;
pub use prompt::{PromptTemplate, TOPIC_PLACEHOLDER, clean_phrase};
