use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::Duration;

use base64::Engine as _;
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::client::{
    ContentError, ContentItem, ContentRequest, GenerativeContentClient, ImageHandle, ImageSource,
};
use crate::handle::{Pending, pending};
use crate::prompt::clean_phrase;

/// Deterministic stand-in for the hosted generator.
///
/// Captions are derived from the topic and item index; images are small
/// solid-colour PNG swatches (colour hashed from the caption) delivered as base64.
#[derive(Clone, Debug)]
pub struct OfflineClient {
    text_delay: Duration,
    image_delay: Duration,
    topic_delays: HashMap<String, Duration>,
    failing_topics: HashSet<String>,
    swatch_px: u32,
    image_workers: usize,
    // Built on first delayed image; shared by clones.
    image_pool: Arc<OnceLock<Result<ThreadPool, String>>>,
}

impl Default for OfflineClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OfflineClient {
    pub fn new() -> Self {
        Self {
            text_delay: Duration::ZERO,
            image_delay: Duration::ZERO,
            topic_delays: HashMap::new(),
            failing_topics: HashSet::new(),
            swatch_px: 8,
            image_workers: 4,
            image_pool: Arc::new(OnceLock::new()),
        }
    }

    pub fn with_text_delay(mut self, delay: Duration) -> Self {
        self.text_delay = delay;
        self
    }

    pub fn with_image_delay(mut self, delay: Duration) -> Self {
        self.image_delay = delay;
        self
    }

    /// Overrides the text delay for one topic.
    pub fn with_topic_delay(mut self, topic: impl Into<String>, delay: Duration) -> Self {
        self.topic_delays.insert(topic.into(), delay);
        self
    }

    /// Requests for `topic` fail with [`ContentError::Rejected`].
    pub fn failing_topic(mut self, topic: impl Into<String>) -> Self {
        self.failing_topics.insert(topic.into());
        self
    }

    /// Threads that serve delayed images. Ignored once the first delayed image was issued.
    pub fn with_image_workers(mut self, n: usize) -> Self {
        self.image_workers = n.max(1);
        self
    }

    pub fn with_swatch_px(mut self, px: u32) -> Self {
        self.swatch_px = px.max(1);
        self
    }

    /// Caption produced for item `index` of `topic`.
    pub fn caption_for(topic: &str, index: usize) -> String {
        clean_phrase(&format!("{topic} view {}", index + 1))
    }

    fn image_for(&self, caption: &str) -> ImageHandle {
        let encoded = encode_swatch(caption, self.swatch_px);
        if self.image_delay.is_zero() {
            return Pending::ready(encoded);
        }
        let pool = match self.image_pool() {
            Ok(pool) => pool,
            Err(e) => return Pending::ready(Err(e)),
        };
        let (resolver, handle) = pending();
        let delay = self.image_delay;
        pool.spawn(move || {
            thread::sleep(delay);
            let _ = resolver.resolve(encoded);
        });
        handle
    }

    fn image_pool(&self) -> Result<&ThreadPool, ContentError> {
        let workers = self.image_workers;
        self.image_pool
            .get_or_init(|| {
                ThreadPoolBuilder::new()
                    .num_threads(workers)
                    .thread_name(|i| format!("corridor-offline-images-{i}"))
                    .build()
                    .map_err(|e| e.to_string())
            })
            .as_ref()
            .map_err(|e| ContentError::Transport(format!("image pool: {e}")))
    }
}

impl GenerativeContentClient for OfflineClient {
    fn name(&self) -> &str {
        "offline"
    }

    fn request_content(&self, req: &ContentRequest<'_>) -> Result<Vec<ContentItem>, ContentError> {
        let delay = self
            .topic_delays
            .get(req.topic)
            .copied()
            .unwrap_or(self.text_delay);
        if !delay.is_zero() {
            thread::sleep(delay);
        }
        if self.failing_topics.contains(req.topic) {
            return Err(ContentError::Rejected {
                topic: req.topic.to_string(),
            });
        }
        log::debug!(
            "offline content: {} item(s) for {:?}",
            req.count,
            req.topic
        );
        Ok((0..req.count)
            .map(|i| {
                let caption = Self::caption_for(req.topic, i);
                let image = self.image_for(&caption);
                ContentItem::new(caption, image)
            })
            .collect())
    }
}

fn encode_swatch(caption: &str, px: u32) -> Result<ImageSource, ContentError> {
    let h = fnv1a(caption.as_bytes());
    let rgba = image::Rgba([(h >> 16) as u8, (h >> 8) as u8, h as u8, 255]);
    let img = image::RgbaImage::from_pixel(px, px, rgba);
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .map_err(|e| ContentError::Malformed(e.to_string()))?;
    Ok(ImageSource::Base64(
        base64::engine::general_purpose::STANDARD.encode(buf.into_inner()),
    ))
}

fn fnv1a(bytes: &[u8]) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for b in bytes {
        h ^= u32::from(*b);
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}
