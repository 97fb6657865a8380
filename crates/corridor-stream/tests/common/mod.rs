#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use corridor_content::{
    ContentError, ContentItem, ContentRequest, GenerativeContentClient, OfflineClient,
    PromptTemplate,
};
use corridor_grid::{GridCoord, SegmentLength};
use corridor_runtime::{Runtime, RuntimeConfig};
use corridor_segment::{CorridorDims, SlotLayout};
use corridor_stream::WindowController;

/// Offline content that records every call and can be switched into an outage.
pub struct ScriptedClient {
    inner: OfflineClient,
    calls: Mutex<Vec<String>>,
    failing: AtomicBool,
}

impl ScriptedClient {
    pub fn new(inner: OfflineClient) -> Arc<Self> {
        Arc::new(Self {
            inner,
            calls: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        })
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl GenerativeContentClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn request_content(&self, req: &ContentRequest<'_>) -> Result<Vec<ContentItem>, ContentError> {
        self.calls.lock().unwrap().push(req.topic.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(ContentError::Transport("scripted outage".into()));
        }
        self.inner.request_content(req)
    }
}

pub const SLOTS: usize = 4;

pub fn controller(
    client: Arc<dyn GenerativeContentClient>,
    length: f64,
    retry_backoff: u64,
) -> WindowController {
    let dims = CorridorDims {
        length: length as f32,
        lights: (SLOTS / 2) as u32,
        ..CorridorDims::default()
    };
    let runtime = Runtime::new(
        client,
        PromptTemplate::default(),
        RuntimeConfig {
            fetch_workers: 6,
            decode_workers: 2,
        },
    )
    .unwrap();
    WindowController::new(
        SegmentLength::new(length).unwrap(),
        SlotLayout::corridor(&dims),
        runtime,
        retry_backoff,
    )
}

/// Ticks at a fixed position until `done` holds; panics after ~4s.
pub fn pump_until(
    ctrl: &mut WindowController,
    position: f64,
    topic: &str,
    mut done: impl FnMut(&WindowController) -> bool,
) {
    for _ in 0..2000 {
        ctrl.advance(position, topic).expect("structural error while pumping");
        if done(ctrl) {
            return;
        }
        thread::sleep(Duration::from_millis(2));
    }
    panic!("condition not reached; stats {:?}", ctrl.stats());
}

pub fn captions(ctrl: &WindowController, at: GridCoord) -> Vec<String> {
    ctrl.registry()
        .lookup(at)
        .expect("segment at coordinate")
        .slots()
        .iter()
        .map(|s| s.caption().text().to_string())
        .collect()
}

pub fn textured(ctrl: &WindowController, at: GridCoord) -> usize {
    ctrl.registry()
        .lookup(at)
        .expect("segment at coordinate")
        .slots()
        .iter()
        .filter(|s| s.image().is_some())
        .count()
}

pub fn expected_captions(topic: &str) -> Vec<String> {
    (0..SLOTS)
        .map(|i| OfflineClient::caption_for(topic, i))
        .collect()
}
