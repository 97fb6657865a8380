//! Content fetch and image decode lanes feeding the tick thread.
#![forbid(unsafe_code)]

mod image_lane;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Instant;

use corridor_content::{
    ContentError, ContentRequest, GenerativeContentClient, PromptTemplate, pending,
};
use corridor_segment::{Generation, SegmentId, SlotUpdate};
use crossbeam_channel::{Receiver, Sender, unbounded};
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use serde::Deserialize;
use thiserror::Error;

use crate::image_lane::{DecodeJob, Watch};

#[derive(Clone, Debug)]
pub struct FetchJob {
    pub segment: SegmentId,
    pub generation: Generation,
    pub topic: String,
    pub count: usize,
    pub job_id: u64,
}

#[derive(Debug)]
pub struct FetchOut {
    pub segment: SegmentId,
    pub generation: Generation,
    pub topic: String,
    pub job_id: u64,
    pub result: Result<Vec<SlotUpdate>, ContentError>,
    pub t_fetch_ms: u32,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Concurrent content requests. 0 picks a default.
    #[serde(default)]
    pub fetch_workers: usize,
    /// Image decode threads. 0 picks from available parallelism.
    #[serde(default)]
    pub decode_workers: usize,
}

impl RuntimeConfig {
    fn resolved(self) -> (usize, usize) {
        let cores: usize = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        let w_fetch = if self.fetch_workers == 0 {
            3
        } else {
            self.fetch_workers
        };
        let w_decode = if self.decode_workers == 0 {
            (cores / 2).max(1)
        } else {
            self.decode_workers
        };
        (w_fetch, w_decode)
    }
}

#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("failed to build {lane} pool: {source}")]
    Pool {
        lane: &'static str,
        #[source]
        source: ThreadPoolBuildError,
    },
    #[error("failed to start image lane: {0}")]
    Spawn(#[from] std::io::Error),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueCounts {
    pub queued_fetch: usize,
    pub inflight_fetch: usize,
    pub watching_images: usize,
    pub queued_decode: usize,
    pub inflight_decode: usize,
}

impl QueueCounts {
    pub fn is_idle(&self) -> bool {
        *self == QueueCounts::default()
    }
}

fn process_fetch_job(
    job: FetchJob,
    client: &dyn GenerativeContentClient,
    prompts: &PromptTemplate,
    images: &Sender<Watch>,
    tx: &Sender<FetchOut>,
) {
    let FetchJob {
        segment,
        generation,
        topic,
        count,
        job_id,
    } = job;
    let t0 = Instant::now();
    let prompt = prompts.text_prompt(&topic);
    let req = ContentRequest {
        topic: &topic,
        prompt: &prompt,
        count,
    };
    let result = client.request_content(&req).map(|items| {
        items
            .into_iter()
            .take(count)
            .map(|item| {
                let (resolver, image) = pending();
                let _ = images.send(Watch {
                    handle: item.image,
                    resolver,
                });
                SlotUpdate {
                    caption: item.caption,
                    image,
                }
            })
            .collect::<Vec<_>>()
    });
    let t_fetch_ms = t0.elapsed().as_millis().min(u128::from(u32::MAX)) as u32;
    match &result {
        Ok(updates) => log::debug!(
            "fetch {segment} gen {} topic {topic:?}: {} items in {t_fetch_ms}ms",
            generation.0,
            updates.len()
        ),
        Err(e) => log::debug!("fetch {segment} gen {} topic {topic:?} failed: {e}", generation.0),
    }
    let _ = tx.send(FetchOut {
        segment,
        generation,
        topic,
        job_id,
        result,
        t_fetch_ms,
    });
}

pub struct Runtime {
    job_tx: Sender<FetchJob>,
    res_rx: Receiver<FetchOut>,
    _fetch_pool: Arc<ThreadPool>,
    _decode_pool: Arc<ThreadPool>,
    q_fetch: Arc<AtomicUsize>,
    inflight_fetch: Arc<AtomicUsize>,
    watching: Arc<AtomicUsize>,
    q_decode: Arc<AtomicUsize>,
    inflight_decode: Arc<AtomicUsize>,
    client_name: String,
}

impl Runtime {
    pub fn new(
        client: Arc<dyn GenerativeContentClient>,
        prompts: PromptTemplate,
        cfg: RuntimeConfig,
    ) -> Result<Self, RuntimeError> {
        let (job_tx, job_rx) = unbounded::<FetchJob>();
        let (res_tx, res_rx) = unbounded::<FetchOut>();
        let (reg_tx, reg_rx) = unbounded::<Watch>();
        let (decode_tx, decode_rx) = unbounded::<DecodeJob>();

        let (w_fetch, w_decode) = cfg.resolved();
        let prompts = Arc::new(prompts);
        let client_name = client.name().to_string();

        let q_fetch_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_fetch_ctr = Arc::new(AtomicUsize::new(0));
        let watching_ctr = Arc::new(AtomicUsize::new(0));
        let q_decode_ctr = Arc::new(AtomicUsize::new(0));
        let inflight_decode_ctr = Arc::new(AtomicUsize::new(0));

        let fetch_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(w_fetch)
                .thread_name(|i| format!("corridor-fetch-{i}"))
                .build()
                .map_err(|source| RuntimeError::Pool {
                    lane: "fetch",
                    source,
                })?,
        );
        for _ in 0..w_fetch {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            let images = reg_tx.clone();
            let client = Arc::clone(&client);
            let prompts = Arc::clone(&prompts);
            let q_fetch = q_fetch_ctr.clone();
            let inflight_fetch = inflight_fetch_ctr.clone();
            fetch_pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    q_fetch.fetch_sub(1, Ordering::Relaxed);
                    inflight_fetch.fetch_add(1, Ordering::Relaxed);
                    process_fetch_job(job, client.as_ref(), prompts.as_ref(), &images, &tx);
                    inflight_fetch.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }
        drop(reg_tx);

        let decode_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(w_decode)
                .thread_name(|i| format!("corridor-decode-{i}"))
                .build()
                .map_err(|source| RuntimeError::Pool {
                    lane: "decode",
                    source,
                })?,
        );
        for _ in 0..w_decode {
            let rx = decode_rx.clone();
            let q_decode = q_decode_ctr.clone();
            let inflight_decode = inflight_decode_ctr.clone();
            decode_pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    q_decode.fetch_sub(1, Ordering::Relaxed);
                    inflight_decode.fetch_add(1, Ordering::Relaxed);
                    image_lane::process_decode_job(job);
                    inflight_decode.fetch_sub(1, Ordering::Relaxed);
                }
            });
        }

        {
            let watching = watching_ctr.clone();
            let q_decode = q_decode_ctr.clone();
            thread::Builder::new()
                .name("corridor-images".into())
                .spawn(move || image_lane::run(reg_rx, decode_tx, watching, q_decode))?;
        }

        log::info!(
            "runtime: client {client_name}, {w_fetch} fetch worker(s), {w_decode} decode worker(s)"
        );

        Ok(Self {
            job_tx,
            res_rx,
            _fetch_pool: fetch_pool,
            _decode_pool: decode_pool,
            q_fetch: q_fetch_ctr,
            inflight_fetch: inflight_fetch_ctr,
            watching: watching_ctr,
            q_decode: q_decode_ctr,
            inflight_decode: inflight_decode_ctr,
            client_name,
        })
    }

    /// Queues `job` for the fetch lane. Returns false if the lane is gone, in which
    /// case no result will ever be drained for it.
    pub fn submit_fetch(&self, job: FetchJob) -> bool {
        self.q_fetch.fetch_add(1, Ordering::Relaxed);
        if self.job_tx.send(job).is_err() {
            self.q_fetch.fetch_sub(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    pub fn drain_fetch_results(&self) -> Vec<FetchOut> {
        self.res_rx.try_iter().collect()
    }

    pub fn client_name(&self) -> &str {
        &self.client_name
    }

    pub fn queue_debug_counts(&self) -> QueueCounts {
        QueueCounts {
            queued_fetch: self.q_fetch.load(Ordering::Relaxed),
            inflight_fetch: self.inflight_fetch.load(Ordering::Relaxed),
            watching_images: self.watching.load(Ordering::Relaxed),
            queued_decode: self.q_decode.load(Ordering::Relaxed),
            inflight_decode: self.inflight_decode.load(Ordering::Relaxed),
        }
    }
}
