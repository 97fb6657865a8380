//! Waits on many client image handles at once and forwards each resolved source to decode.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use corridor_content::{ContentError, ImageHandle, ImageSource, Resolver};
use corridor_segment::{SlotImage, SlotImageError};
use crossbeam_channel::{Receiver, Select, Sender};

pub(crate) type SlotResolver = Resolver<Result<SlotImage, SlotImageError>>;

/// A client image handle and the slot-side resolver it feeds.
pub(crate) struct Watch {
    pub handle: ImageHandle,
    pub resolver: SlotResolver,
}

pub(crate) struct DecodeJob {
    pub source: Result<ImageSource, ContentError>,
    pub resolver: SlotResolver,
}

enum Wake {
    Registered(Watch),
    RegistrationClosed,
    Resolved(usize, Result<ImageSource, ContentError>),
}

pub(crate) fn run(
    reg_rx: Receiver<Watch>,
    decode_tx: Sender<DecodeJob>,
    watching_ctr: Arc<AtomicUsize>,
    q_decode: Arc<AtomicUsize>,
) {
    let mut watching: Vec<Watch> = Vec::new();
    let mut open = true;
    loop {
        if !open && watching.is_empty() {
            break;
        }
        let base = usize::from(open);
        let wake = {
            let mut sel = Select::new();
            if open {
                sel.recv(&reg_rx);
            }
            for w in &watching {
                sel.recv(w.handle.receiver());
            }
            let op = sel.select();
            let idx = op.index();
            if open && idx == 0 {
                match op.recv(&reg_rx) {
                    Ok(w) => Wake::Registered(w),
                    Err(_) => Wake::RegistrationClosed,
                }
            } else {
                let slot = idx - base;
                let got = op.recv(watching[slot].handle.receiver());
                Wake::Resolved(slot, got.unwrap_or(Err(ContentError::Abandoned)))
            }
        };
        match wake {
            Wake::Registered(w) => {
                watching.push(w);
                watching_ctr.fetch_add(1, Ordering::Relaxed);
            }
            Wake::RegistrationClosed => open = false,
            Wake::Resolved(slot, source) => {
                let w = watching.swap_remove(slot);
                watching_ctr.fetch_sub(1, Ordering::Relaxed);
                q_decode.fetch_add(1, Ordering::Relaxed);
                let job = DecodeJob {
                    source,
                    resolver: w.resolver,
                };
                if decode_tx.send(job).is_err() {
                    q_decode.fetch_sub(1, Ordering::Relaxed);
                }
            }
        }
    }
    log::debug!("image lane stopped");
}

pub(crate) fn process_decode_job(job: DecodeJob) {
    let DecodeJob { source, resolver } = job;
    let decoded = source
        .map_err(SlotImageError::from)
        .and_then(SlotImage::decode);
    if let Err(e) = &decoded {
        log::debug!("image dropped: {e}");
    }
    let _ = resolver.resolve(decoded);
}
