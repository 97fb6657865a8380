use corridor_stream::StreamEvent;

use super::Driver;

impl Driver {
    pub(super) fn log_event(tick: u64, ev: &StreamEvent) {
        use StreamEvent as E;
        match ev {
            E::SegmentCreated { segment, at } => {
                log::info!(target: "events", "[tick {}] SegmentCreated {} at {}", tick, segment, at);
            }
            E::SegmentRecycled { segment, from, to } => {
                log::info!(
                    target: "events",
                    "[tick {}] SegmentRecycled {} {} -> {}",
                    tick,
                    segment,
                    from,
                    to
                );
            }
            E::RefreshIssued {
                segment,
                at,
                topic,
                generation,
                job_id,
            } => {
                log::info!(
                    target: "events",
                    "[tick {}] RefreshIssued {} at {} topic={:?} gen={} job={}",
                    tick,
                    segment,
                    at,
                    topic,
                    generation.0,
                    job_id
                );
            }
            E::RefreshApplied {
                segment,
                topic,
                generation,
                updated,
                short,
                t_fetch_ms,
            } => {
                log::info!(
                    target: "events",
                    "[tick {}] RefreshApplied {} topic={:?} gen={} slots={} short={} fetch={}ms",
                    tick,
                    segment,
                    topic,
                    generation.0,
                    updated,
                    short,
                    t_fetch_ms
                );
            }
            E::RefreshDiscarded {
                segment,
                topic,
                generation,
            } => {
                log::info!(
                    target: "events",
                    "[tick {}] RefreshDiscarded {} topic={:?} gen={}",
                    tick,
                    segment,
                    topic,
                    generation.0
                );
            }
            E::FetchFailed {
                segment,
                topic,
                error,
                retry_at,
            } => {
                log::info!(
                    target: "events",
                    "[tick {}] FetchFailed {} topic={:?} retry_at={} err={}",
                    tick,
                    segment,
                    topic,
                    retry_at,
                    error
                );
            }
            E::SlotImageInstalled { segment, slot } => {
                log::debug!(target: "events", "[tick {}] SlotImageInstalled {} slot={}", tick, segment, slot);
            }
            E::SlotImageFailed {
                segment,
                slot,
                error,
            } => {
                log::info!(
                    target: "events",
                    "[tick {}] SlotImageFailed {} slot={} err={}",
                    tick,
                    segment,
                    slot,
                    error
                );
            }
            E::SlotImageDiscarded { segment, slot } => {
                log::debug!(target: "events", "[tick {}] SlotImageDiscarded {} slot={}", tick, segment, slot);
            }
        }
    }
}
