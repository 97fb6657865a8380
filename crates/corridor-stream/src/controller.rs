use corridor_grid::{GridCoord, SegmentLength, Window};
use corridor_runtime::{FetchJob, FetchOut, Runtime};
use corridor_segment::{FetchApply, SegmentId, SegmentView, SlotLayout, SlotPoll};

use crate::error::StructuralError;
use crate::event::{EventEnvelope, EventQueue, StreamEvent};
use crate::registry::SegmentRegistry;

const WINDOW_SIZE: usize = 3;

/// Supplies the viewer's position along the streaming axis, sampled once per tick.
pub trait ViewerPositionSource {
    fn position(&mut self) -> f64;
}

impl<F: FnMut() -> f64> ViewerPositionSource for F {
    fn position(&mut self) -> f64 {
        self()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub ticks: u64,
    pub created: u64,
    pub recycled: u64,
    pub refreshes_issued: u64,
    pub refreshes_applied: u64,
    pub refreshes_discarded: u64,
    pub fetch_failures: u64,
    pub images_installed: u64,
    pub images_failed: u64,
    pub images_discarded: u64,
}

/// What one `advance` did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub window: Window,
    pub created: usize,
    pub recycled: usize,
    pub refreshes_issued: usize,
    pub fetches_settled: usize,
}

impl TickReport {
    fn new(tick: u64, window: Window) -> Self {
        Self {
            tick,
            window,
            created: 0,
            recycled: 0,
            refreshes_issued: 0,
            fetches_settled: 0,
        }
    }

    pub fn structural_change(&self) -> bool {
        self.created > 0 || self.recycled > 0
    }
}

/// Keeps live segments on exactly the three cells around the viewer and their
/// content in step with the desired topic. Owns all segment state; only `advance`
/// mutates it.
pub struct WindowController {
    length: SegmentLength,
    layout: SlotLayout,
    registry: SegmentRegistry,
    runtime: Runtime,
    retry_backoff: u64,
    tick: u64,
    next_job_id: u64,
    // Submitted fetches whose results have not been drained yet, stale ones included.
    outstanding_fetches: usize,
    halted: Option<StructuralError>,
    events: EventQueue,
    stats: StreamStats,
}

impl WindowController {
    pub fn new(
        length: SegmentLength,
        layout: SlotLayout,
        runtime: Runtime,
        retry_backoff_ticks: u64,
    ) -> Self {
        Self {
            length,
            layout,
            registry: SegmentRegistry::new(),
            runtime,
            retry_backoff: retry_backoff_ticks,
            tick: 0,
            next_job_id: 1,
            outstanding_fetches: 0,
            halted: None,
            events: EventQueue::new(),
            stats: StreamStats::default(),
        }
    }

    /// One tick: reconcile the window structure, apply finished fetches, poll slot
    /// images, then issue refreshes for stale segments. Never blocks on content.
    ///
    /// A structural error halts the controller; every later call returns `Halted`.
    pub fn advance(
        &mut self,
        position: f64,
        desired_topic: &str,
    ) -> Result<TickReport, StructuralError> {
        if self.halted.is_some() {
            return Err(StructuralError::Halted);
        }
        match self.step(position, desired_topic) {
            Ok(report) => Ok(report),
            Err(e) => {
                log::error!("[tick {}] streaming halted: {e}", self.tick);
                self.halted = Some(e.clone());
                Err(e)
            }
        }
    }

    /// Marks every live segment for re-fetch on the next tick, even with an
    /// unchanged topic.
    pub fn force_refresh(&mut self) {
        for id in self.registry.ids() {
            if let Some(seg) = self.registry.get_mut(id) {
                seg.request_force();
            }
        }
    }

    fn step(&mut self, position: f64, desired: &str) -> Result<TickReport, StructuralError> {
        self.tick += 1;
        self.events.advance_tick();
        self.stats.ticks += 1;
        let window =
            Window::around(position, self.length).ok_or(StructuralError::OffGrid { position })?;
        let mut report = TickReport::new(self.tick, window);

        self.reconcile(window, &mut report)?;
        self.verify(window)?;
        self.apply_fetch_results(&mut report);
        self.poll_images();
        self.issue_refreshes(window, desired, &mut report);
        Ok(report)
    }

    fn reconcile(&mut self, window: Window, report: &mut TickReport) -> Result<(), StructuralError> {
        if self.registry.len() < WINDOW_SIZE {
            for at in window.coords() {
                if self.registry.lookup_id(at).is_none() {
                    let segment = self.registry.spawn(at, &self.layout)?;
                    self.events
                        .emit_now(StreamEvent::SegmentCreated { segment, at });
                    self.stats.created += 1;
                    report.created += 1;
                }
            }
            return Ok(());
        }

        let present = window.coords().map(|c| self.registry.lookup_id(c).is_some());
        match present {
            [true, true, true] => Ok(()),
            [false, true, true] => self.recycle(window.upper.offset(1), window.lower, report),
            [true, true, false] => self.recycle(window.lower.offset(-1), window.upper, report),
            _ => Err(StructuralError::WindowJump {
                window,
                present: present.iter().filter(|p| **p).count(),
            }),
        }
    }

    fn recycle(
        &mut self,
        from: GridCoord,
        to: GridCoord,
        report: &mut TickReport,
    ) -> Result<(), StructuralError> {
        let segment = self
            .registry
            .lookup_id(from)
            .ok_or(StructuralError::Missing(from))?;
        self.registry.rekey(segment, to)?;
        self.registry
            .get_mut(segment)
            .ok_or(StructuralError::UnknownSegment(segment))?
            .mark_recycled();
        self.events
            .emit_now(StreamEvent::SegmentRecycled { segment, from, to });
        self.stats.recycled += 1;
        report.recycled += 1;
        Ok(())
    }

    fn verify(&self, window: Window) -> Result<(), StructuralError> {
        let found = self.registry.len();
        if found != WINDOW_SIZE {
            return Err(StructuralError::Count {
                expected: WINDOW_SIZE,
                found,
            });
        }
        match window
            .coords()
            .into_iter()
            .find(|c| self.registry.lookup_id(*c).is_none())
        {
            Some(missing) => Err(StructuralError::Missing(missing)),
            None => Ok(()),
        }
    }

    fn apply_fetch_results(&mut self, report: &mut TickReport) {
        for out in self.runtime.drain_fetch_results() {
            self.outstanding_fetches = self.outstanding_fetches.saturating_sub(1);
            let FetchOut {
                segment,
                generation,
                topic,
                result,
                t_fetch_ms,
                ..
            } = out;
            let Some(seg) = self.registry.get_mut(segment) else {
                log::warn!("fetch result for unknown segment {segment}");
                continue;
            };
            report.fetches_settled += 1;
            match seg.apply_fetch(generation, result, self.tick, self.retry_backoff) {
                FetchApply::Stale => {
                    log::debug!(
                        "{segment}: dropped {topic:?} result for gen {}, now at gen {}",
                        generation.0,
                        seg.generation().0
                    );
                    self.stats.refreshes_discarded += 1;
                    self.events.emit_now(StreamEvent::RefreshDiscarded {
                        segment,
                        topic,
                        generation,
                    });
                }
                FetchApply::Applied { updated, short } => {
                    if short > 0 {
                        log::warn!(
                            "{segment}: content source returned {updated} of {} items for {topic:?}",
                            updated + short
                        );
                    }
                    self.stats.refreshes_applied += 1;
                    self.events.emit_now(StreamEvent::RefreshApplied {
                        segment,
                        topic,
                        generation,
                        updated,
                        short,
                        t_fetch_ms,
                    });
                }
                FetchApply::Failed { error, retry_at } => {
                    log::warn!(
                        "{segment} at {}: fetch for {topic:?} failed ({error}); retrying at tick {retry_at}",
                        seg.position()
                    );
                    self.stats.fetch_failures += 1;
                    self.events.emit_now(StreamEvent::FetchFailed {
                        segment,
                        topic,
                        error,
                        retry_at,
                    });
                }
            }
        }
    }

    fn poll_images(&mut self) {
        for segment in self.registry.ids() {
            let Some(seg) = self.registry.get_mut(segment) else {
                continue;
            };
            for (slot, outcome) in seg.poll_images() {
                let kind = match outcome {
                    SlotPoll::Installed => {
                        self.stats.images_installed += 1;
                        StreamEvent::SlotImageInstalled { segment, slot }
                    }
                    SlotPoll::Failed(error) => {
                        log::warn!("{segment} slot {slot}: image failed ({error}); keeping previous");
                        self.stats.images_failed += 1;
                        StreamEvent::SlotImageFailed {
                            segment,
                            slot,
                            error,
                        }
                    }
                    SlotPoll::Discarded => {
                        self.stats.images_discarded += 1;
                        StreamEvent::SlotImageDiscarded { segment, slot }
                    }
                    SlotPoll::Idle | SlotPoll::Pending => continue,
                };
                self.events.emit_now(kind);
            }
        }
    }

    fn issue_refreshes(&mut self, window: Window, desired: &str, report: &mut TickReport) {
        if desired.is_empty() {
            return;
        }
        for at in window.coords() {
            let Some(segment) = self.registry.lookup_id(at) else {
                continue;
            };
            let Some(seg) = self.registry.get_mut(segment) else {
                continue;
            };
            let Some(ticket) = seg.refresh(desired, self.tick) else {
                continue;
            };
            let job_id = self.next_job_id;
            self.next_job_id += 1;
            let submitted = self.runtime.submit_fetch(FetchJob {
                segment,
                generation: ticket.generation,
                topic: ticket.topic.clone(),
                count: ticket.count,
                job_id,
            });
            if submitted {
                self.outstanding_fetches += 1;
            } else {
                log::error!("{segment}: fetch lane is gone; job {job_id} dropped");
            }
            self.events.emit_now(StreamEvent::RefreshIssued {
                segment,
                at,
                topic: ticket.topic,
                generation: ticket.generation,
                job_id,
            });
            self.stats.refreshes_issued += 1;
            report.refreshes_issued += 1;
        }
    }

    pub fn drain_events(&mut self) -> Vec<EventEnvelope> {
        self.events.drain()
    }

    pub fn registry(&self) -> &SegmentRegistry {
        &self.registry
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn length(&self) -> SegmentLength {
        self.length
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// The error that halted the controller, if any.
    pub fn halt_reason(&self) -> Option<&StructuralError> {
        self.halted.as_ref()
    }

    /// Fetches submitted to the runtime whose results have not been applied or
    /// discarded yet.
    pub fn outstanding_fetches(&self) -> usize {
        self.outstanding_fetches
    }

    /// Nothing submitted is still out and no live segment waits on a slot image.
    pub fn is_settled(&self) -> bool {
        self.outstanding_fetches == 0
            && self
                .registry
                .iter()
                .all(|(_, s)| !s.in_flight() && s.slots().iter().all(|slot| !slot.has_pending()))
    }

    pub fn segment_id_at(&self, at: GridCoord) -> Option<SegmentId> {
        self.registry.lookup_id(at)
    }

    /// Live segments in ascending position order.
    pub fn views(&self) -> Vec<SegmentView> {
        let mut views: Vec<SegmentView> = self.registry.iter().map(|(_, s)| s.view()).collect();
        views.sort_by_key(|v| v.position);
        views
    }
}
