//! Fixed-cadence headless loop around the window controller.

mod logging;

use std::collections::VecDeque;
use std::fmt::Write as _;
use std::thread;
use std::time::{Duration, Instant};

use corridor_stream::{StructuralError, TickReport, ViewerPositionSource, WindowController};

use crate::config::TopicSwitch;

pub struct Driver {
    controller: WindowController,
    viewer: Box<dyn ViewerPositionSource>,
    topic: String,
    switches: VecDeque<TopicSwitch>,
    frame: Duration,
    last_position: f64,
}

impl Driver {
    pub fn new(
        controller: WindowController,
        viewer: impl ViewerPositionSource + 'static,
        topic: String,
        mut switches: Vec<TopicSwitch>,
        fps: u32,
    ) -> Self {
        switches.sort_by_key(|s| s.tick);
        let frame = if fps == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(1.0 / f64::from(fps))
        };
        Self {
            controller,
            viewer: Box::new(viewer),
            topic,
            switches: switches.into(),
            frame,
            last_position: 0.0,
        }
    }

    pub fn controller(&self) -> &WindowController {
        &self.controller
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Applies due topic switches, samples the viewer and advances the window once.
    pub fn step(&mut self) -> Result<TickReport, StructuralError> {
        let tick = self.controller.tick() + 1;
        while self.switches.front().is_some_and(|s| s.tick <= tick) {
            if let Some(switch) = self.switches.pop_front() {
                log::info!("[tick {tick}] topic {:?} -> {:?}", self.topic, switch.topic);
                self.topic = switch.topic;
            }
        }
        let position = self.viewer.position();
        self.last_position = position;
        let report = self.controller.advance(position, &self.topic);
        self.flush_events();
        report
    }

    pub fn run(&mut self, ticks: u64) -> Result<(), StructuralError> {
        for _ in 0..ticks {
            let t0 = Instant::now();
            let report = self.step()?;
            if report.structural_change() {
                let q = self.controller.runtime().queue_debug_counts();
                log::debug!(
                    "[tick {}] window {}..{} fetch q={} inflight={} images={}",
                    report.tick,
                    report.window.lower,
                    report.window.upper,
                    q.queued_fetch,
                    q.inflight_fetch,
                    q.watching_images
                );
            }
            if let Some(rest) = self.frame.checked_sub(t0.elapsed()) {
                thread::sleep(rest);
            }
        }
        Ok(())
    }

    /// Keeps ticking in place until outstanding content has landed.
    /// Returns false if `timeout` passed first.
    pub fn settle(&mut self, timeout: Duration) -> Result<bool, StructuralError> {
        let deadline = Instant::now() + timeout;
        let pause = self.frame.max(Duration::from_millis(5));
        loop {
            self.controller.advance(self.last_position, &self.topic)?;
            self.flush_events();
            if self.controller.is_settled() {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                return Ok(false);
            }
            thread::sleep(pause);
        }
    }

    /// Runs `ticks` ticks, then settles. The summary stays available whichever step fails.
    pub fn run_and_settle(&mut self, ticks: u64, timeout: Duration) -> Result<(), StructuralError> {
        self.run(ticks)?;
        if !self.settle(timeout)? {
            log::warn!("content still in flight at exit");
        }
        Ok(())
    }

    fn flush_events(&mut self) {
        for env in self.controller.drain_events() {
            Self::log_event(env.tick, &env.kind);
        }
    }

    pub fn summary(&self) -> String {
        let c = &self.controller;
        let s = c.stats();
        let len = c.length();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "corridor: {} ticks, viewer at {:.2}, topic {:?}, content from {}",
            c.tick(),
            self.last_position,
            self.topic(),
            c.runtime().client_name()
        );
        for view in c.views() {
            let _ = writeln!(
                out,
                "  segment {} (z={:.1}) topic {:?} gen {}: {}/{} captions, {}/{} images",
                view.position,
                view.position.origin(len),
                view.topic,
                view.generation.0,
                view.captioned(),
                view.slots.len(),
                view.textured(),
                view.slots.len()
            );
            for (i, slot) in view.slots.iter().enumerate() {
                if slot.caption_lines.is_empty() {
                    continue;
                }
                let _ = writeln!(
                    out,
                    "    [{i:2}] {}{}",
                    slot.caption_lines.join(" / "),
                    if slot.texture.is_some() { "" } else { " (no image)" }
                );
            }
        }
        let _ = write!(
            out,
            "stats: created {} recycled {}; refreshes {} issued, {} applied, {} discarded, {} failed; images {} installed, {} failed, {} discarded",
            s.created,
            s.recycled,
            s.refreshes_issued,
            s.refreshes_applied,
            s.refreshes_discarded,
            s.fetch_failures,
            s.images_installed,
            s.images_failed,
            s.images_discarded
        );
        out
    }
}
