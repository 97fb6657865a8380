//! Things that happened to the window, in tick order.

use std::collections::VecDeque;

use corridor_content::ContentError;
use corridor_grid::GridCoord;
use corridor_segment::{Generation, SegmentId, SlotImageError};

#[derive(Clone, Debug, PartialEq)]
pub enum StreamEvent {
    // Structure
    SegmentCreated {
        segment: SegmentId,
        at: GridCoord,
    },
    SegmentRecycled {
        segment: SegmentId,
        from: GridCoord,
        to: GridCoord,
    },

    // Content
    RefreshIssued {
        segment: SegmentId,
        at: GridCoord,
        topic: String,
        generation: Generation,
        job_id: u64,
    },
    RefreshApplied {
        segment: SegmentId,
        topic: String,
        generation: Generation,
        updated: usize,
        short: usize,
        t_fetch_ms: u32,
    },
    RefreshDiscarded {
        segment: SegmentId,
        topic: String,
        generation: Generation,
    },
    FetchFailed {
        segment: SegmentId,
        topic: String,
        error: ContentError,
        retry_at: u64,
    },

    // Slots
    SlotImageInstalled {
        segment: SegmentId,
        slot: usize,
    },
    SlotImageFailed {
        segment: SegmentId,
        slot: usize,
        error: SlotImageError,
    },
    SlotImageDiscarded {
        segment: SegmentId,
        slot: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EventEnvelope {
    pub id: u64,
    pub tick: u64,
    pub kind: StreamEvent,
}

pub struct EventQueue {
    queue: VecDeque<EventEnvelope>,
    now: u64,
    next_id: u64,
}

impl Default for EventQueue {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            now: 0,
            next_id: 1,
        }
    }
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    pub fn emit_now(&mut self, kind: StreamEvent) -> u64 {
        let id = self.alloc_id();
        self.queue.push_back(EventEnvelope {
            id,
            tick: self.now,
            kind,
        });
        id
    }

    pub fn drain(&mut self) -> Vec<EventEnvelope> {
        self.queue.drain(..).collect()
    }

    /// Events emitted from now on carry the next tick.
    pub fn advance_tick(&mut self) {
        self.now = self.now.wrapping_add(1);
    }
}
