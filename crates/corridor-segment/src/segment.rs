use corridor_content::ContentError;
use corridor_grid::GridCoord;

use crate::layout::{Anchor, Attached, SlotLayout};
use crate::slot::{ContentSlot, PendingSlotImage, SlotPoll};

/// Stable handle of a segment inside whatever owns it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub u32);

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "seg{}", self.0)
    }
}

/// Request counter of a segment. Advances on every refresh and every recycle so that
/// fetch results issued for an older generation can be recognised and dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(pub u64);

impl Generation {
    #[inline]
    pub const fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

/// Issued by `Segment::refresh`; whoever fetches must hand the generation back.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshTicket {
    pub generation: Generation,
    pub topic: String,
    pub count: usize,
}

/// A caption with its image still resolving, bound for one slot.
#[derive(Debug)]
pub struct SlotUpdate {
    pub caption: String,
    pub image: PendingSlotImage,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchApply {
    /// Issued for an older generation; nothing changed.
    Stale,
    /// `updated` slots received new captions; `short` slots kept their old content.
    Applied { updated: usize, short: usize },
    /// Content untouched; another attempt is due at `retry_at`.
    Failed { error: ContentError, retry_at: u64 },
}

#[derive(Debug)]
pub struct Segment {
    position: GridCoord,
    topic: String,
    generation: Generation,
    // Tags slot images; moves only when the segment is recycled, so issuing a
    // refresh never drops images of content that is already showing.
    epoch: Generation,
    force: bool,
    retry_at: Option<u64>,
    in_flight: bool,
    slots: Vec<ContentSlot>,
}

impl Segment {
    pub fn new(position: GridCoord, layout: &SlotLayout) -> Self {
        let slots = layout
            .placements()
            .iter()
            .map(|p| ContentSlot::new(p, layout.picture_size, layout.caption_line_len))
            .collect();
        Self {
            position,
            topic: String::new(),
            generation: Generation::default(),
            epoch: Generation::default(),
            force: false,
            retry_at: None,
            in_flight: false,
            slots,
        }
    }

    #[inline]
    pub fn position(&self) -> GridCoord {
        self.position
    }

    /// Moves the segment; callers keep any coordinate index in sync.
    pub fn set_position(&mut self, position: GridCoord) {
        self.position = position;
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    #[inline]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn slots(&self) -> &[ContentSlot] {
        &self.slots
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_forced(&self) -> bool {
        self.force
    }

    pub fn retry_at(&self) -> Option<u64> {
        self.retry_at
    }

    /// A fetch for the current generation has been issued and not yet applied.
    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn needs_refresh(&self, desired: &str, tick: u64) -> bool {
        desired != self.topic || self.force || self.retry_at.is_some_and(|t| tick >= t)
    }

    /// Adopts `desired` and starts a new generation when the topic changed, a refresh
    /// was forced, or a retry is due. Otherwise returns `None`.
    pub fn refresh(&mut self, desired: &str, tick: u64) -> Option<RefreshTicket> {
        if !self.needs_refresh(desired, tick) {
            return None;
        }
        self.topic.clear();
        self.topic.push_str(desired);
        self.generation = self.generation.next();
        self.force = false;
        self.retry_at = None;
        self.in_flight = true;
        Some(RefreshTicket {
            generation: self.generation,
            topic: self.topic.clone(),
            count: self.slots.len(),
        })
    }

    pub fn request_force(&mut self) {
        self.force = true;
    }

    /// Invalidates everything in flight and forces the next refresh, since the segment
    /// now stands somewhere else.
    pub fn mark_recycled(&mut self) {
        self.generation = self.generation.next();
        self.epoch = self.epoch.next();
        self.force = true;
        self.retry_at = None;
        self.in_flight = false;
    }

    pub fn apply_fetch(
        &mut self,
        generation: Generation,
        result: Result<Vec<SlotUpdate>, ContentError>,
        tick: u64,
        retry_backoff: u64,
    ) -> FetchApply {
        if generation != self.generation {
            return FetchApply::Stale;
        }
        self.in_flight = false;
        match result {
            Err(error) => {
                let retry_at = tick.saturating_add(retry_backoff);
                self.retry_at = Some(retry_at);
                FetchApply::Failed { error, retry_at }
            }
            Ok(updates) => {
                let mut updated = 0;
                for (slot, update) in self.slots.iter_mut().zip(updates) {
                    slot.update(update.caption, update.image, self.epoch);
                    updated += 1;
                }
                FetchApply::Applied {
                    updated,
                    short: self.slots.len() - updated,
                }
            }
        }
    }

    /// Polls every slot once. Returns the slots whose state settled this call.
    pub fn poll_images(&mut self) -> Vec<(usize, SlotPoll)> {
        let current = self.epoch;
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| match slot.poll(current) {
                SlotPoll::Idle | SlotPoll::Pending => None,
                settled => Some((i, settled)),
            })
            .collect()
    }

    pub fn view(&self) -> SegmentView {
        SegmentView {
            position: self.position,
            topic: self.topic.clone(),
            generation: self.generation,
            slots: self
                .slots
                .iter()
                .map(|s| SlotView {
                    picture: s.picture().anchor(),
                    caption_anchor: s.caption().anchor(),
                    caption_lines: s.caption().lines(),
                    texture: s.image().map(|i| i.texture_uri()),
                })
                .collect(),
        }
    }
}

/// Render-facing snapshot of one segment.
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentView {
    pub position: GridCoord,
    pub topic: String,
    pub generation: Generation,
    pub slots: Vec<SlotView>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SlotView {
    pub picture: Anchor,
    pub caption_anchor: Anchor,
    pub caption_lines: Vec<String>,
    pub texture: Option<String>,
}

impl SegmentView {
    pub fn captioned(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| !s.caption_lines.is_empty())
            .count()
    }

    pub fn textured(&self) -> usize {
        self.slots.iter().filter(|s| s.texture.is_some()).count()
    }
}
