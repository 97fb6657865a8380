use corridor_content::{Pending, Take};

use crate::slot_image::{SlotImage, SlotImageError};
use crate::layout::{Anchor, Attached, SlotPlacement};
use crate::segment::Generation;

pub type PendingSlotImage = Pending<Result<SlotImage, SlotImageError>>;

#[derive(Clone, Debug)]
pub struct PictureFrame {
    anchor: Anchor,
    pub size: f32,
    image: Option<SlotImage>,
}

impl PictureFrame {
    pub fn new(anchor: Anchor, size: f32) -> Self {
        Self {
            anchor,
            size,
            image: None,
        }
    }

    pub fn image(&self) -> Option<&SlotImage> {
        self.image.as_ref()
    }

    /// Returns the image it replaced.
    fn install(&mut self, image: SlotImage) -> Option<SlotImage> {
        self.image.replace(image)
    }
}

impl Attached for PictureFrame {
    fn anchor(&self) -> Anchor {
        self.anchor
    }
}

#[derive(Clone, Debug)]
pub struct CaptionPanel {
    anchor: Anchor,
    text: String,
    line_len: usize,
}

impl CaptionPanel {
    pub fn new(anchor: Anchor, line_len: usize) -> Self {
        Self {
            anchor,
            text: String::new(),
            line_len: line_len.max(1),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
    }

    /// Two fixed-width lines plus whatever remains. Empty lines are dropped.
    pub fn lines(&self) -> Vec<String> {
        let chars: Vec<char> = self.text.chars().collect();
        let n = self.line_len;
        let first = chars.len().min(n);
        let second = chars.len().min(2 * n);
        [&chars[..first], &chars[first..second], &chars[second..]]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(|part| part.iter().collect::<String>().trim().to_string())
            .collect()
    }
}

impl Attached for CaptionPanel {
    fn anchor(&self) -> Anchor {
        self.anchor
    }
}

/// Outcome of one `ContentSlot::poll`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotPoll {
    Idle,
    Pending,
    Installed,
    Failed(SlotImageError),
    /// The pending image belonged to an older epoch and was dropped unseen.
    Discarded,
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotStats {
    pub installed: u64,
    /// Previously shown images released by an install.
    pub released: u64,
    pub failed: u64,
    /// Pending images replaced or discarded before resolving.
    pub superseded: u64,
}

/// One picture frame plus its caption panel.
#[derive(Debug)]
pub struct ContentSlot {
    picture: PictureFrame,
    caption: CaptionPanel,
    pending: Option<(Generation, PendingSlotImage)>,
    stats: SlotStats,
}

impl ContentSlot {
    pub fn new(placement: &SlotPlacement, picture_size: f32, caption_line_len: usize) -> Self {
        Self {
            picture: PictureFrame::new(placement.picture, picture_size),
            caption: CaptionPanel::new(placement.caption, caption_line_len),
            pending: None,
            stats: SlotStats::default(),
        }
    }

    /// Caption shows immediately; the image lands on a later `poll` once resolved.
    /// A newer update replaces any image still pending.
    pub fn update(&mut self, caption: String, image: PendingSlotImage, epoch: Generation) {
        self.caption.set_text(caption);
        if self.pending.replace((epoch, image)).is_some() {
            self.stats.superseded += 1;
        }
    }

    /// Never blocks. Installs the pending image only while `current` still matches
    /// the epoch it was issued under.
    pub fn poll(&mut self, current: Generation) -> SlotPoll {
        let Some((epoch, handle)) = self.pending.take() else {
            return SlotPoll::Idle;
        };
        if epoch != current {
            self.stats.superseded += 1;
            return SlotPoll::Discarded;
        }
        match handle.try_take() {
            Take::Waiting => {
                self.pending = Some((epoch, handle));
                SlotPoll::Pending
            }
            Take::Ready(Ok(image)) => {
                if self.picture.install(image).is_some() {
                    self.stats.released += 1;
                }
                self.stats.installed += 1;
                SlotPoll::Installed
            }
            Take::Ready(Err(e)) => {
                self.stats.failed += 1;
                SlotPoll::Failed(e)
            }
            Take::Abandoned => {
                self.stats.failed += 1;
                SlotPoll::Failed(SlotImageError::Abandoned)
            }
        }
    }

    pub fn picture(&self) -> &PictureFrame {
        &self.picture
    }

    pub fn caption(&self) -> &CaptionPanel {
        &self.caption
    }

    pub fn image(&self) -> Option<&SlotImage> {
        self.picture.image()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn stats(&self) -> SlotStats {
        self.stats
    }
}
