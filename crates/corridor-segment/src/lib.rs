//! Corridor segments and their decoration slots.
#![forbid(unsafe_code)]

mod slot_image;
pub mod layout;
mod segment;
mod slot;

pub use slot_image::{SlotImage, SlotImageError};
pub use layout::{Anchor, Attached, CorridorDims, SlotLayout, SlotPlacement, SlotSide};
pub use segment::{
    FetchApply, Generation, RefreshTicket, Segment, SegmentId, SegmentView, SlotUpdate, SlotView,
};
pub use slot::{CaptionPanel, ContentSlot, PendingSlotImage, PictureFrame, SlotPoll, SlotStats};
