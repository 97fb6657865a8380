use corridor_grid::{GridCoord, Window};
use corridor_segment::SegmentId;
use thiserror::Error;

/// Broken window or registry bookkeeping. Fatal: the controller halts.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StructuralError {
    #[error("coordinate {0} is already occupied")]
    Occupied(GridCoord),

    #[error("no segment at {0} where one is required")]
    Missing(GridCoord),

    #[error("unknown segment {0}")]
    UnknownSegment(SegmentId),

    #[error(
        "viewer moved more than one cell in a tick: window {}..{} has {present} of 3 segments",
        window.lower,
        window.upper
    )]
    WindowJump { window: Window, present: usize },

    #[error("viewer position {position} has no window on the grid")]
    OffGrid { position: f64 },

    #[error("registry holds {found} segments, expected {expected}")]
    Count { expected: usize, found: usize },

    #[error("window controller halted after an earlier structural error")]
    Halted,
}
