//! Sliding three-segment window over the corridor and its content refresh.
#![forbid(unsafe_code)]

mod controller;
mod error;
mod event;
mod registry;

pub use controller::{StreamStats, TickReport, ViewerPositionSource, WindowController};
pub use error::StructuralError;
pub use event::{EventEnvelope, StreamEvent};
pub use registry::SegmentRegistry;
