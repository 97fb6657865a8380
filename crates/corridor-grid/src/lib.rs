//! One-dimensional segment grid: quantization of viewer positions into cells.
#![forbid(unsafe_code)]

mod coord;
mod window;

pub use coord::{GridCoord, SegmentLength, cell_of, neighbors};
pub use window::Window;
