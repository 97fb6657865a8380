use crate::{GridCoord, SegmentLength, cell_of, neighbors};

/// The three cells that must hold live segments around the viewer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Window {
    pub lower: GridCoord,
    pub current: GridCoord,
    pub upper: GridCoord,
}

impl Window {
    pub fn centered_on(current: GridCoord) -> Self {
        let (lower, upper) = neighbors(current);
        Self {
            lower,
            current,
            upper,
        }
    }

    /// Window of the cell holding `position`. `None` when the position is not finite
    /// or its cell has no neighbor on one side within `i64`.
    pub fn around(position: f64, len: SegmentLength) -> Option<Self> {
        if !position.is_finite() {
            return None;
        }
        let current = cell_of(position, len);
        if current.index() == i64::MIN || current.index() == i64::MAX {
            return None;
        }
        Some(Self::centered_on(current))
    }

    /// Lower, current, upper.
    #[inline]
    pub fn coords(&self) -> [GridCoord; 3] {
        [self.lower, self.current, self.upper]
    }

    #[inline]
    pub fn contains(&self, c: GridCoord) -> bool {
        c == self.lower || c == self.current || c == self.upper
    }
}
