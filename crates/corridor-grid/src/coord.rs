use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed length of one segment along the streaming axis.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct SegmentLength(f64);

impl SegmentLength {
    /// Returns `None` unless `len` is finite and strictly positive.
    pub fn new(len: f64) -> Option<Self> {
        if len.is_finite() && len > 0.0 {
            Some(Self(len))
        } else {
            None
        }
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn half(self) -> f64 {
        self.0 * 0.5
    }
}

/// Index of a grid cell. Cell `i` is centered on world coordinate `i * L`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCoord(pub i64);

impl GridCoord {
    #[inline]
    pub const fn new(index: i64) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn offset(self, cells: i64) -> Self {
        Self(self.0.saturating_add(cells))
    }

    /// World coordinate of the cell center.
    #[inline]
    pub fn origin(self, len: SegmentLength) -> f64 {
        self.0 as f64 * len.get()
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i64> for GridCoord {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// Cell containing `position`: `floor((p + L/2) / L)`.
///
/// A position within `L/2` of a multiple of `L` belongs to that multiple's cell;
/// the upper boundary belongs to the next cell. Non-finite input saturates
/// (`NaN` maps to cell 0).
#[inline]
pub fn cell_of(position: f64, len: SegmentLength) -> GridCoord {
    GridCoord(((position + len.half()) / len.get()).floor() as i64)
}

/// `(lower, upper)` neighbors of `c`.
#[inline]
pub fn neighbors(c: GridCoord) -> (GridCoord, GridCoord) {
    (c.offset(-1), c.offset(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn len(l: f64) -> SegmentLength {
        SegmentLength::new(l).unwrap()
    }

    #[test]
    fn rejects_degenerate_lengths() {
        assert!(SegmentLength::new(0.0).is_none());
        assert!(SegmentLength::new(-3.0).is_none());
        assert!(SegmentLength::new(f64::NAN).is_none());
        assert!(SegmentLength::new(f64::INFINITY).is_none());
        assert_eq!(SegmentLength::new(35.0).map(|l| l.get()), Some(35.0));
    }

    #[test]
    fn cells_are_centered_on_multiples() {
        let l = len(40.0);
        assert_eq!(cell_of(0.0, l), GridCoord(0));
        assert_eq!(cell_of(19.9, l), GridCoord(0));
        assert_eq!(cell_of(-19.9, l), GridCoord(0));
        assert_eq!(cell_of(-20.0, l), GridCoord(0));
        assert_eq!(cell_of(20.0, l), GridCoord(1));
        assert_eq!(cell_of(25.0, l), GridCoord(1));
        assert_eq!(cell_of(25.0, l).origin(l), 40.0);
        assert_eq!(cell_of(-20.1, l), GridCoord(-1));
        assert_eq!(cell_of(-61.0, l), GridCoord(-2));
    }

    #[test]
    fn neighbors_are_one_cell_apart() {
        let (lo, hi) = neighbors(GridCoord(7));
        assert_eq!(lo, GridCoord(6));
        assert_eq!(hi, GridCoord(8));
        let l = len(40.0);
        assert_eq!(lo.origin(l), 240.0);
        assert_eq!(hi.origin(l), 320.0);
    }

    #[test]
    fn non_finite_positions_do_not_panic() {
        let l = len(10.0);
        assert_eq!(cell_of(f64::NAN, l), GridCoord(0));
        assert_eq!(cell_of(f64::INFINITY, l), GridCoord(i64::MAX));
        assert_eq!(cell_of(f64::NEG_INFINITY, l), GridCoord(i64::MIN));
        let (lo, hi) = neighbors(GridCoord(i64::MAX));
        assert_eq!(lo, GridCoord(i64::MAX - 1));
        assert_eq!(hi, GridCoord(i64::MAX));
    }
}
