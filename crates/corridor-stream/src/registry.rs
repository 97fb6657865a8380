use corridor_grid::GridCoord;
use corridor_segment::{Segment, SegmentId, SlotLayout};
use hashbrown::HashMap;

use crate::error::StructuralError;

/// Live segments keyed by grid coordinate, at most one per coordinate.
///
/// Segments live in an arena and are never freed; removed ones are parked and
/// handed out again by `spawn`.
#[derive(Debug, Default)]
pub struct SegmentRegistry {
    arena: Vec<Segment>,
    index: HashMap<GridCoord, SegmentId>,
    parked: Vec<SegmentId>,
}

impl SegmentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, at: GridCoord) -> Option<&Segment> {
        self.lookup_id(at).and_then(|id| self.get(id))
    }

    #[inline]
    pub fn lookup_id(&self, at: GridCoord) -> Option<SegmentId> {
        self.index.get(&at).copied()
    }

    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.arena.get(id.0 as usize)
    }

    pub fn get_mut(&mut self, id: SegmentId) -> Option<&mut Segment> {
        self.arena.get_mut(id.0 as usize)
    }

    /// Adds a new segment at its own position.
    pub fn insert(&mut self, segment: Segment) -> Result<SegmentId, StructuralError> {
        let at = segment.position();
        if self.index.contains_key(&at) {
            return Err(StructuralError::Occupied(at));
        }
        let id = SegmentId(self.arena.len() as u32);
        self.arena.push(segment);
        self.index.insert(at, id);
        Ok(id)
    }

    /// Places a segment at `at`, reusing a parked one when available.
    pub fn spawn(&mut self, at: GridCoord, layout: &SlotLayout) -> Result<SegmentId, StructuralError> {
        if self.index.contains_key(&at) {
            return Err(StructuralError::Occupied(at));
        }
        match self.parked.pop() {
            Some(id) => {
                let segment = self
                    .arena
                    .get_mut(id.0 as usize)
                    .ok_or(StructuralError::UnknownSegment(id))?;
                segment.set_position(at);
                segment.mark_recycled();
                self.index.insert(at, id);
                Ok(id)
            }
            None => self.insert(Segment::new(at, layout)),
        }
    }

    /// Takes the segment at `at` out of the index and parks it.
    pub fn remove(&mut self, at: GridCoord) -> Option<SegmentId> {
        let id = self.index.remove(&at)?;
        self.parked.push(id);
        Some(id)
    }

    /// Moves a live segment to `to` in one step: the old key is gone and the new
    /// key present when this returns, and nothing changes on error.
    pub fn rekey(&mut self, id: SegmentId, to: GridCoord) -> Result<GridCoord, StructuralError> {
        let from = self
            .get(id)
            .ok_or(StructuralError::UnknownSegment(id))?
            .position();
        if self.lookup_id(from) != Some(id) {
            return Err(StructuralError::UnknownSegment(id));
        }
        if from == to {
            return Ok(from);
        }
        if self.index.contains_key(&to) {
            return Err(StructuralError::Occupied(to));
        }
        self.index.remove(&from);
        self.index.insert(to, id);
        if let Some(segment) = self.get_mut(id) {
            segment.set_position(to);
        }
        Ok(from)
    }

    /// Live segments.
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Segments ever allocated, live or parked.
    pub fn allocated(&self) -> usize {
        self.arena.len()
    }

    /// Live coordinates in ascending order.
    pub fn coords(&self) -> Vec<GridCoord> {
        let mut out: Vec<GridCoord> = self.index.keys().copied().collect();
        out.sort_unstable();
        out
    }

    pub fn ids(&self) -> Vec<SegmentId> {
        self.index.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SegmentId, &Segment)> + '_ {
        self.index
            .values()
            .filter_map(|&id| self.get(id).map(|s| (id, s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corridor_segment::CorridorDims;

    fn layout() -> SlotLayout {
        SlotLayout::corridor(&CorridorDims::default())
    }

    #[test]
    fn insert_rejects_duplicate_coordinate() {
        let mut reg = SegmentRegistry::new();
        let l = layout();
        reg.insert(Segment::new(GridCoord(0), &l)).unwrap();
        assert_eq!(
            reg.insert(Segment::new(GridCoord(0), &l)),
            Err(StructuralError::Occupied(GridCoord(0)))
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn rekey_moves_atomically() {
        let mut reg = SegmentRegistry::new();
        let l = layout();
        let a = reg.spawn(GridCoord(-1), &l).unwrap();
        reg.spawn(GridCoord(0), &l).unwrap();
        assert_eq!(reg.rekey(a, GridCoord(0)), Err(StructuralError::Occupied(GridCoord(0))));
        assert_eq!(reg.lookup_id(GridCoord(-1)), Some(a));

        assert_eq!(reg.rekey(a, GridCoord(1)), Ok(GridCoord(-1)));
        assert!(reg.lookup(GridCoord(-1)).is_none());
        assert_eq!(reg.lookup(GridCoord(1)).map(|s| s.position()), Some(GridCoord(1)));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn removed_segments_are_reused_by_spawn() {
        let mut reg = SegmentRegistry::new();
        let l = layout();
        let a = reg.spawn(GridCoord(3), &l).unwrap();
        let gen_before = reg.get(a).unwrap().generation();
        assert_eq!(reg.remove(GridCoord(3)), Some(a));
        assert!(reg.is_empty());
        let b = reg.spawn(GridCoord(7), &l).unwrap();
        assert_eq!(a, b);
        assert_eq!(reg.allocated(), 1);
        let seg = reg.get(b).unwrap();
        assert_eq!(seg.position(), GridCoord(7));
        assert!(seg.generation() > gen_before);
        assert!(seg.is_forced());
    }

    #[test]
    fn parked_segment_cannot_be_rekeyed() {
        let mut reg = SegmentRegistry::new();
        let a = reg.spawn(GridCoord(0), &layout()).unwrap();
        reg.remove(GridCoord(0));
        assert_eq!(reg.rekey(a, GridCoord(1)), Err(StructuralError::UnknownSegment(a)));
        assert_eq!(reg.rekey(SegmentId(9), GridCoord(1)), Err(StructuralError::UnknownSegment(SegmentId(9))));
    }

    #[test]
    fn coords_are_sorted() {
        let mut reg = SegmentRegistry::new();
        let l = layout();
        for c in [2, -1, 0] {
            reg.spawn(GridCoord(c), &l).unwrap();
        }
        assert_eq!(reg.coords(), vec![GridCoord(-1), GridCoord(0), GridCoord(2)]);
    }
}
