use corridor_grid::GridCoord;
use corridor_segment::{CorridorDims, SegmentId, SlotLayout};
use corridor_stream::SegmentRegistry;
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Op {
    Spawn(i64),
    Remove(i64),
    Rekey(u32, i64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (-6i64..6).prop_map(Op::Spawn),
        (-6i64..6).prop_map(Op::Remove),
        (0u32..6, -6i64..6).prop_map(|(id, to)| Op::Rekey(id, to)),
    ]
}

proptest! {
    #[test]
    fn index_and_positions_stay_consistent(ops in proptest::collection::vec(op(), 0..80)) {
        let layout = SlotLayout::corridor(&CorridorDims { lights: 1, ..CorridorDims::default() });
        let mut reg = SegmentRegistry::new();
        for op in ops {
            let before = reg.len();
            match op {
                Op::Spawn(c) => {
                    let occupied = reg.lookup_id(GridCoord(c)).is_some();
                    prop_assert_eq!(reg.spawn(GridCoord(c), &layout).is_ok(), !occupied);
                }
                Op::Remove(c) => {
                    let _ = reg.remove(GridCoord(c));
                }
                Op::Rekey(id, to) => {
                    if reg.rekey(SegmentId(id), GridCoord(to)).is_ok() {
                        prop_assert_eq!(reg.lookup_id(GridCoord(to)), Some(SegmentId(id)));
                        prop_assert_eq!(reg.len(), before);
                    }
                }
            }
            for (id, seg) in reg.iter() {
                prop_assert_eq!(reg.lookup_id(seg.position()), Some(id));
            }
            let coords = reg.coords();
            let mut dedup = coords.clone();
            dedup.dedup();
            prop_assert_eq!(coords.len(), dedup.len());
            prop_assert!(reg.allocated() <= 12);
        }
    }
}
