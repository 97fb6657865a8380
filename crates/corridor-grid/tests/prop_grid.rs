use corridor_grid::{GridCoord, SegmentLength, Window, cell_of, neighbors};
use proptest::prelude::*;

fn length() -> impl Strategy<Value = f64> {
    prop_oneof![Just(35.0f64), Just(40.0f64), 0.5f64..500.0]
}

fn position() -> impl Strategy<Value = f64> {
    -1.0e6f64..1.0e6
}

proptest! {
    // The cell origin is a multiple of L within half a cell of the position
    #[test]
    fn cell_origin_within_half_length(l in length(), p in position()) {
        let len = SegmentLength::new(l).unwrap();
        let c = cell_of(p, len);
        let origin = c.origin(len);
        let eps = 1e-9 * (1.0 + p.abs());
        prop_assert!((p - origin).abs() <= len.half() + eps);
        prop_assert_eq!(origin, c.index() as f64 * l);
    }

    // Quantizing a cell origin gives back the same cell
    #[test]
    fn idempotent_on_origins(l in length(), i in -100_000i64..100_000) {
        let len = SegmentLength::new(l).unwrap();
        let c = GridCoord::new(i);
        prop_assert_eq!(cell_of(c.origin(len), len), c);
    }

    #[test]
    fn monotonic_in_position(l in length(), a in position(), b in position()) {
        let len = SegmentLength::new(l).unwrap();
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(cell_of(lo, len) <= cell_of(hi, len));
    }

    #[test]
    fn window_is_three_consecutive_cells(l in length(), p in position()) {
        let len = SegmentLength::new(l).unwrap();
        let w = Window::around(p, len).unwrap();
        let (lo, hi) = neighbors(w.current);
        prop_assert_eq!(w.lower, lo);
        prop_assert_eq!(w.upper, hi);
        prop_assert_eq!(w.upper.index() - w.lower.index(), 2);
        prop_assert!(w.contains(cell_of(p, len)));
    }
}
