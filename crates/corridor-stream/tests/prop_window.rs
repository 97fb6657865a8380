mod common;

use common::{ScriptedClient, controller};
use corridor_content::OfflineClient;
use corridor_grid::Window;
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn window_tracks_random_walks(
        start in -500.0f64..500.0,
        steps in proptest::collection::vec(-0.95f64..0.95, 1..120),
    ) {
        let len = 40.0;
        let mut ctrl = controller(ScriptedClient::new(OfflineClient::new()), len, 10);
        let mut p = start;
        ctrl.advance(p, "").unwrap();
        for s in steps {
            p += s * len;
            let report = ctrl.advance(p, "").unwrap();
            let expected = Window::around(p, ctrl.length()).unwrap();
            prop_assert_eq!(report.window, expected);
            prop_assert_eq!(ctrl.registry().coords(), expected.coords().to_vec());
            prop_assert_eq!(ctrl.registry().len(), 3);
            prop_assert_eq!(ctrl.registry().allocated(), 3);
            prop_assert!(report.created == 0);
            prop_assert!(report.recycled <= 1);
        }
    }
}
