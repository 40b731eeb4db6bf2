//! Property tests for the edge-counting invariant

use beacon_core::hal::mock::MockSoc;
use beacon_core::{EdgeWatcher, Level, PinWatch, WatchVariant};
use proptest::prelude::*;

const PIN: u8 = 2;

fn level(high: bool) -> Level {
    if high {
        Level::High
    } else {
        Level::Low
    }
}

proptest! {
    /// For any sequence of level moves, the counter increases by exactly
    /// one per qualifying edge: no edge adds more than one, and none is
    /// dropped while the line is enabled.
    #[test]
    fn counter_tracks_qualifying_edges_exactly(highs in prop::collection::vec(any::<bool>(), 0..48)) {
        let watch = PinWatch::new(PIN, WatchVariant::ActiveLow);
        let mut watcher = EdgeWatcher::new(MockSoc::new());
        watcher.setup(&watch).unwrap();

        let mut current = WatchVariant::ActiveLow.idle_level();
        let mut qualifying = 0u32;

        for high in highs {
            let next = level(high);
            let fired = watcher.hardware().drive(PIN, next);
            if current == Level::High && next == Level::Low {
                // Falling edge on a falling watch must vector
                prop_assert!(fired);
                let before = watch.event_count();
                let event = watcher.service(&watch);
                qualifying += 1;
                prop_assert_eq!(event.count, before + 1);
            } else {
                prop_assert!(!fired);
            }
            current = next;
        }

        prop_assert_eq!(watch.event_count(), qualifying);
    }

    /// The rising variant counts the mirror-image transitions.
    #[test]
    fn rising_variant_counts_low_to_high(highs in prop::collection::vec(any::<bool>(), 0..48)) {
        let watch = PinWatch::new(PIN, WatchVariant::ActiveHigh);
        let mut watcher = EdgeWatcher::new(MockSoc::new());
        watcher.setup(&watch).unwrap();

        let mut current = WatchVariant::ActiveHigh.idle_level();
        let mut qualifying = 0u32;

        for high in highs {
            let next = level(high);
            if watcher.hardware().drive(PIN, next) {
                watcher.service(&watch);
            }
            if current == Level::Low && next == Level::High {
                qualifying += 1;
            }
            current = next;
        }

        prop_assert_eq!(watch.event_count(), qualifying);
    }
}
