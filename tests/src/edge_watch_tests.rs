//! Edge watcher scenarios driven through the mock SoC

use beacon_core::hal::mock::MockSoc;
use beacon_core::test_utils::edge_simulator::{run_pattern, EdgePattern};
use beacon_core::{EdgeWatcher, Level, LevelProbe, PinWatch, WatchVariant};
use embedded_hal_mock::eh1::digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction};
use rstest::rstest;

const PIN: u8 = 2;

fn armed(variant: WatchVariant) -> (EdgeWatcher<MockSoc>, PinWatch) {
    let watch = PinWatch::new(PIN, variant);
    let mut watcher = EdgeWatcher::new(MockSoc::new());
    watcher.setup(&watch).expect("setup must succeed on a valid pin");
    (watcher, watch)
}

#[test]
fn falling_watch_counts_a_high_to_low_transition_once() {
    let (mut watcher, watch) = armed(WatchVariant::ActiveLow);

    assert!(watcher.hardware().drive(PIN, Level::Low));
    let event = watcher.service(&watch);

    assert_eq!(event.count, 1);
    assert_eq!(watch.event_count(), 1);
    // The write-one-to-clear mask equals the status that was read
    assert_eq!(event.status, 1 << PIN);
    assert_eq!(watcher.hardware().clear_writes().last(), Some(&event.status));
}

#[rstest]
#[case(WatchVariant::ActiveLow)]
#[case(WatchVariant::ActiveHigh)]
fn one_clean_press_is_one_event(#[case] variant: WatchVariant) {
    let (mut watcher, watch) = armed(variant);

    let events = run_pattern(
        &mut watcher,
        &watch,
        &EdgePattern::press(variant.idle_level()),
    );

    assert_eq!(events.len(), 1);
    assert_eq!(watch.event_count(), 1);
    // The release transition goes the other way and must not count
    assert!(!watcher.hardware().pending(PIN));
}

#[rstest]
#[case(0, 1)]
#[case(2, 3)]
#[case(5, 6)]
fn bouncing_contact_counts_every_electrical_edge(
    #[case] bounces: usize,
    #[case] expected: u32,
) {
    // No debounce by contract: a bouncing switch produces multiple counted
    // events per physical press, and that is the documented behaviour.
    let (mut watcher, watch) = armed(WatchVariant::ActiveLow);

    let pattern = EdgePattern::bouncing_press(Level::High, bounces);
    let events = run_pattern(&mut watcher, &watch, &pattern);

    assert_eq!(events.len(), expected as usize);
    assert_eq!(watch.event_count(), expected);
}

#[test]
fn no_edge_is_lost_while_the_line_is_enabled() {
    let (mut watcher, watch) = armed(WatchVariant::ActiveLow);

    let pattern = EdgePattern::train(&[
        Level::Low,
        Level::High,
        Level::Low,
        Level::High,
        Level::Low,
    ]);
    run_pattern(&mut watcher, &watch, &pattern);

    // Three falling transitions in the train, three serviced events
    assert_eq!(watch.event_count(), 3);
    assert!(!watcher.hardware().pending(PIN));
}

#[test]
fn counters_restart_cleanly_for_a_new_scenario() {
    let (mut watcher, watch) = armed(WatchVariant::ActiveLow);

    run_pattern(&mut watcher, &watch, &EdgePattern::press(Level::High));
    assert_eq!(watch.event_count(), 1);

    watch.reset();
    assert_eq!(watch.event_count(), 0);
    run_pattern(&mut watcher, &watch, &EdgePattern::press(Level::High));
    assert_eq!(watch.event_count(), 1);
}

#[test]
fn level_probe_samples_a_hal_pin() {
    let expectations = [
        PinTransaction::get(PinState::High),
        PinTransaction::get(PinState::Low),
    ];
    let mut probe = LevelProbe::new(PinMock::new(&expectations));

    assert_eq!(probe.level(), Ok(Level::High));
    assert_eq!(probe.level(), Ok(Level::Low));
    probe.free().done();
}
