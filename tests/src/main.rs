// Smoke checks runnable without the async test harness

use beacon_core::hal::mock::{MockSoc, MockTimerSlot};
use beacon_core::net::mock::MockStack;
use beacon_core::{beacon, BeaconConfig, EdgeWatcher, Level, PinWatch, TimerState, WatchVariant};

fn main() {
    println!("🧪 Beacon smoke checks");

    smoke_edge_watch();
    smoke_beacon_flow();
    smoke_config();

    println!("✅ All smoke checks passed!");
    println!();
    println!("📝 Run the full suite with: cargo test");
}

/// One press, one count, status cleared
fn smoke_edge_watch() {
    println!("🔧 Edge watch...");

    let watch = PinWatch::new(2, WatchVariant::ActiveLow);
    let mut watcher = EdgeWatcher::new(MockSoc::new());
    watcher.setup(&watch).expect("setup");

    assert!(watcher.hardware().drive(2, Level::Low));
    let event = watcher.service(&watch);
    assert_eq!(event.count, 1);
    assert!(!watcher.hardware().pending(2));

    println!("  ✅ counted {} edge, status {:#x} cleared", event.count, event.status);
}

/// Boot, three ticks, three datagrams
fn smoke_beacon_flow() {
    println!("📡 Beacon flow...");

    let mut stack = MockStack::new(4);
    let mut slot = MockTimerSlot::new();
    let mut beacon =
        beacon::start(&mut stack, &mut slot, 0, BeaconConfig::default()).expect("start");
    assert_eq!(beacon.state(), TimerState::Armed);

    for _ in 0..3 {
        let outcome = beacon.tick();
        assert!(outcome.is_ok());
    }
    assert_eq!(beacon.tick_count(), 3);
    assert_eq!(beacon.peer_mut().socket_mut().sent().len(), 3);

    println!(
        "  ✅ {} ticks, {} datagrams, slot armed: {}",
        beacon.tick_count(),
        beacon.peer_mut().socket_mut().sent().len(),
        slot.is_armed()
    );
}

/// Configuration validation and defaults
fn smoke_config() {
    println!("⚙️ Configuration...");

    let config = BeaconConfig::default();
    assert_eq!(config.period_ms(), 2000);
    assert_eq!(config.payload.len(), 8);
    assert_eq!(config.remote_port, 8266);

    println!(
        "  ✅ {}:{} every {}ms, {} byte payload",
        config.remote_addr,
        config.remote_port,
        config.period_ms(),
        config.payload.len()
    );
}
