//! Async runner tests: embassy mock time and tokio paused time

use beacon_core::beacon::{beacon_task, start, PeriodicBeacon};
use beacon_core::net::mock::{MockSocket, MockStack};
use beacon_core::{BeaconConfig, TimerState, UdpPeer};
use embassy_time::{Duration, MockDriver};

fn fresh_beacon() -> PeriodicBeacon<MockSocket> {
    let mut stack = MockStack::new(1);
    let peer = UdpPeer::create(&mut stack, 0).unwrap();
    PeriodicBeacon::new(peer, BeaconConfig::default())
}

/// The async runner is the timer slot: each expiry of the awaited timer
/// delivers exactly one tick, and half a period delivers none.
///
/// The mock time driver is process-global, so everything that advances it
/// lives in this single test.
#[test]
fn beacon_task_ticks_once_per_period() {
    let driver = MockDriver::get();
    let mut beacon = fresh_beacon();

    {
        let mut task = tokio_test::task::spawn(beacon_task(&mut beacon));

        // First poll arms the job and parks on the first period
        assert!(task.poll().is_pending());

        // Half a period is not a tick
        driver.advance(Duration::from_millis(1000));
        assert!(task.poll().is_pending());

        driver.advance(Duration::from_millis(1000));
        assert!(task.poll().is_pending());

        driver.advance(Duration::from_millis(2000));
        assert!(task.poll().is_pending());
    }

    assert_eq!(beacon.tick_count(), 2);
    assert_eq!(beacon.state(), TimerState::Armed);
    assert_eq!(beacon.peer_mut().socket_mut().sent().len(), 2);
}

/// Cooperative schedule under tokio's paused clock: the tick cadence and
/// the re-assert-per-send rule hold across simulated seconds.
#[tokio::test(start_paused = true)]
async fn cooperative_schedule_re_asserts_the_peer_every_tick() {
    let mut stack = MockStack::new(1);
    let mut slot = ();
    let mut beacon = start(&mut stack, &mut slot, 0, BeaconConfig::default()).unwrap();
    let period = std::time::Duration::from_millis(beacon.config().period_ms() as u64);

    for _ in 0..3 {
        tokio::time::sleep(period).await;
        let outcome = beacon.tick();
        assert!(outcome.is_ok());
        assert_eq!(outcome.byte_count, 8);
    }

    let sent = beacon.peer_mut().socket_mut().sent();
    assert_eq!(sent.len(), 3);
    for datagram in sent {
        assert_eq!(datagram.port, 8266);
        assert_eq!(&datagram.payload[..], b"ESP8266\0");
    }
}
