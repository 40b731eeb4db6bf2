//! Periodic transmitter: the repeating tick that re-binds and re-sends

use crate::hal::TimerSlot;
use crate::net::{NetError, SendOutcome, UdpPeer, UdpSocket, UdpStack};
use crate::types::{BeaconConfig, TimerState};

/// Owns the UDP peer and the repeating tick that beacons through it.
///
/// One instance per timer slot. The state machine is Unarmed -> Armed on
/// `arm` and back on `disarm`; arming an armed job disarms the slot first
/// so two timers can never stack on it.
pub struct PeriodicBeacon<S> {
    peer: UdpPeer<S>,
    config: BeaconConfig,
    state: TimerState,
    ticks: u32,
    last_outcome: Option<SendOutcome>,
}

impl<S> PeriodicBeacon<S>
where
    S: UdpSocket,
{
    pub fn new(peer: UdpPeer<S>, config: BeaconConfig) -> Self {
        Self {
            peer,
            config,
            state: TimerState::Unarmed,
            ticks: 0,
            last_outcome: None,
        }
    }

    /// Schedule the repeating tick on the slot
    pub fn arm<T: TimerSlot>(&mut self, slot: &mut T) {
        if self.state.is_armed() {
            slot.disarm();
        }
        slot.arm(self.config.period_ms(), true);
        self.state = TimerState::Armed;

        #[cfg(feature = "defmt")]
        defmt::info!("beacon armed, period {=u32} ms", self.config.period_ms());
    }

    /// Cancel the slot. Best-effort: a tick the runtime already dispatched
    /// may still run once after this returns.
    pub fn disarm<T: TimerSlot>(&mut self, slot: &mut T) {
        slot.disarm();
        self.state = TimerState::Unarmed;
    }

    /// The tick handler, fired by the slot every period.
    ///
    /// Re-binds the remote endpoint (the stack forgets it between sends),
    /// sends the fixed payload, and counts the tick whether or not the
    /// stack accepted the datagram. A rejected send is only reported; the
    /// next tick is the entire retry strategy.
    pub fn tick(&mut self) -> SendOutcome {
        self.peer
            .bind_remote(self.config.remote_addr, self.config.remote_port);

        let outcome = match self.peer.send(self.config.payload) {
            Ok(bytes) => SendOutcome::success(bytes),
            Err(err) => SendOutcome::failure(err.code()),
        };

        self.ticks = self.ticks.wrapping_add(1);
        self.last_outcome = Some(outcome);

        #[cfg(feature = "defmt")]
        {
            let octets = self.config.remote_addr.octets();
            defmt::trace!(
                "tick {=u32}: {=u8}.{=u8}.{=u8}.{=u8}:{=u16} status {=i32} bytes {=u16}",
                self.ticks,
                octets[0],
                octets[1],
                octets[2],
                octets[3],
                self.config.remote_port,
                outcome.status_code,
                outcome.byte_count
            );
        }

        outcome
    }

    /// Deliver a pending sent-notification, if the stack queued one
    pub fn poll_sent(&mut self) -> Option<u16> {
        self.peer.poll_sent()
    }

    /// Ticks fired so far, successful or not
    pub fn tick_count(&self) -> u32 {
        self.ticks
    }

    /// Current arming state
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Outcome of the most recent tick
    pub fn last_outcome(&self) -> Option<SendOutcome> {
        self.last_outcome
    }

    pub fn config(&self) -> &BeaconConfig {
        &self.config
    }

    pub fn peer(&self) -> &UdpPeer<S> {
        &self.peer
    }

    pub fn peer_mut(&mut self) -> &mut UdpPeer<S> {
        &mut self.peer
    }
}

/// Boot-time bring-up: allocate the socket, bind the destination, arm the
/// timer, in that order. A `ResourceExhausted` from the pool halts setup
/// before anything is armed; there is no recovery path for it.
pub fn start<T, TS>(
    stack: &mut T,
    slot: &mut TS,
    local_port: u16,
    config: BeaconConfig,
) -> Result<PeriodicBeacon<T::Socket>, NetError>
where
    T: UdpStack,
    TS: TimerSlot,
{
    let mut peer = UdpPeer::create(stack, local_port)?;
    peer.bind_remote(config.remote_addr, config.remote_port);

    let mut beacon = PeriodicBeacon::new(peer, config);
    beacon.arm(slot);
    Ok(beacon)
}

/// Async runner for cooperative runtimes: the awaited timer is the slot,
/// and each expiry delivers one tick plus any pending sent-notification.
#[cfg(feature = "embassy-time")]
pub async fn beacon_task<S>(beacon: &mut PeriodicBeacon<S>) -> !
where
    S: UdpSocket,
{
    use embassy_time::Timer;

    beacon.arm(&mut ());
    let period = beacon.config().period;

    loop {
        Timer::after(period).await;
        let _outcome = beacon.tick();
        beacon.poll_sent();
    }
}
