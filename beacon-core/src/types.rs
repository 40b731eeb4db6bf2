//! Core data types for the edge watcher and periodic beacon

use core::net::Ipv4Addr;

use crate::hal::Duration;

/// Highest valid GPIO number on this family (GPIO0..GPIO15).
pub const MAX_GPIO: u8 = 16;

/// Longest fixed payload a beacon may carry.
pub const MAX_PAYLOAD: usize = 64;

/// Default beacon payload, NUL-terminated like the SDK string it replaces.
pub const DEFAULT_PAYLOAD: &[u8] = b"ESP8266\0";

/// Digital level of a pin
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Level {
    /// Logic low (0)
    Low,
    /// Logic high (1)
    High,
}

impl Level {
    /// Returns true for a high level
    pub const fn is_high(&self) -> bool {
        matches!(self, Level::High)
    }

    /// Level as the raw register bit value
    pub const fn as_bit(&self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }
}

/// Signal transition that triggers a pin interrupt
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EdgePolarity {
    /// Interrupt source disabled
    None,
    /// Low-to-high transition
    Rising,
    /// High-to-low transition
    Falling,
    /// Either transition
    Both,
}

impl EdgePolarity {
    /// Returns true if a transition from `from` to `to` fires this polarity.
    /// Equal levels are not a transition and never fire.
    pub const fn triggers(&self, from: Level, to: Level) -> bool {
        match (self, from, to) {
            (EdgePolarity::Rising, Level::Low, Level::High) => true,
            (EdgePolarity::Falling, Level::High, Level::Low) => true,
            (EdgePolarity::Both, Level::Low, Level::High) => true,
            (EdgePolarity::Both, Level::High, Level::Low) => true,
            _ => false,
        }
    }
}

/// Pull resistor configuration for an input pin
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PullMode {
    /// Internal pull-up enabled
    PullUp,
    /// Internal pulldown enabled (not available on every pin of this family)
    PullDown,
    /// No internal pull; the board must provide one if the pin would float
    Floating,
}

/// Caller-selected wiring variant for a watched pin.
///
/// `ActiveHigh` disables the internal pull-up and relies on an externally
/// wired pulldown resistor. That resistor is an operational prerequisite of
/// the board, not something software can enforce.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum WatchVariant {
    /// Switch to ground: input with pull-up, fires on the falling edge
    ActiveLow,
    /// Switch to power: input without pull-up, fires on the rising edge
    ActiveHigh,
}

impl WatchVariant {
    /// Edge polarity this variant arms
    pub const fn polarity(&self) -> EdgePolarity {
        match self {
            WatchVariant::ActiveLow => EdgePolarity::Falling,
            WatchVariant::ActiveHigh => EdgePolarity::Rising,
        }
    }

    /// Pull resistor this variant configures
    pub const fn pull(&self) -> PullMode {
        match self {
            WatchVariant::ActiveLow => PullMode::PullUp,
            WatchVariant::ActiveHigh => PullMode::Floating,
        }
    }

    /// Pin level while the switch is not operated
    pub const fn idle_level(&self) -> Level {
        match self {
            WatchVariant::ActiveLow => Level::High,
            WatchVariant::ActiveHigh => Level::Low,
        }
    }
}

/// Arming state of the periodic job
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TimerState {
    /// No timer scheduled
    Unarmed,
    /// Repeating timer scheduled on the slot
    Armed,
}

impl TimerState {
    /// Returns true while the job is scheduled
    pub const fn is_armed(&self) -> bool {
        matches!(self, TimerState::Armed)
    }
}

/// Beacon configuration parameters
#[derive(Copy, Clone, Debug)]
pub struct BeaconConfig {
    /// Destination IPv4 address
    pub remote_addr: Ipv4Addr,
    /// Destination UDP port
    pub remote_port: u16,
    /// Tick period
    pub period: Duration,
    /// Fixed payload transmitted on every tick
    pub payload: &'static [u8],
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            remote_addr: Ipv4Addr::new(192, 168, 4, 2),
            remote_port: 8266,
            period: Duration::from_millis(2000),
            payload: DEFAULT_PAYLOAD,
        }
    }
}

impl BeaconConfig {
    /// Create a new configuration with validation
    pub fn new(
        remote_addr: Ipv4Addr,
        remote_port: u16,
        period_ms: u32,
        payload: &'static [u8],
    ) -> Result<Self, &'static str> {
        if period_ms == 0 {
            return Err("Period must be > 0 ms");
        }
        if payload.is_empty() {
            return Err("Payload must not be empty");
        }
        if payload.len() > MAX_PAYLOAD {
            return Err("Payload exceeds maximum length");
        }

        Ok(Self {
            remote_addr,
            remote_port,
            period: Duration::from_millis(period_ms as u64),
            payload,
        })
    }

    /// Tick period in whole milliseconds
    pub fn period_ms(&self) -> u32 {
        self.period.as_millis() as u32
    }
}
