//! Hardware Abstraction Layer for the event core

// Re-export the duration type based on feature
#[cfg(feature = "embassy-time")]
pub use embassy_time::Duration;

#[cfg(not(feature = "embassy-time"))]
pub use self::mock_time::Duration;

#[cfg(not(feature = "embassy-time"))]
mod mock_time {
    /// Mock duration type for compilation without embassy-time
    #[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
    pub struct Duration(u64);

    impl Duration {
        pub fn from_millis(ms: u64) -> Self {
            Self(ms)
        }

        pub fn as_millis(&self) -> u64 {
            self.0
        }
    }
}

use embedded_hal::digital::InputPin;

use crate::types::{EdgePolarity, Level, PullMode};

/// Error types for HAL operations
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HalError {
    /// GPIO operation failed
    GpioError,
    /// Invalid configuration (e.g. pin number outside the package)
    InvalidConfig,
    /// Hardware not initialized
    NotInitialized,
}

#[cfg(feature = "std")]
impl core::fmt::Display for HalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            HalError::GpioError => write!(f, "GPIO operation failed"),
            HalError::InvalidConfig => write!(f, "Invalid configuration"),
            HalError::NotInitialized => write!(f, "Hardware not initialized"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for HalError {}

/// Register-level GPIO access.
///
/// All accesses to the shared GPIO register block route through the single
/// owner of this handle; that is what makes the watcher's critical section
/// (interrupts disabled around read+clear) meaningful. Hardware register
/// operations cannot fail observably, so these return nothing; faults on a
/// non-existent pin are undefined behaviour per the platform and are kept
/// out by validating pin numbers at configuration time.
pub trait GpioRegisters {
    /// Initialize the GPIO subsystem. Idempotent.
    fn init(&mut self);

    /// Route the pin's multiplexed pad to its plain-GPIO function.
    ///
    /// Mandatory before any pull or direction configuration: the pad may
    /// arrive from boot wired to an entirely different peripheral.
    fn select_gpio_function(&mut self, pin: u8);

    /// Configure the pin as an input with the given pull resistor.
    fn configure_input(&mut self, pin: u8, pull: PullMode);

    /// Sample the pin's current level.
    fn read_level(&mut self, pin: u8) -> Level;

    /// Read the aggregate interrupt-status register (one bit per pin).
    fn read_status(&mut self) -> u32;

    /// Clear latched status bits, write-one-to-clear: only bits set in
    /// `mask` are cleared, all others stay latched.
    fn clear_status(&mut self, mask: u32);
}

/// Global interrupt line and per-pin edge configuration.
pub trait InterruptControl {
    /// Mask the global GPIO interrupt line. Idempotent.
    fn disable_all(&mut self);

    /// Unmask the global GPIO interrupt line. Idempotent.
    fn enable_all(&mut self);

    /// Associate the handler slot with the pin's interrupt source,
    /// replacing any prior association. Must only be called while
    /// `disable_all` is in effect, or the slot can fire unconfigured.
    fn attach(&mut self, pin: u8);

    /// Configure which transition triggers the pin's interrupt.
    fn set_edge(&mut self, pin: u8, polarity: EdgePolarity);
}

/// The single repeating software-timer slot offered by the runtime.
pub trait TimerSlot {
    /// Schedule the slot. Re-arming an armed slot must disarm it first;
    /// callers go through `PeriodicBeacon::arm` which guarantees that.
    fn arm(&mut self, period_ms: u32, repeat: bool);

    /// Cancel the slot. Best-effort: a tick the runtime already dispatched
    /// may still run.
    fn disarm(&mut self);
}

/// A `TimerSlot` owned by an external scheduler.
///
/// Used when the tick loop itself provides the cadence (the async runner in
/// `beacon::beacon_task`), so arming is purely a state-machine transition.
impl TimerSlot for () {
    fn arm(&mut self, _period_ms: u32, _repeat: bool) {}
    fn disarm(&mut self) {}
}

/// Level sampling through an embedded-hal input pin, for boards that expose
/// the watched pin through a HAL crate rather than raw registers.
pub struct LevelProbe<P> {
    pin: P,
}

impl<P> LevelProbe<P>
where
    P: InputPin,
{
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Sample the pin level.
    pub fn level(&mut self) -> Result<Level, HalError> {
        match self.pin.is_high() {
            Ok(true) => Ok(Level::High),
            Ok(false) => Ok(Level::Low),
            Err(_) => Err(HalError::GpioError),
        }
    }

    /// Release the wrapped pin.
    pub fn free(self) -> P {
        self.pin
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub mod mock {
    //! Mock SoC implementations for testing

    use super::*;
    use crate::types::MAX_GPIO;

    /// Behavioural model of the GPIO block plus its interrupt controller.
    ///
    /// `drive` plays the role of the external signal: it moves a pin level
    /// and latches the status bit when the configured polarity matches,
    /// mirroring how the hardware latches edges even while the global line
    /// is masked.
    #[derive(Debug)]
    pub struct MockSoc {
        initialized: bool,
        int_enabled: bool,
        levels: [Level; MAX_GPIO as usize],
        pulls: [PullMode; MAX_GPIO as usize],
        edges: [EdgePolarity; MAX_GPIO as usize],
        gpio_func: u16,
        inputs: u16,
        attached: u16,
        status: u32,
        clear_writes: heapless::Vec<u32, 16>,
        attach_violation: bool,
    }

    impl MockSoc {
        pub fn new() -> Self {
            Self {
                initialized: false,
                int_enabled: false,
                levels: [Level::Low; MAX_GPIO as usize],
                pulls: [PullMode::Floating; MAX_GPIO as usize],
                edges: [EdgePolarity::None; MAX_GPIO as usize],
                gpio_func: 0,
                inputs: 0,
                attached: 0,
                status: 0,
                clear_writes: heapless::Vec::new(),
                attach_violation: false,
            }
        }

        /// Move a pin to `level`, latching the status bit when the edge
        /// matches the configured polarity. Returns true when the latched
        /// edge would vector into the handler right now (line unmasked and
        /// a handler attached); the test harness then calls the handler,
        /// standing in for the hardware dispatch.
        pub fn drive(&mut self, pin: u8, level: Level) -> bool {
            let previous = self.levels[pin as usize];
            self.levels[pin as usize] = level;
            if previous == level {
                return false;
            }
            if self.gpio_func & (1 << pin) == 0 || self.inputs & (1 << pin) == 0 {
                return false;
            }
            if !self.edges[pin as usize].triggers(previous, level) {
                return false;
            }
            self.status |= 1 << pin;
            self.int_enabled && self.attached & (1 << pin) != 0
        }

        /// Latched-but-unserviced status for one pin
        pub fn pending(&self, pin: u8) -> bool {
            self.status & (1 << pin) != 0
        }

        /// Every mask written to the write-one-to-clear register, in order
        pub fn clear_writes(&self) -> &[u32] {
            &self.clear_writes
        }

        pub fn interrupts_enabled(&self) -> bool {
            self.int_enabled
        }

        pub fn is_initialized(&self) -> bool {
            self.initialized
        }

        pub fn pull(&self, pin: u8) -> PullMode {
            self.pulls[pin as usize]
        }

        pub fn edge(&self, pin: u8) -> EdgePolarity {
            self.edges[pin as usize]
        }

        pub fn is_attached(&self, pin: u8) -> bool {
            self.attached & (1 << pin) != 0
        }

        /// True if `attach` was ever called with the global line unmasked
        pub fn saw_attach_violation(&self) -> bool {
            self.attach_violation
        }

        /// Pre-latch a raw status bit, as a second edge arriving between
        /// the handler's read and clear would.
        pub fn latch_raw(&mut self, pin: u8) {
            self.status |= 1 << pin;
        }
    }

    impl Default for MockSoc {
        fn default() -> Self {
            Self::new()
        }
    }

    impl GpioRegisters for MockSoc {
        fn init(&mut self) {
            self.initialized = true;
        }

        fn select_gpio_function(&mut self, pin: u8) {
            self.gpio_func |= 1 << pin;
        }

        fn configure_input(&mut self, pin: u8, pull: PullMode) {
            self.inputs |= 1 << pin;
            self.pulls[pin as usize] = pull;
            // An input settles to the level its pull (or external resistor,
            // assumed present for Floating pulldown wiring) dictates.
            self.levels[pin as usize] = match pull {
                PullMode::PullUp => Level::High,
                PullMode::PullDown | PullMode::Floating => Level::Low,
            };
        }

        fn read_level(&mut self, pin: u8) -> Level {
            self.levels[pin as usize]
        }

        fn read_status(&mut self) -> u32 {
            self.status
        }

        fn clear_status(&mut self, mask: u32) {
            self.status &= !mask;
            self.clear_writes.push(mask).ok();
        }
    }

    impl InterruptControl for MockSoc {
        fn disable_all(&mut self) {
            self.int_enabled = false;
        }

        fn enable_all(&mut self) {
            self.int_enabled = true;
        }

        fn attach(&mut self, pin: u8) {
            if self.int_enabled {
                self.attach_violation = true;
            }
            self.attached |= 1 << pin;
        }

        fn set_edge(&mut self, pin: u8, polarity: EdgePolarity) {
            self.edges[pin as usize] = polarity;
        }
    }

    /// Mock of the single software-timer slot
    #[derive(Debug, Default)]
    pub struct MockTimerSlot {
        armed: bool,
        period_ms: u32,
        repeat: bool,
        arm_count: u32,
        disarm_count: u32,
        double_arm: bool,
    }

    impl MockTimerSlot {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn is_armed(&self) -> bool {
            self.armed
        }

        pub fn period_ms(&self) -> u32 {
            self.period_ms
        }

        pub fn repeats(&self) -> bool {
            self.repeat
        }

        pub fn arm_count(&self) -> u32 {
            self.arm_count
        }

        pub fn disarm_count(&self) -> u32 {
            self.disarm_count
        }

        /// True if `arm` was ever called on an already-armed slot,
        /// which would stack two timers on the hardware slot
        pub fn saw_double_arm(&self) -> bool {
            self.double_arm
        }
    }

    impl TimerSlot for MockTimerSlot {
        fn arm(&mut self, period_ms: u32, repeat: bool) {
            if self.armed {
                self.double_arm = true;
            }
            self.armed = true;
            self.period_ms = period_ms;
            self.repeat = repeat;
            self.arm_count += 1;
        }

        fn disarm(&mut self) {
            self.armed = false;
            self.disarm_count += 1;
        }
    }
}
