//! GPIO edge watcher: pin state, setup protocol, and the interrupt handler

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::hal::{GpioRegisters, HalError, InterruptControl};
use crate::types::{Level, PullMode, WatchVariant, MAX_GPIO};

/// Per-pin watch state.
///
/// Safe to place in a `static` and share with the interrupt handler: the
/// counter and the last-observed snapshot are atomics, and only
/// `EdgeWatcher::service` (running inside the interrupts-disabled critical
/// section) ever writes them.
pub struct PinWatch {
    pin: u8,
    variant: WatchVariant,
    events: AtomicU32,
    last_level: AtomicBool,
    last_status: AtomicU32,
}

impl PinWatch {
    /// Create watch state for one pin
    pub const fn new(pin: u8, variant: WatchVariant) -> Self {
        Self {
            pin,
            variant,
            events: AtomicU32::new(0),
            last_level: AtomicBool::new(false),
            last_status: AtomicU32::new(0),
        }
    }

    /// Watched pin number
    pub fn pin(&self) -> u8 {
        self.pin
    }

    /// Wiring variant chosen at setup time
    pub fn variant(&self) -> WatchVariant {
        self.variant
    }

    /// Pull resistor the variant configures
    pub fn pull(&self) -> PullMode {
        self.variant.pull()
    }

    /// Number of qualifying edges serviced so far. Increments by exactly
    /// one per handler entry and wraps at the integer width.
    pub fn event_count(&self) -> u32 {
        self.events.load(Ordering::Relaxed)
    }

    /// Pin level sampled during the most recent handler entry
    pub fn last_level(&self) -> Level {
        if self.last_level.load(Ordering::Relaxed) {
            Level::High
        } else {
            Level::Low
        }
    }

    /// Raw status mask read during the most recent handler entry
    pub fn last_status(&self) -> u32 {
        self.last_status.load(Ordering::Relaxed)
    }

    /// Record one serviced edge. Called only from `EdgeWatcher::service`,
    /// inside the critical section. Returns the new count.
    fn record(&self, level: Level, status: u32) -> u32 {
        self.last_level.store(level.is_high(), Ordering::Relaxed);
        self.last_status.store(status, Ordering::Relaxed);
        self.events.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Reset counters and snapshots (for testing)
    #[cfg(feature = "test-utils")]
    pub fn reset(&self) {
        self.events.store(0, Ordering::Relaxed);
        self.last_level.store(false, Ordering::Relaxed);
        self.last_status.store(0, Ordering::Relaxed);
    }
}

/// Snapshot returned by one handler entry, for the debug sink
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EdgeEvent {
    /// Event count after this edge
    pub count: u32,
    /// Pin level read inside the handler
    pub level: Level,
    /// Aggregate status mask read inside the handler
    pub status: u32,
}

/// Owns the hardware handle and runs the edge life-cycle on it.
///
/// One owner for both the register block and the interrupt controller keeps
/// every register access inside this type, which is what upholds the
/// critical-section invariant around the handler's read+clear.
pub struct EdgeWatcher<H> {
    hw: H,
}

impl<H> EdgeWatcher<H>
where
    H: GpioRegisters + InterruptControl,
{
    pub fn new(hw: H) -> Self {
        Self { hw }
    }

    /// Configure the pin and arm its interrupt.
    ///
    /// The step order is load-bearing: the pad mux must be selected before
    /// any pull configuration, the handler must be attached with the global
    /// line masked, and stale latched status must be cleared before the
    /// line is unmasked or the first enable fires on a phantom edge.
    pub fn setup(&mut self, watch: &PinWatch) -> Result<(), HalError> {
        if watch.pin() >= MAX_GPIO {
            return Err(HalError::InvalidConfig);
        }

        let variant = watch.variant();
        self.hw.init();
        self.hw.select_gpio_function(watch.pin());
        self.hw.disable_all();
        self.hw.configure_input(watch.pin(), variant.pull());
        self.hw.clear_status(1 << watch.pin());
        self.hw.attach(watch.pin());
        self.hw.set_edge(watch.pin(), variant.polarity());
        self.hw.enable_all();

        #[cfg(feature = "defmt")]
        defmt::info!("edge watch armed on GPIO{=u8}", watch.pin());

        Ok(())
    }

    /// The interrupt handler body, to be called on every qualifying edge.
    ///
    /// Masks the global line, reads the aggregate status and the pin level,
    /// counts the edge, clears exactly the status bits it read (clearing a
    /// fixed mask instead would race an edge latched on another pin between
    /// the read and the clear), then unmasks. No debounce: a bouncing
    /// contact is counted once per electrical edge.
    pub fn service(&mut self, watch: &PinWatch) -> EdgeEvent {
        self.hw.disable_all();

        let status = self.hw.read_status();
        let level = self.hw.read_level(watch.pin());
        let count = watch.record(level, status);
        self.hw.clear_status(status);

        self.hw.enable_all();

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "edge {=u32}: level {=u8} status {=u32:x}",
            count,
            level.as_bit(),
            status
        );

        EdgeEvent {
            count,
            level,
            status,
        }
    }

    /// Access the hardware handle (test harnesses drive edges through it)
    pub fn hardware(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Release the hardware handle
    pub fn free(self) -> H {
        self.hw
    }
}
