//! ESP8266 hardware implementation
//!
//! NON-OS class SoC: one thread of cooperative execution, GPIO edges
//! preempt it at hardware speed, software timers interleave at yield
//! points. Register access below is modelled with atomics so the layer is
//! exercisable on a host; the comments mark where the real register
//! traffic goes.

use core::net::Ipv4Addr;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use beacon_core::net::{NetError, UdpSocket, UdpStack, ERR_ARG};
use beacon_core::{
    EdgePolarity, EdgeWatcher, GpioRegisters, InterruptControl, Level, PullMode, TimerSlot,
};
use static_cell::StaticCell;

/// GPIO register block addresses
pub mod regs {
    /// GPIO register block base
    pub const GPIO_BASE: u32 = 0x6000_0300;
    /// Input level register offset
    pub const GPIO_IN: u32 = GPIO_BASE + 0x18;
    /// Aggregate interrupt status register offset
    pub const GPIO_STATUS: u32 = GPIO_BASE + 0x1C;
    /// Write-one-to-clear companion of GPIO_STATUS
    pub const GPIO_STATUS_W1TC: u32 = GPIO_BASE + 0x24;
    /// IO_MUX pad configuration block base
    pub const IO_MUX_BASE: u32 = 0x6000_0800;
}

/// Pin assignment for the beacon board
pub mod pins {
    /// Watched input pin (the only free GPIO next to the UART pins)
    pub const WATCH_PIN: u8 = 2;
}

/// Sockets the connection stack can hold at once
pub const MAX_UDP_PCBS: usize = 4;

/// GPIO block plus interrupt controller of the SoC.
///
/// Atomic fields stand in for the memory-mapped registers; the interrupt
/// vector writes them through `note_edge` with only `&self`. The register
/// traits are implemented on `&Esp8266Soc` so the watcher and the vector
/// can share one `static` block, the way both share the real registers.
pub struct Esp8266Soc {
    int_enabled: AtomicBool,
    levels: AtomicU32,
    rising: AtomicU32,
    falling: AtomicU32,
    attached: AtomicU32,
    status: AtomicU32,
}

impl Esp8266Soc {
    pub const fn new() -> Self {
        Self {
            int_enabled: AtomicBool::new(false),
            levels: AtomicU32::new(0),
            rising: AtomicU32::new(0),
            falling: AtomicU32::new(0),
            attached: AtomicU32::new(0),
            status: AtomicU32::new(0),
        }
    }

    /// Called from the low-level GPIO vector on an observed transition:
    /// records the new level and latches the status bit when the pin's
    /// configured polarity matches. Latching happens whether or not the
    /// global line is masked, exactly like the hardware status register.
    pub fn note_edge(&self, pin: u8, level: Level) {
        let bit = 1u32 << pin;
        match level {
            Level::High => {
                self.levels.fetch_or(bit, Ordering::Relaxed);
                if self.rising.load(Ordering::Relaxed) & bit != 0 {
                    self.status.fetch_or(bit, Ordering::Relaxed);
                }
            }
            Level::Low => {
                self.levels.fetch_and(!bit, Ordering::Relaxed);
                if self.falling.load(Ordering::Relaxed) & bit != 0 {
                    self.status.fetch_or(bit, Ordering::Relaxed);
                }
            }
        }
    }

    /// Latched-but-unserviced status for one pin
    pub fn pending(&self, pin: u8) -> bool {
        self.status.load(Ordering::Relaxed) & (1 << pin) != 0
    }
}

impl Default for Esp8266Soc {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioRegisters for &Esp8266Soc {
    fn init(&mut self) {
        // gpio_init(): one-shot subsystem bring-up, idempotent
    }

    fn select_gpio_function(&mut self, _pin: u8) {
        // PIN_FUNC_SELECT(IO_MUX pad, FUNC_GPIOn): the pad may arrive from
        // boot routed to UART/SPI; nothing below is defined until this ran
    }

    fn configure_input(&mut self, pin: u8, pull: PullMode) {
        // gpio_output_set(0, 0, 0, BIT(pin)) plus PIN_PULLUP_EN/DIS.
        // The input settles to the level its pull dictates; Floating
        // assumes the board's external resistor (ActiveHigh wiring).
        let bit = 1u32 << pin;
        match pull {
            PullMode::PullUp => {
                self.levels.fetch_or(bit, Ordering::Relaxed);
            }
            PullMode::PullDown | PullMode::Floating => {
                self.levels.fetch_and(!bit, Ordering::Relaxed);
            }
        }
    }

    fn read_level(&mut self, pin: u8) -> Level {
        // GPIO_INPUT_GET(GPIO_ID_PIN(pin)) via regs::GPIO_IN
        if self.levels.load(Ordering::Relaxed) & (1 << pin) != 0 {
            Level::High
        } else {
            Level::Low
        }
    }

    fn read_status(&mut self) -> u32 {
        // GPIO_REG_READ(regs::GPIO_STATUS)
        self.status.load(Ordering::Relaxed)
    }

    fn clear_status(&mut self, mask: u32) {
        // GPIO_REG_WRITE(regs::GPIO_STATUS_W1TC, mask)
        self.status.fetch_and(!mask, Ordering::Relaxed);
    }
}

impl InterruptControl for &Esp8266Soc {
    fn disable_all(&mut self) {
        // ETS_GPIO_INTR_DISABLE()
        self.int_enabled.store(false, Ordering::Relaxed);
    }

    fn enable_all(&mut self) {
        // ETS_GPIO_INTR_ENABLE()
        self.int_enabled.store(true, Ordering::Relaxed);
    }

    fn attach(&mut self, pin: u8) {
        // ETS_GPIO_INTR_ATTACH(vector, arg); the caller holds the line
        // masked so the slot cannot fire half-configured
        self.attached.fetch_or(1 << pin, Ordering::Relaxed);
    }

    fn set_edge(&mut self, pin: u8, polarity: EdgePolarity) {
        // gpio_pin_intr_state_set(GPIO_ID_PIN(pin), GPIO_PIN_INTR_*)
        let bit = 1u32 << pin;
        let (rise, fall) = match polarity {
            EdgePolarity::None => (false, false),
            EdgePolarity::Rising => (true, false),
            EdgePolarity::Falling => (false, true),
            EdgePolarity::Both => (true, true),
        };
        if rise {
            self.rising.fetch_or(bit, Ordering::Relaxed);
        } else {
            self.rising.fetch_and(!bit, Ordering::Relaxed);
        }
        if fall {
            self.falling.fetch_or(bit, Ordering::Relaxed);
        } else {
            self.falling.fetch_and(!bit, Ordering::Relaxed);
        }
    }
}

/// The SoC's single repeating software-timer slot (os_timer).
pub struct Esp8266TimerSlot {
    armed: AtomicBool,
    period_ms: AtomicU32,
    repeat: AtomicBool,
}

impl Esp8266TimerSlot {
    pub const fn new() -> Self {
        Self {
            armed: AtomicBool::new(false),
            period_ms: AtomicU32::new(0),
            repeat: AtomicBool::new(false),
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Relaxed)
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms.load(Ordering::Relaxed)
    }
}

impl Default for Esp8266TimerSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerSlot for Esp8266TimerSlot {
    fn arm(&mut self, period_ms: u32, repeat: bool) {
        // os_timer_setfn(&timer, tick_trampoline, arg);
        // os_timer_arm(&timer, period_ms, repeat)
        self.period_ms.store(period_ms, Ordering::Relaxed);
        self.repeat.store(repeat, Ordering::Relaxed);
        self.armed.store(true, Ordering::Relaxed);
    }

    fn disarm(&mut self) {
        // os_timer_disarm(&timer); best-effort, an already dispatched
        // callback still runs
        self.armed.store(false, Ordering::Relaxed);
    }
}

/// One UDP protocol control block of the connection stack.
///
/// The stack sends to whatever remote endpoint sits in the control block
/// at call time and does not preserve it between sends, hence the
/// re-assert in the tick protocol.
pub struct Esp8266UdpSocket {
    local_port: u16,
    remote: Option<(Ipv4Addr, u16)>,
    pending_sent: u8,
    last_len: u16,
    total_sends: u32,
}

impl Esp8266UdpSocket {
    /// Datagrams handed to the stack since boot
    pub fn total_sends(&self) -> u32 {
        self.total_sends
    }
}

impl UdpSocket for Esp8266UdpSocket {
    fn set_remote(&mut self, addr: Ipv4Addr, port: u16) {
        // espconn->proto.udp->remote_ip / remote_port
        self.remote = Some((addr, port));
    }

    fn send(&mut self, payload: &[u8]) -> Result<u16, NetError> {
        // espconn_send(espconn, payload, len); negative return on a full
        // outbound queue or a downed link
        if self.remote.is_none() {
            return Err(NetError::TransmitError(ERR_ARG));
        }
        self.last_len = payload.len() as u16;
        self.pending_sent = self.pending_sent.saturating_add(1);
        self.total_sends = self.total_sends.wrapping_add(1);
        self.remote = None;
        Ok(self.last_len)
    }

    fn poll_sent(&mut self) -> Option<u16> {
        // The sent callback registered with espconn_regist_sentcb fires
        // here, once per queued datagram
        if self.pending_sent == 0 {
            return None;
        }
        self.pending_sent -= 1;
        Some(self.last_len)
    }

    fn local_port(&self) -> u16 {
        self.local_port
    }
}

/// The connection stack's finite PCB pool
pub struct Esp8266UdpStack {
    opened: usize,
}

impl Esp8266UdpStack {
    pub const fn new() -> Self {
        Self { opened: 0 }
    }
}

impl Default for Esp8266UdpStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UdpStack for Esp8266UdpStack {
    type Socket = Esp8266UdpSocket;

    fn open(&mut self, local_port: u16) -> Result<Esp8266UdpSocket, NetError> {
        if self.opened >= MAX_UDP_PCBS {
            return Err(NetError::ResourceExhausted);
        }
        // espconn_port() picks the ephemeral port when the caller passes 0
        let port = if local_port == 0 {
            1024 + self.opened as u16
        } else {
            local_port
        };
        self.opened += 1;
        Ok(Esp8266UdpSocket {
            local_port: port,
            remote: None,
            pending_sent: 0,
            last_len: 0,
            total_sends: 0,
        })
    }
}

/// The register block shared by the interrupt vector and the watcher
static SOC: Esp8266Soc = Esp8266Soc::new();

/// Register block handle, for inspecting latched state
pub fn soc() -> &'static Esp8266Soc {
    &SOC
}

static WATCHER: StaticCell<EdgeWatcher<&'static Esp8266Soc>> = StaticCell::new();

/// Initialize the global watcher over the SoC's register block
pub fn init_global_watcher() -> &'static mut EdgeWatcher<&'static Esp8266Soc> {
    WATCHER.init(EdgeWatcher::new(&SOC))
}

/// GPIO vector entry for the watched pin.
///
/// On hardware the transition is read off `regs::GPIO_IN`; here it arrives
/// as `level`. The vector only latches through `note_edge`; servicing
/// (read, count, W1TC clear, re-enable) stays with `EdgeWatcher::service`
/// driven by the cooperative monitor task.
pub fn handle_gpio_interrupt(level: Level) {
    SOC.note_edge(pins::WATCH_PIN, level);
}
