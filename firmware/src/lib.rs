#![cfg_attr(not(feature = "std"), no_std)]

//! Firmware library wiring the event core to the SoC layer and the
//! cooperative task runners

pub use static_cell::StaticCell;

pub use beacon_core::*;

// Re-export hardware implementations
pub use crate::esp8266_hardware::*;
pub use crate::tasks::*;

// ESP8266 hardware module
pub mod esp8266_hardware;

// Embassy tasks module
pub mod tasks {
    use crate::esp8266_hardware::{Esp8266Soc, Esp8266UdpSocket};
    use beacon_core::{EdgeWatcher, PeriodicBeacon, PinWatch};
    use embassy_time::Timer;

    /// Beacon runner: the awaited timer stands in for the os_timer slot
    #[embassy_executor::task]
    pub async fn beacon_runner(beacon: &'static mut PeriodicBeacon<Esp8266UdpSocket>) {
        #[cfg(feature = "defmt")]
        defmt::info!("beacon task started");
        beacon_core::beacon::beacon_task(beacon).await
    }

    /// Cooperative dispatch for the edge watcher: the vector latches the
    /// edge through `Esp8266Soc::note_edge`, this task services it.
    #[embassy_executor::task]
    pub async fn edge_monitor(
        watcher: &'static mut EdgeWatcher<&'static Esp8266Soc>,
        watch: &'static PinWatch,
    ) {
        #[cfg(feature = "defmt")]
        defmt::info!("edge monitor started on GPIO{=u8}", watch.pin());

        loop {
            if watcher.hardware().pending(watch.pin()) {
                let event = watcher.service(watch);
                #[cfg(feature = "defmt")]
                defmt::debug!(
                    "edge {=u32} level {=u8} status {=u32:x}",
                    event.count,
                    event.level.as_bit(),
                    event.status
                );
                let _ = event;
            }
            Timer::after_millis(1).await;
        }
    }
}
