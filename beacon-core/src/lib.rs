#![cfg_attr(not(feature = "std"), no_std)]

//! # Beacon Core
//!
//! Embedded event core for a single-threaded, cooperative, OS-less target:
//! an edge-triggered GPIO watcher with a read-clear-rearm interrupt
//! protocol, and a periodic UDP beacon that re-binds its peer before every
//! send.

pub mod beacon;
pub mod hal;
pub mod net;
pub mod types;
pub mod watcher;

#[cfg(feature = "test-utils")]
pub mod test_utils;


pub use beacon::*;
pub use hal::{Duration, GpioRegisters, HalError, InterruptControl, LevelProbe, TimerSlot};
pub use net::{NetError, SendOutcome, UdpPeer, UdpSocket, UdpStack};
pub use types::*;
pub use watcher::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration: the fixed 8-byte payload to 192.168.4.2:8266
/// every two seconds.
pub fn default_config() -> BeaconConfig {
    BeaconConfig::default()
}
