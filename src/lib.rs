//! Contrast Dots watchface
//!
//! Hardware-independent core of the watchface: the dot-grid layout engine and the
//! event-driven render state. The firmware binary (`firmware` feature) wires these
//! into the PineTime peripherals.

#![cfg_attr(not(test), no_std)]

// This must go first so the logging macros are visible to every other module.
#[macro_use]
mod fmt;

pub mod config;
pub mod event;
pub mod layout;
pub mod ui;

#[cfg(test)]
pub(crate) mod testing;

pub use config::WatchfaceConfig;
pub use event::{Event, EventSource, TimeUnit, VibePattern};
pub use layout::{LayoutError, WatchLayout};
pub use ui::{
    dot_watchface::DotWatchface,
    screen::{Screen, Surface},
    Runtime, WatchFace, WatchFaceState,
};
