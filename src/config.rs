//! Watchface configuration

use embassy_time::Duration;

/// Compile-time watchface parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchfaceConfig {
    /// Radius of every hour dot in pixels
    pub hour_radius: u32,
    /// Radius of every minute dot in pixels
    pub minute_radius: u32,
    /// Time to wait after a bluetooth reconnect before trusting the wall clock again
    pub settle_delay: Duration,
}

impl WatchfaceConfig {
    pub const DEFAULT: Self = Self {
        hour_radius: 6,
        minute_radius: 6,
        settle_delay: Duration::from_secs(10),
    };
}

impl Default for WatchfaceConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
