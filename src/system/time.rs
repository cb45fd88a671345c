//! Time keeping module for PineTime
//!
//! There is no battery-backed RTC, so the clock starts from the build time and counts
//! uptime from there.

use chrono::{NaiveDateTime, NaiveTime};
use embassy_time::Instant;

#[derive(Clone, Copy)]
pub struct WallClock {
    /// Clock time at boot, in UTC
    reference: NaiveDateTime,
    /// Offset of local time from UTC, in seconds
    utc_offset: i64,
}

impl WallClock {
    /// Clock that read `epoch` seconds since 1970 (UTC) at boot.
    pub fn at_boot(epoch: i64, utc_offset: i64) -> Self {
        Self {
            reference: NaiveDateTime::from_timestamp_opt(epoch, 0).unwrap_or_default(),
            utc_offset,
        }
    }

    /// Current local time of day
    pub fn local_time(&self) -> NaiveTime {
        let uptime = Instant::now().as_secs() as i64;
        NaiveDateTime::from_timestamp_opt(self.reference.timestamp() + uptime + self.utc_offset, 0)
            .unwrap_or_default()
            .time()
    }
}
