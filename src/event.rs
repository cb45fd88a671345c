//! Events dispatched into the watchface

use chrono::Timelike;

/// Notification delivered by the runtime, one at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Minute tick with the current local time
    Tick { hour: u8, minute: u8 },
    /// Bluetooth link came up (`true`) or went down (`false`)
    ConnectionChanged(bool),
    /// Battery charge in percent
    BatteryChanged(u8),
    /// Wall-clock time once the settling delay after a reconnect has passed
    Resync { hour: u8, minute: u8 },
}

impl Event {
    /// Minute tick for the given time of day.
    pub fn tick<T: Timelike>(time: &T) -> Self {
        Self::Tick {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    /// Clock resync for the given time of day.
    pub fn resync<T: Timelike>(time: &T) -> Self {
        Self::Resync {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    /// Subscription this event is delivered through. Resyncs are requested by the
    /// watchface itself and always delivered.
    pub fn source(&self) -> Option<EventSource> {
        match self {
            Self::Tick { .. } => Some(EventSource::ClockTick(TimeUnit::Minute)),
            Self::ConnectionChanged(_) => Some(EventSource::Connection),
            Self::BatteryChanged(_) => Some(EventSource::Battery),
            Self::Resync { .. } => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimeUnit {
    Second,
    Minute,
}

/// Notification service the watchface can subscribe to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventSource {
    ClockTick(TimeUnit),
    Connection,
    Battery,
}

/// Vibration motor pattern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum VibePattern {
    Short,
    Long,
    Double,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_tick_from_time() {
        let time = NaiveTime::from_hms_opt(23, 59, 42).unwrap();
        assert_eq!(Event::tick(&time), Event::Tick { hour: 23, minute: 59 });
        assert_eq!(Event::resync(&time), Event::Resync { hour: 23, minute: 59 });
    }

    #[test]
    fn test_event_sources() {
        assert_eq!(
            Event::Tick { hour: 1, minute: 2 }.source(),
            Some(EventSource::ClockTick(TimeUnit::Minute))
        );
        assert_eq!(Event::ConnectionChanged(true).source(), Some(EventSource::Connection));
        assert_eq!(Event::BatteryChanged(10).source(), Some(EventSource::Battery));
        assert_eq!(Event::Resync { hour: 1, minute: 2 }.source(), None);
    }
}
