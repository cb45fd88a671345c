//! Vibration motor control module for PineTime
//!
//! Implementation based upon https://wiki.pine64.org/wiki/PineTime.

use contrast_dots::VibePattern;
use embassy_nrf::{gpio::Output, peripherals::P0_16};
use embassy_time::Timer;

#[derive(Clone, Copy)]
/// Pulse length in milliseconds
pub enum PulseLength {
    /// 200ms pulse
    SHORT = 200,
    /// 400 ms pulse
    LONG = 400,
}

/// Pause between the pulses of a repeated pattern
const PULSE_GAP_MS: u64 = 150;

pub struct Vibrator {
    /// Motor enable pin (inverted)
    pin_enable: Output<'static, P0_16>,
}

impl Vibrator {
    /// Configure vibrator on boot, with the motor off
    pub fn init(mut pin_enable: Output<'static, P0_16>) -> Self {
        pin_enable.set_high();
        Self { pin_enable }
    }

    /// Play one of the watchface vibration patterns.
    pub async fn play(&mut self, pattern: VibePattern) {
        match pattern {
            VibePattern::Short => self.pulse(PulseLength::SHORT, 1).await,
            VibePattern::Long => self.pulse(PulseLength::LONG, 1).await,
            VibePattern::Double => self.pulse(PulseLength::SHORT, 2).await,
        }
    }

    /// Pulse the vibrator `times` times for the specified pulse length.
    pub async fn pulse(&mut self, length: PulseLength, times: u8) {
        for i in 0..times {
            if i > 0 {
                Timer::after_millis(PULSE_GAP_MS).await;
            }
            self.pin_enable.set_low();
            Timer::after_millis(length as u64).await;
            self.pin_enable.set_high();
        }
    }
}
