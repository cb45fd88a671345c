//! Battery status check
//!
//! Implementation based upon https://github.com/dbrgn/pinetime-rtic/blob/master/pinetime-rtic/src/battery.rs
//! and https://wiki.pine64.org/wiki/PineTime.

use embassy_nrf::{gpio::Input, peripherals::P0_12, saadc::Saadc};

/// Battery state as shown on the watchface and over bluetooth
#[derive(Clone, Copy, PartialEq, Eq, defmt::Format)]
pub struct BatteryInfo {
    /// Battery capacity in percent
    pub percent: u8,
    /// Charging state
    pub charging: bool,
}

/// Battery API
pub struct Battery {
    /// ADC instance for battery voltage measurement
    adc: Saadc<'static, 1>,
    /// Charge indication pin:
    /// high = battery, low = charging
    pin_charge_indication: Input<'static, P0_12>,
    /// Last reported state
    last: Option<BatteryInfo>,
}

impl Battery {
    /// Configure battery settings on boot
    pub fn init(adc: Saadc<'static, 1>, charge_pin: Input<'static, P0_12>) -> Self {
        Self {
            adc,
            pin_charge_indication: charge_pin,
            last: None,
        }
    }

    /// Measure the battery and return the new state if it differs from the last one.
    pub async fn update(&mut self) -> Result<Option<BatteryInfo>, Error> {
        let info = BatteryInfo {
            percent: percent_from_millivolts(self.millivolts().await?),
            charging: self.pin_charge_indication.is_low(),
        };

        if self.last == Some(info) {
            return Ok(None);
        }
        self.last = Some(info);
        Ok(Some(info))
    }

    /// Battery voltage in millivolts
    async fn millivolts(&mut self) -> Result<u16, Error> {
        let mut buf = [0; 1];
        self.adc.sample(&mut buf).await;
        match buf[0] {
            // For detailed explanation of formula check https://wiki.pine64.org/wiki/PineTime
            // Use u32 during calculation to prevent overflow
            raw @ 0..=4095 => Ok((raw as u32 * 2000 / 1241) as u16),
            _ => Err(Error::InvalidMeasurement),
        }
    }
}

/// Estimate LiPo capacity from its voltage with fixed data points and linear
/// interpolation in between.
fn percent_from_millivolts(voltage: u16) -> u8 {
    (match voltage {
        0..=3449 => 0,
        3450..=3699 => (voltage - 3450) / 5,
        3700..=4199 => 50 + (voltage - 3700) / 10,
        _ => 100,
    }) as u8
}

#[derive(Debug, defmt::Format)]
pub enum Error {
    InvalidMeasurement,
}
