//! Display control module for PineTime

use embassy_nrf::{
    gpio::Output,
    peripherals::{P0_14, P0_18, P0_22, P0_23, P0_25, P0_26, SPI2},
    spim::Spim,
};

use contrast_dots::{Screen, WatchFace};
use display_interface_spi::SPIInterface;
use embassy_time::Delay;
use embedded_graphics::{
    pixelcolor::{BinaryColor, Rgb565},
    prelude::*,
};
use mipidsi::{models::ST7789, Builder, Orientation};

const LCD_W: u16 = 240;
const LCD_H: u16 = 240;

/// Brightness used while the watchface is shown (0 = off, 7 = max)
const BRIGHTNESS: u8 = 2;

type Lcd = mipidsi::Display<
    SPIInterface<Spim<'static, SPI2>, Output<'static, P0_18>, Output<'static, P0_25>>,
    ST7789,
    Output<'static, P0_26>,
>;

/// Backlight pins
///
/// There are three active-low backlight pins, each connected to a FET that
/// toggles backlight power through a resistor (2.2 kΩ, 100 Ω and 30 Ω).
/// Through combinations of these pins, 7 brightness levels (+ off) can be
/// configured.
pub struct BacklightPins {
    pub low: Output<'static, P0_14>,
    pub mid: Output<'static, P0_22>,
    pub high: Output<'static, P0_23>,
}

pub struct Display {
    lcd: Lcd,
    backlight: BacklightPins,
}

impl Display {
    /// Configure display settings on boot
    pub fn init(
        spim: Spim<'static, SPI2>,
        cs_pin: Output<'static, P0_25>,
        dc_pin: Output<'static, P0_18>,
        rst_pin: Output<'static, P0_26>,
        backlight: BacklightPins,
    ) -> Result<Self, Error> {
        let mut lcd = Builder::st7789(SPIInterface::new(spim, dc_pin, cs_pin))
            .with_display_size(LCD_W, LCD_H)
            .with_orientation(Orientation::Portrait(false))
            .init(&mut Delay, Some(rst_pin))
            .map_err(|_| Error::Init)?;
        lcd.clear(Rgb565::BLACK).map_err(|_| Error::Draw)?;

        let mut display = Self { lcd, backlight };
        display.set_brightness(BRIGHTNESS);
        Ok(display)
    }

    pub fn size(&self) -> Size {
        Size::new(LCD_W as u32, LCD_H as u32)
    }

    /// Set the backlight brightness between 0 (off) and 7 (max), clamping higher values.
    pub fn set_brightness(&mut self, level: u8) {
        let level = level.min(7);
        defmt::debug!("Setting backlight brightness to {}", level);

        let pins = &mut self.backlight;
        pins.low.set_level((level & 0x01 == 0).into());
        pins.mid.set_level((level & 0x02 == 0).into());
        pins.high.set_level((level & 0x04 == 0).into());
    }

    /// Paint the dirty surfaces of `face`, white dots on black.
    pub fn redraw<F: WatchFace>(&mut self, screen: &mut Screen, face: &F) -> Result<usize, Error> {
        let mut target = self.lcd.color_converted::<BinaryColor>();
        screen.redraw(face, &mut target).map_err(|_| Error::Draw)
    }
}

#[derive(Debug, defmt::Format)]
pub enum Error {
    /// The controller did not come up
    Init,
    /// SPI transfer failed while drawing
    Draw,
}
