//! Host-side doubles for the display and the runtime

use core::convert::Infallible;

use embassy_time::Duration;
use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{PointsIter, Rectangle},
};

use crate::{
    event::{EventSource, VibePattern},
    ui::{
        screen::{Screen, Surface},
        Runtime,
    },
};

/// In-memory monochrome display. Pixels outside the buffer are dropped.
pub struct FrameBuffer {
    size: Size,
    pixels: Vec<BinaryColor>,
}

impl FrameBuffer {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            pixels: vec![BinaryColor::Off; (size.width * size.height) as usize],
        }
    }

    fn offset(&self, point: Point) -> Option<usize> {
        let inside = point.x >= 0
            && point.y >= 0
            && (point.x as u32) < self.size.width
            && (point.y as u32) < self.size.height;
        inside.then(|| point.y as usize * self.size.width as usize + point.x as usize)
    }

    pub fn pixel(&self, point: Point) -> BinaryColor {
        self.offset(point)
            .map_or(BinaryColor::Off, |offset| self.pixels[offset])
    }

    /// Number of lit pixels inside `area`
    pub fn count_on(&self, area: &Rectangle) -> usize {
        area.points()
            .filter(|p| self.pixel(*p) == BinaryColor::On)
            .count()
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        self.size
    }
}

impl DrawTarget for FrameBuffer {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(offset) = self.offset(point) {
                self.pixels[offset] = color;
            }
        }
        Ok(())
    }
}

/// Runtime that keeps real surface bookkeeping and records every side effect.
#[derive(Default)]
pub struct RecordingRuntime {
    pub screen: Screen,
    pub dirty_marks: Vec<Surface>,
    pub vibrations: Vec<VibePattern>,
    pub resyncs: Vec<Duration>,
}

impl RecordingRuntime {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Runtime for RecordingRuntime {
    fn register_surface(&mut self, surface: Surface, bounds: Rectangle) {
        self.screen.register(surface, bounds);
    }

    fn release_surface(&mut self, surface: Surface) {
        self.screen.release(surface);
    }

    fn subscribe(&mut self, source: EventSource) {
        self.screen.subscribe(source);
    }

    fn unsubscribe(&mut self, source: EventSource) {
        self.screen.unsubscribe(source);
    }

    fn mark_dirty(&mut self, surface: Surface) {
        self.dirty_marks.push(surface);
        self.screen.mark_dirty(surface);
    }

    fn vibrate(&mut self, pattern: VibePattern) {
        self.vibrations.push(pattern);
    }

    fn invert_region(&mut self, region: Rectangle) {
        self.screen.set_inverted(region);
    }

    fn schedule_resync(&mut self, delay: Duration) {
        self.resyncs.push(delay);
    }
}
