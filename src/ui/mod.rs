//! UI definitions module

use chrono::NaiveTime;
use embassy_time::Duration;
use embedded_graphics::{pixelcolor::BinaryColor, prelude::DrawTarget, primitives::Rectangle};

use crate::event::{Event, EventSource, VibePattern};

pub mod dot_watchface;
pub mod screen;

use screen::Surface;

pub trait WatchFace {
    /// Update the watchface with one event from the runtime
    fn handle_event<R: Runtime>(&mut self, event: Event, runtime: &mut R);

    /// Draw `surface` in coordinates local to that surface
    fn draw<D>(&self, surface: Surface, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>;
}

/// State reported by the runtime when the watchface starts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchFaceState {
    pub time: NaiveTime,
    pub connected: bool,
    pub percent: u8,
}

/// Services the host runtime provides to a watchface.
///
/// Redraws are never synchronous: the watchface marks surfaces dirty and the runtime
/// paints them once the current event has been handled.
pub trait Runtime {
    /// Register a drawable surface in display coordinates
    fn register_surface(&mut self, surface: Surface, bounds: Rectangle);

    /// Drop a surface registered with `register_surface`
    fn release_surface(&mut self, surface: Surface);

    fn subscribe(&mut self, source: EventSource);

    fn unsubscribe(&mut self, source: EventSource);

    /// Request a redraw of `surface`
    fn mark_dirty(&mut self, surface: Surface);

    fn vibrate(&mut self, pattern: VibePattern);

    /// Invert every pixel inside `region`, replacing the previous region. A zero sized
    /// region removes the inversion.
    fn invert_region(&mut self, region: Rectangle);

    /// Deliver an `Event::Resync` with the wall-clock time once `delay` has passed
    fn schedule_resync(&mut self, delay: Duration);
}
