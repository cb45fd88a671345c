//! Dot-grid watchface
//!
//! Hours are drawn as two columns of twelve dots on the left, minutes as six columns
//! of ten dots on the right. The dot before the current hour is the only filled hour
//! dot, while the dot before the current minute is the only hollow minute dot. A
//! battery gauge inverts the bottom of the hour column.

use chrono::Timelike;
use embassy_time::Duration;
use embedded_graphics::{
    geometry::{Point, Size},
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::{Circle, PrimitiveStyle, Rectangle},
};

use super::{screen::Surface, Runtime, WatchFace, WatchFaceState};
use crate::{
    config::WatchfaceConfig,
    event::{Event, EventSource, TimeUnit, VibePattern},
    layout::{LayoutError, WatchLayout, HOUR_DOTS, MINUTE_DOTS},
};

/// Time shown on the face
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClockState {
    pub hour: u8,
    pub minute: u8,
}

/// Bluetooth link state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl From<bool> for ConnectionState {
    fn from(connected: bool) -> Self {
        if connected {
            Self::Connected
        } else {
            Self::Disconnected
        }
    }
}

/// Dot-grid watchface
pub struct DotWatchface {
    layout: WatchLayout,
    clock: ClockState,
    connection: ConnectionState,
    settle_delay: Duration,
}

impl DotWatchface {
    /// Lay out the watchface for a display of size `display`.
    pub fn new(display: Size, config: &WatchfaceConfig) -> Result<Self, LayoutError> {
        Ok(Self {
            layout: WatchLayout::new(display, config)?,
            clock: ClockState::default(),
            connection: ConnectionState::default(),
            settle_delay: config.settle_delay,
        })
    }

    pub fn layout(&self) -> &WatchLayout {
        &self.layout
    }

    pub fn clock(&self) -> ClockState {
        self.clock
    }

    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// Register the surfaces, show the startup state and subscribe to the runtime's
    /// notification services.
    pub fn init<R: Runtime>(&mut self, runtime: &mut R, state: WatchFaceState) {
        info!("Initializing dot watchface");

        runtime.register_surface(Surface::Hours, self.layout.hour_surface());
        runtime.register_surface(Surface::Minutes, self.layout.minute_surface());
        runtime.mark_dirty(Surface::Hours);
        runtime.mark_dirty(Surface::Minutes);

        self.on_tick(state.time.hour() as u8, state.time.minute() as u8, runtime);
        self.on_battery_change(state.percent, runtime);
        self.connection = state.connected.into();

        runtime.subscribe(EventSource::ClockTick(TimeUnit::Minute));
        runtime.subscribe(EventSource::Connection);
        runtime.subscribe(EventSource::Battery);
    }

    /// Unsubscribe from every service and give the surfaces back to the runtime.
    pub fn deinit<R: Runtime>(self, runtime: &mut R) {
        runtime.unsubscribe(EventSource::Battery);
        runtime.unsubscribe(EventSource::Connection);
        runtime.unsubscribe(EventSource::ClockTick(TimeUnit::Minute));
        runtime.invert_region(Rectangle::zero());
        runtime.release_surface(Surface::Minutes);
        runtime.release_surface(Surface::Hours);
    }

    /// Show a new time. The hour surface is only redrawn when the hour changed.
    pub fn on_tick<R: Runtime>(&mut self, hour: u8, minute: u8, runtime: &mut R) {
        debug!("Tick {}:{}", hour, minute);
        if self.clock.hour != hour {
            self.clock.hour = hour;
            runtime.mark_dirty(Surface::Hours);
        }
        self.clock.minute = minute;
        runtime.mark_dirty(Surface::Minutes);
    }

    /// Adopt the wall-clock time after a reconnect and redraw both grids.
    pub fn on_resync<R: Runtime>(&mut self, hour: u8, minute: u8, runtime: &mut R) {
        info!("Clock resynced to {}:{}", hour, minute);
        self.clock = ClockState { hour, minute };
        runtime.mark_dirty(Surface::Hours);
        runtime.mark_dirty(Surface::Minutes);
    }

    /// Vibrate on link changes and schedule a clock resync after a reconnect.
    pub fn on_connection_change<R: Runtime>(&mut self, connected: bool, runtime: &mut R) {
        match (self.connection, ConnectionState::from(connected)) {
            (ConnectionState::Connected, ConnectionState::Disconnected) => {
                info!("Bluetooth disconnected");
                self.connection = ConnectionState::Disconnected;
                runtime.vibrate(VibePattern::Long);
            }
            (ConnectionState::Disconnected, ConnectionState::Connected) => {
                info!("Bluetooth connected");
                self.connection = ConnectionState::Connected;
                runtime.vibrate(VibePattern::Double);
                // The phone may have changed the time, e.g. after crossing time zones.
                runtime.schedule_resync(self.settle_delay);
            }
            _ => {}
        }
    }

    /// Move the inverted battery gauge to match `percent`.
    pub fn on_battery_change<R: Runtime>(&mut self, percent: u8, runtime: &mut R) {
        debug!("Battery at {}%", percent);
        runtime.invert_region(battery_indicator(percent, self.layout.display()));
    }

    /// Index of the single filled hour dot
    pub fn highlighted_hour(&self) -> usize {
        (self.clock.hour as usize + HOUR_DOTS - 1) % HOUR_DOTS
    }

    /// Index of the single hollow minute dot
    pub fn highlighted_minute(&self) -> usize {
        (self.clock.minute as usize + MINUTE_DOTS - 1) % MINUTE_DOTS
    }

    /// Draw the hour grid in hour surface coordinates.
    pub fn render_hour_grid<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let grid = self.layout.hours();
        let highlighted = self.highlighted_hour();

        target.clear(BinaryColor::Off)?;
        for (i, center) in grid.points().iter().enumerate() {
            let style = if i == highlighted { FILLED } else { HOLLOW };
            dot(center, grid.radius()).into_styled(style).draw(target)?;
        }
        Ok(())
    }

    /// Draw the minute grid in minute surface coordinates.
    pub fn render_minute_grid<D>(&self, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        let grid = self.layout.minutes();
        let highlighted = self.highlighted_minute();

        target.clear(BinaryColor::Off)?;
        for (i, center) in grid.points().iter().enumerate() {
            let style = if i == highlighted { HOLLOW } else { FILLED };
            dot(center, grid.radius()).into_styled(style).draw(target)?;
        }
        Ok(())
    }
}

impl WatchFace for DotWatchface {
    fn handle_event<R: Runtime>(&mut self, event: Event, runtime: &mut R) {
        match event {
            Event::Tick { hour, minute } => self.on_tick(hour, minute, runtime),
            Event::ConnectionChanged(connected) => self.on_connection_change(connected, runtime),
            Event::BatteryChanged(percent) => self.on_battery_change(percent, runtime),
            Event::Resync { hour, minute } => self.on_resync(hour, minute, runtime),
        }
    }

    fn draw<D>(&self, surface: Surface, target: &mut D) -> Result<(), D::Error>
    where
        D: DrawTarget<Color = BinaryColor>,
    {
        match surface {
            Surface::Hours => self.render_hour_grid(target),
            Surface::Minutes => self.render_minute_grid(target),
        }
    }
}

const FILLED: PrimitiveStyle<BinaryColor> = PrimitiveStyle::with_fill(BinaryColor::On);
const HOLLOW: PrimitiveStyle<BinaryColor> = PrimitiveStyle::with_stroke(BinaryColor::On, 1);

fn dot(center: Point, radius: u32) -> Circle {
    Circle::with_center(center, 2 * radius + 1)
}

/// Battery gauge: the bottom `percent` of the display height, as wide as the hour
/// surface.
pub fn battery_indicator(percent: u8, display: Size) -> Rectangle {
    let height = u32::from(percent.min(100)) * display.height / 100;
    Rectangle::new(
        Point::new(0, (display.height - height) as i32),
        Size::new(display.width * 2 / 7, height),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FrameBuffer, RecordingRuntime};
    use chrono::NaiveTime;

    const REFERENCE: Size = Size::new(144, 168);

    fn face() -> DotWatchface {
        DotWatchface::new(REFERENCE, &WatchfaceConfig::DEFAULT).unwrap()
    }

    fn started(connected: bool) -> (DotWatchface, RecordingRuntime) {
        let mut face = face();
        let mut runtime = RecordingRuntime::new();
        face.init(
            &mut runtime,
            WatchFaceState {
                time: NaiveTime::from_hms_opt(10, 30, 0).unwrap(),
                connected,
                percent: 100,
            },
        );
        // Paint the startup frame so every surface starts clean
        let mut fb = FrameBuffer::new(REFERENCE);
        runtime.screen.redraw(&face, &mut fb).unwrap();
        runtime.dirty_marks.clear();
        (face, runtime)
    }

    /// Indices of the dots whose center pixel is lit
    fn lit_centers(fb: &FrameBuffer, points: impl Iterator<Item = Point>) -> Vec<usize> {
        points
            .enumerate()
            .filter(|(_, p)| fb.pixel(*p) == BinaryColor::On)
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_init_registers_and_subscribes() {
        let (face, runtime) = started(true);
        let screen = &runtime.screen;

        assert_eq!(screen.bounds(Surface::Hours), Some(face.layout().hour_surface()));
        assert_eq!(screen.bounds(Surface::Minutes), Some(face.layout().minute_surface()));
        assert!(screen.is_subscribed(EventSource::ClockTick(TimeUnit::Minute)));
        assert!(screen.is_subscribed(EventSource::Connection));
        assert!(screen.is_subscribed(EventSource::Battery));
        assert_eq!(face.clock(), ClockState { hour: 10, minute: 30 });
        assert_eq!(face.connection(), ConnectionState::Connected);
        assert!(runtime.vibrations.is_empty(), "startup state must not vibrate");
    }

    #[test]
    fn test_deinit_releases_everything() {
        let (face, mut runtime) = started(false);
        face.deinit(&mut runtime);
        assert!(runtime.screen.is_idle());
    }

    #[test]
    fn test_tick_only_redraws_hours_on_change() {
        let (mut face, mut runtime) = started(false);

        face.handle_event(Event::Tick { hour: 10, minute: 31 }, &mut runtime);
        assert_eq!(runtime.dirty_marks, vec![Surface::Minutes]);

        runtime.dirty_marks.clear();
        face.handle_event(Event::Tick { hour: 11, minute: 0 }, &mut runtime);
        assert_eq!(runtime.dirty_marks, vec![Surface::Hours, Surface::Minutes]);
    }

    #[test]
    fn test_repeated_tick_marks_hours_once() {
        let mut face = face();
        let mut runtime = RecordingRuntime::new();

        face.on_tick(7, 15, &mut runtime);
        face.on_tick(7, 15, &mut runtime);

        let hours = runtime.dirty_marks.iter().filter(|s| **s == Surface::Hours).count();
        let minutes = runtime.dirty_marks.iter().filter(|s| **s == Surface::Minutes).count();
        assert!(hours <= 1, "hour surface marked {} times", hours);
        assert_eq!(minutes, 2, "minute surface is marked on every tick");
    }

    #[test]
    fn test_hour_highlight_is_previous_slot() {
        let mut face = face();
        let mut runtime = RecordingRuntime::new();
        let size = face.layout().hour_surface().size;

        for hour in 0..24u8 {
            face.on_tick(hour, 0, &mut runtime);
            let mut fb = FrameBuffer::new(size);
            face.render_hour_grid(&mut fb).unwrap();

            let filled = lit_centers(&fb, face.layout().hours().points().iter());
            let expected = (hour as usize + 23) % 24;
            assert_eq!(filled, vec![expected], "hour {}", hour);
            assert_ne!(expected, hour as usize);
        }
    }

    #[test]
    fn test_minute_hollow_is_previous_slot() {
        let mut face = face();
        let mut runtime = RecordingRuntime::new();
        let size = face.layout().minute_surface().size;

        for minute in 0..60u8 {
            face.on_tick(12, minute, &mut runtime);
            let mut fb = FrameBuffer::new(size);
            face.render_minute_grid(&mut fb).unwrap();

            let filled = lit_centers(&fb, face.layout().minutes().points().iter());
            let hollow: Vec<usize> = (0..60).filter(|i| !filled.contains(i)).collect();
            assert_eq!(hollow, vec![(minute as usize + 59) % 60], "minute {}", minute);
        }
    }

    #[test]
    fn test_disconnect_vibrates_long() {
        let (mut face, mut runtime) = started(true);

        face.handle_event(Event::ConnectionChanged(false), &mut runtime);
        assert_eq!(runtime.vibrations, vec![VibePattern::Long]);
        assert!(runtime.resyncs.is_empty(), "a disconnect never refreshes the clock");
        assert!(runtime.dirty_marks.is_empty());

        // Repeated reports of the same state are ignored
        face.handle_event(Event::ConnectionChanged(false), &mut runtime);
        assert_eq!(runtime.vibrations.len(), 1);
    }

    #[test]
    fn test_reconnect_resyncs_after_settling() {
        let (mut face, mut runtime) = started(false);

        face.handle_event(Event::ConnectionChanged(true), &mut runtime);
        assert_eq!(runtime.vibrations, vec![VibePattern::Double]);
        assert_eq!(runtime.resyncs, vec![Duration::from_secs(10)]);
        assert!(runtime.dirty_marks.is_empty(), "nothing redraws before the delay");

        // The runtime delivers the wall-clock time once the delay elapsed
        face.handle_event(Event::Resync { hour: 10, minute: 30 }, &mut runtime);
        assert_eq!(face.clock(), ClockState { hour: 10, minute: 30 });
        assert!(runtime.screen.is_dirty(Surface::Hours));
        assert!(runtime.screen.is_dirty(Surface::Minutes));

        let mut fb = FrameBuffer::new(REFERENCE);
        assert_eq!(runtime.screen.redraw(&face, &mut fb).unwrap(), 2);
        assert_eq!(runtime.resyncs.len(), 1);
    }

    #[test]
    fn test_battery_indicator() {
        assert_eq!(
            battery_indicator(50, REFERENCE),
            Rectangle::new(Point::new(0, 84), Size::new(41, 84))
        );
        assert_eq!(
            battery_indicator(100, REFERENCE),
            Rectangle::new(Point::zero(), Size::new(41, 168))
        );
        assert!(battery_indicator(0, REFERENCE).is_zero_sized());
        assert_eq!(battery_indicator(250, REFERENCE), battery_indicator(100, REFERENCE));
    }

    #[test]
    fn test_battery_change_inverts_hour_column() {
        let (mut face, mut runtime) = started(false);

        face.handle_event(Event::BatteryChanged(50), &mut runtime);
        assert_eq!(
            runtime.screen.inverted(),
            Some(Rectangle::new(Point::new(0, 84), Size::new(41, 84)))
        );
        assert!(runtime.screen.is_dirty(Surface::Hours));
        assert!(!runtime.screen.is_dirty(Surface::Minutes));

        let mut fb = FrameBuffer::new(REFERENCE);
        runtime.screen.mark_dirty(Surface::Minutes);
        runtime.screen.redraw(&face, &mut fb).unwrap();

        // Background is dark above the gauge and lit inside it
        assert_eq!(fb.pixel(Point::new(0, 0)), BinaryColor::Off);
        assert_eq!(fb.pixel(Point::new(0, 167)), BinaryColor::On);
        // Minute surface is untouched by the gauge
        assert_eq!(fb.pixel(Point::new(41, 167)), BinaryColor::Off);

        // Dot centers below the split flip: hollow hour dots now show a lit center
        let hours = face.layout().hours();
        for (i, center) in hours.points().iter().enumerate() {
            let hollow = i != face.highlighted_hour();
            let inverted = center.y >= 84;
            let expected = if hollow == inverted { BinaryColor::On } else { BinaryColor::Off };
            assert_eq!(fb.pixel(center), expected, "hour dot {}", i);
        }
    }
}
