//! Surface bookkeeping and composition
//!
//! Tracks the registered surfaces, their dirty flags, the inverted region and the
//! active subscriptions, and paints dirty surfaces onto a draw target.

use embedded_graphics::{
    pixelcolor::BinaryColor,
    prelude::*,
    primitives::Rectangle,
};

use crate::{
    event::{Event, EventSource, TimeUnit},
    ui::WatchFace,
};

/// Drawable region of the watchface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Surface {
    Hours,
    Minutes,
}

impl Surface {
    pub const ALL: [Surface; 2] = [Surface::Hours, Surface::Minutes];

    const fn index(self) -> usize {
        match self {
            Surface::Hours => 0,
            Surface::Minutes => 1,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Layer {
    bounds: Option<Rectangle>,
    dirty: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Subscriptions {
    tick: Option<TimeUnit>,
    connection: bool,
    battery: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Screen {
    layers: [Layer; 2],
    inverted: Option<Rectangle>,
    subscriptions: Subscriptions,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, surface: Surface, bounds: Rectangle) {
        self.layers[surface.index()] = Layer {
            bounds: Some(bounds),
            dirty: false,
        };
    }

    pub fn release(&mut self, surface: Surface) {
        self.layers[surface.index()] = Layer::default();
    }

    /// Display bounds of `surface`, if registered
    pub fn bounds(&self, surface: Surface) -> Option<Rectangle> {
        self.layers[surface.index()].bounds
    }

    pub fn mark_dirty(&mut self, surface: Surface) {
        self.layers[surface.index()].dirty = true;
    }

    pub fn is_dirty(&self, surface: Surface) -> bool {
        self.layers[surface.index()].dirty
    }

    /// Replace the inverted region and mark every surface it touched, before or after,
    /// as dirty.
    pub fn set_inverted(&mut self, region: Rectangle) {
        let region = (!region.is_zero_sized()).then_some(region);
        if region == self.inverted {
            return;
        }

        for surface in Surface::ALL {
            let Some(bounds) = self.bounds(surface) else {
                continue;
            };
            let touched = [self.inverted, region]
                .into_iter()
                .flatten()
                .any(|r| !r.intersection(&bounds).is_zero_sized());
            if touched {
                self.mark_dirty(surface);
            }
        }
        self.inverted = region;
    }

    pub fn inverted(&self) -> Option<Rectangle> {
        self.inverted
    }

    pub fn subscribe(&mut self, source: EventSource) {
        match source {
            EventSource::ClockTick(unit) => self.subscriptions.tick = Some(unit),
            EventSource::Connection => self.subscriptions.connection = true,
            EventSource::Battery => self.subscriptions.battery = true,
        }
    }

    pub fn unsubscribe(&mut self, source: EventSource) {
        match source {
            EventSource::ClockTick(_) => self.subscriptions.tick = None,
            EventSource::Connection => self.subscriptions.connection = false,
            EventSource::Battery => self.subscriptions.battery = false,
        }
    }

    pub fn is_subscribed(&self, source: EventSource) -> bool {
        match source {
            EventSource::ClockTick(unit) => self.subscriptions.tick == Some(unit),
            EventSource::Connection => self.subscriptions.connection,
            EventSource::Battery => self.subscriptions.battery,
        }
    }

    /// Whether `event` should be dispatched to the watchface
    pub fn accepts(&self, event: &Event) -> bool {
        event.source().map_or(true, |source| self.is_subscribed(source))
    }

    /// Whether anything is still registered or subscribed
    pub fn is_idle(&self) -> bool {
        self.layers.iter().all(|layer| layer.bounds.is_none())
            && self.subscriptions == Subscriptions::default()
            && self.inverted.is_none()
    }

    /// Paint every dirty surface of `face` onto `target`, in display coordinates, and
    /// return how many surfaces were painted.
    pub fn redraw<F, D>(&mut self, face: &F, target: &mut D) -> Result<usize, D::Error>
    where
        F: WatchFace,
        D: DrawTarget<Color = BinaryColor>,
    {
        let mut painted = 0;
        for surface in Surface::ALL {
            let layer = &mut self.layers[surface.index()];
            let Some(bounds) = layer.bounds else {
                continue;
            };
            if !core::mem::take(&mut layer.dirty) {
                continue;
            }

            debug!("Redrawing surface {}", surface.index());
            let local = Rectangle::new(Point::zero(), bounds.size);
            let mut translated = target.translated(bounds.top_left);
            face.draw(surface, &mut translated.clipped(&local))?;

            if let Some(region) = self.inverted {
                let overlap = region.intersection(&bounds);
                if !overlap.is_zero_sized() {
                    let overlap = overlap.translate(-bounds.top_left);
                    face.draw(surface, &mut Inverted::new(&mut translated.clipped(&overlap)))?;
                }
            }
            painted += 1;
        }
        Ok(painted)
    }
}

/// Draw target adapter that swaps on and off pixels.
pub struct Inverted<'a, T> {
    parent: &'a mut T,
}

impl<'a, T> Inverted<'a, T> {
    pub fn new(parent: &'a mut T) -> Self {
        Self { parent }
    }
}

impl<T: Dimensions> Dimensions for Inverted<'_, T> {
    fn bounding_box(&self) -> Rectangle {
        self.parent.bounding_box()
    }
}

impl<T> DrawTarget for Inverted<'_, T>
where
    T: DrawTarget<Color = BinaryColor>,
{
    type Color = BinaryColor;
    type Error = T::Error;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        self.parent
            .draw_iter(pixels.into_iter().map(|Pixel(point, color)| Pixel(point, color.invert())))
    }

    fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Self::Color>,
    {
        self.parent
            .fill_contiguous(area, colors.into_iter().map(BinaryColor::invert))
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.parent.fill_solid(area, color.invert())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.parent.clear(color.invert())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FrameBuffer;
    use embedded_graphics::primitives::{PrimitiveStyle, StyledDrawable};

    #[test]
    fn test_subscriptions_gate_events() {
        let mut screen = Screen::new();
        let tick = Event::Tick { hour: 1, minute: 1 };

        assert!(!screen.accepts(&tick));
        assert!(screen.accepts(&Event::Resync { hour: 1, minute: 1 }));

        screen.subscribe(EventSource::ClockTick(TimeUnit::Minute));
        assert!(screen.accepts(&tick));
        assert!(!screen.accepts(&Event::BatteryChanged(40)));

        screen.unsubscribe(EventSource::ClockTick(TimeUnit::Minute));
        assert!(!screen.accepts(&tick));
        assert!(screen.is_idle());
    }

    #[test]
    fn test_inversion_marks_touched_surfaces() {
        let mut screen = Screen::new();
        screen.register(Surface::Hours, Rectangle::new(Point::zero(), Size::new(41, 168)));
        screen.register(Surface::Minutes, Rectangle::new(Point::new(41, 0), Size::new(102, 168)));

        screen.set_inverted(Rectangle::new(Point::new(0, 84), Size::new(41, 84)));
        assert!(screen.is_dirty(Surface::Hours));
        assert!(!screen.is_dirty(Surface::Minutes), "region stays left of the split");

        screen.release(Surface::Hours);
        screen.register(Surface::Hours, Rectangle::new(Point::zero(), Size::new(41, 168)));
        screen.set_inverted(Rectangle::new(Point::new(0, 84), Size::new(41, 84)));
        assert!(!screen.is_dirty(Surface::Hours), "unchanged region needs no redraw");

        screen.set_inverted(Rectangle::zero());
        assert!(screen.is_dirty(Surface::Hours), "removing the region repaints it");
        assert_eq!(screen.inverted(), None);
    }

    #[test]
    fn test_inverted_adapter() {
        let mut fb = FrameBuffer::new(Size::new(8, 8));
        {
            let mut inverted = Inverted::new(&mut fb);
            inverted.clear(BinaryColor::Off).unwrap();
            Rectangle::new(Point::new(2, 2), Size::new(2, 2))
                .draw_styled(&PrimitiveStyle::with_fill(BinaryColor::On), &mut inverted)
                .unwrap();
        }
        assert_eq!(fb.pixel(Point::new(0, 0)), BinaryColor::On);
        assert_eq!(fb.pixel(Point::new(2, 2)), BinaryColor::Off);
        assert_eq!(fb.count_on(&fb.bounding_box()), 64 - 4);
    }
}
