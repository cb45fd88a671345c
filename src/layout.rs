//! Dot-grid layout engine
//!
//! Derives the center of every hour and minute dot from the display bounds. Each grid
//! is tiled column by column, and the integer-division remainder along each axis is
//! split into a symmetric margin so the dots sit centered in their surface.

use core::{fmt, ops::Index};

use embedded_graphics::{
    geometry::{Point, Size},
    primitives::Rectangle,
};

use crate::config::WatchfaceConfig;

/// Number of hour dots
pub const HOUR_DOTS: usize = 24;
/// Number of minute dots
pub const MINUTE_DOTS: usize = 60;
/// Hour dots stacked in one column before wrapping to the next
pub const HOURS_PER_COLUMN: u32 = 12;
/// Minute dots stacked in one column before wrapping to the next
pub const MINUTES_PER_COLUMN: u32 = 10;

/// Direction in which a grid ran out of room.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// Down a column (display height)
    Column,
    /// Across a row (surface width)
    Row,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LayoutError {
    /// A grid with no dots, or no dots per column
    EmptyGrid,
    /// Dots need a radius of at least one pixel
    ZeroRadius,
    /// The dot count is not a whole number of columns
    UnevenColumns { dots: u32, per_column: u32 },
    /// The surface is too small to fit the dots along `axis`
    DotsTooLarge {
        axis: Axis,
        extent: u32,
        dots: u32,
        radius: u32,
    },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid => f.write_str("grid has no dots"),
            Self::ZeroRadius => f.write_str("dot radius must be at least one pixel"),
            Self::UnevenColumns { dots, per_column } => write!(
                f,
                "{} dots do not fill whole columns of {}",
                dots, per_column
            ),
            Self::DotsTooLarge {
                axis,
                extent,
                dots,
                radius,
            } => write!(
                f,
                "{} dots of radius {} do not fit in {} px ({:?})",
                dots, radius, extent, axis
            ),
        }
    }
}

/// Gaps and centering margins of one grid, in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Spacing {
    /// Half the gap between vertically adjacent dot edges
    pub gap: i32,
    /// Half the gap between horizontally adjacent dot edges
    pub cross_gap: i32,
    /// Margin above the first row
    pub error_axis: i32,
    /// Margin left of the first column
    pub error_perp: i32,
}

impl Spacing {
    /// Distance between two dot centers in the same column.
    pub fn step_down(&self, radius: u32) -> i32 {
        2 * (self.gap + radius as i32)
    }

    /// Distance between two dot centers in the same row.
    pub fn step_across(&self, radius: u32) -> i32 {
        2 * (self.cross_gap + radius as i32)
    }
}

/// Compute the gaps and centering margins for `dots_per_column` dots stacked along
/// `axis_pixels` and `dots_per_row` columns spread over `perpendicular_pixels`.
pub fn compute_spacing(
    axis_pixels: u32,
    perpendicular_pixels: u32,
    dots_per_column: u32,
    dots_per_row: u32,
    radius: u32,
) -> Result<Spacing, LayoutError> {
    if dots_per_column == 0 || dots_per_row == 0 {
        return Err(LayoutError::EmptyGrid);
    }
    if radius == 0 {
        return Err(LayoutError::ZeroRadius);
    }

    let gap = half_gap(axis_pixels, dots_per_column, radius).ok_or(LayoutError::DotsTooLarge {
        axis: Axis::Column,
        extent: axis_pixels,
        dots: dots_per_column,
        radius,
    })?;
    let cross_gap =
        half_gap(perpendicular_pixels, dots_per_row, radius).ok_or(LayoutError::DotsTooLarge {
            axis: Axis::Row,
            extent: perpendicular_pixels,
            dots: dots_per_row,
            radius,
        })?;

    let axis = axis_pixels as i32;
    let perp = perpendicular_pixels as i32;
    let per_column = dots_per_column as i32;
    let per_row = dots_per_row as i32;

    Ok(Spacing {
        gap,
        cross_gap,
        error_axis: (axis - per_column * (axis / per_column)) / 2,
        // Columns advance by their real pitch, which may be shorter than the cell.
        error_perp: (perp - per_row * 2 * (radius as i32 + cross_gap)) / 2,
    })
}

/// Half the free space left in one cell once a dot is placed in it, or `None` if the dot
/// is wider than the cell.
fn half_gap(extent: u32, dots: u32, radius: u32) -> Option<i32> {
    let cell = (extent / dots) as i32;
    let free = cell - 2 * radius as i32;
    (free >= 0).then_some(free / 2)
}

/// Place `N` dot centers starting at `start`, filling a column of `wrap_every` dots
/// top to bottom before moving right to the next one.
///
/// `N` must be a multiple of `wrap_every`.
pub fn generate_points<const N: usize>(
    start: Point,
    spacing: &Spacing,
    radius: u32,
    wrap_every: usize,
) -> PointTable<N> {
    let down = spacing.step_down(radius);
    let across = spacing.step_across(radius);

    PointTable(core::array::from_fn(|i| {
        let column = (i / wrap_every) as i32;
        let row = (i % wrap_every) as i32;
        Point::new(start.x + column * across, start.y + row * down)
    }))
}

/// Dot centers of one grid, indexed by the value they represent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointTable<const N: usize>([Point; N]);

impl<const N: usize> PointTable<N> {
    pub fn get(&self, index: usize) -> Option<Point> {
        self.0.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Point> + '_ {
        self.0.iter().copied()
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    pub fn as_slice(&self) -> &[Point] {
        &self.0
    }
}

impl<const N: usize> Index<usize> for PointTable<N> {
    type Output = Point;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

/// Parameters of one dot grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridSpec {
    pub dot_count: u32,
    pub dots_per_column: u32,
    pub radius: u32,
    /// Surface height
    pub axis_length: u32,
    /// Surface width
    pub perpendicular_length: u32,
}

impl GridSpec {
    pub fn columns(&self) -> u32 {
        self.dot_count / self.dots_per_column
    }

    fn validate(&self) -> Result<(), LayoutError> {
        if self.dot_count == 0 || self.dots_per_column == 0 {
            return Err(LayoutError::EmptyGrid);
        }
        if self.radius == 0 {
            return Err(LayoutError::ZeroRadius);
        }
        if self.dot_count % self.dots_per_column != 0 {
            return Err(LayoutError::UnevenColumns {
                dots: self.dot_count,
                per_column: self.dots_per_column,
            });
        }
        Ok(())
    }
}

/// A fully laid out grid of `N` dots.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Grid<const N: usize> {
    spec: GridSpec,
    spacing: Spacing,
    points: PointTable<N>,
}

impl<const N: usize> Grid<N> {
    /// Lay out `N` dots in columns of `dots_per_column` over a surface of size `bounds`.
    pub fn new(dots_per_column: u32, radius: u32, bounds: Size) -> Result<Self, LayoutError> {
        let spec = GridSpec {
            dot_count: N as u32,
            dots_per_column,
            radius,
            axis_length: bounds.height,
            perpendicular_length: bounds.width,
        };
        spec.validate()?;

        let spacing = compute_spacing(
            spec.axis_length,
            spec.perpendicular_length,
            dots_per_column,
            spec.columns(),
            radius,
        )?;
        let r = radius as i32;
        let start = Point::new(
            spacing.cross_gap + r + spacing.error_perp,
            spacing.gap + r + spacing.error_axis,
        );

        Ok(Self {
            spec,
            spacing,
            points: generate_points(start, &spacing, radius, dots_per_column as usize),
        })
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn spacing(&self) -> &Spacing {
        &self.spacing
    }

    pub fn points(&self) -> &PointTable<N> {
        &self.points
    }

    pub fn radius(&self) -> u32 {
        self.spec.radius
    }
}

/// Both grids and the surfaces they are drawn on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchLayout {
    display: Size,
    hour_surface: Rectangle,
    minute_surface: Rectangle,
    hours: Grid<HOUR_DOTS>,
    minutes: Grid<MINUTE_DOTS>,
}

impl WatchLayout {
    /// Split `display` into the hour surface (left 2/7) and the minute surface
    /// (right 5/7) and lay out a grid on each.
    pub fn new(display: Size, config: &WatchfaceConfig) -> Result<Self, LayoutError> {
        let split = display.width * 2 / 7;
        let hour_surface = Rectangle::new(Point::zero(), Size::new(split, display.height));
        let minute_surface = Rectangle::new(
            Point::new(split as i32, 0),
            Size::new(display.width * 5 / 7, display.height),
        );

        let hours = Grid::new(HOURS_PER_COLUMN, config.hour_radius, hour_surface.size)?;
        let minutes = Grid::new(MINUTES_PER_COLUMN, config.minute_radius, minute_surface.size)?;

        Ok(Self {
            display,
            hour_surface,
            minute_surface,
            hours,
            minutes,
        })
    }

    pub fn display(&self) -> Size {
        self.display
    }

    /// Hour surface in display coordinates
    pub fn hour_surface(&self) -> Rectangle {
        self.hour_surface
    }

    /// Minute surface in display coordinates
    pub fn minute_surface(&self) -> Rectangle {
        self.minute_surface
    }

    /// Hour grid, in coordinates local to the hour surface
    pub fn hours(&self) -> &Grid<HOUR_DOTS> {
        &self.hours
    }

    /// Minute grid, in coordinates local to the minute surface
    pub fn minutes(&self) -> &Grid<MINUTE_DOTS> {
        &self.minutes
    }
}
