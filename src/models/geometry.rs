//! Points, sizes and rectangles tagged with the coordinate space they live in.
//!
//! Two spaces exist and are never mixed implicitly:
//!
//! * [`AxSpace`]: accessibility coordinates. Origin at the top-left corner of
//!   the primary display, Y grows downward.
//! * [`ScreenSpace`]: display coordinates. Origin at the bottom-left corner of
//!   the primary display, Y grows upward. Secondary displays sit at signed
//!   offsets from that origin.
//!
//! Moving a [`Rect`] between the two requires the primary display height and
//! goes through [`Rect::to_screen`] / [`Rect::to_ax`], which are exact inverses.

use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use thiserror::Error;

/// Marker for accessibility (top-left origin, Y down) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxSpace;

/// Marker for display (bottom-left origin, Y up) coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScreenSpace;

/// Implemented by the coordinate space markers
pub trait CoordinateSpace: Copy + fmt::Debug + PartialEq + Default + 'static {
    /// Short label used in logs and CLI output
    const NAME: &'static str;
}

impl CoordinateSpace for AxSpace {
    const NAME: &'static str = "ax";
}

impl CoordinateSpace for ScreenSpace {
    const NAME: &'static str = "screen";
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum GeometryError {
    #[error("rectangle dimensions must be non-negative, got {width}x{height}")]
    NegativeDimensions { width: f64, height: f64 },

    #[error("rectangle components must be finite")]
    NonFinite,
}

/// Two-dimensional point used for window positioning
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Window size in display points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in coordinate space `S`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect<S: CoordinateSpace = ScreenSpace> {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(skip)]
    space: PhantomData<S>,
}

impl<S: CoordinateSpace> Rect<S> {
    /// Build a rectangle, rejecting negative or non-finite components.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, GeometryError> {
        if ![x, y, width, height].iter().all(|value| value.is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        if width < 0.0 || height < 0.0 {
            return Err(GeometryError::NegativeDimensions { width, height });
        }

        Ok(Self::from_raw(x, y, width, height))
    }

    /// Unchecked constructor for values derived from already-valid rectangles.
    pub(crate) const fn from_raw(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
            space: PhantomData,
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Result<Self, GeometryError> {
        Self::new(origin.x, origin.y, size.width, size.height)
    }

    pub fn origin(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Area shared by both rectangles, zero when they only touch or are disjoint.
    pub fn intersection_area(&self, other: &Self) -> f64 {
        let width = (self.max_x().min(other.max_x()) - self.x.max(other.x)).max(0.0);
        let height = (self.max_y().min(other.max_y()) - self.y.max(other.y)).max(0.0);
        width * height
    }

    /// Half-open containment: the min edges are inside, the max edges are not.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x < self.max_x() && point.y >= self.y && point.y < self.max_y()
    }
}

impl Rect<AxSpace> {
    /// Flip into display space: `screen_y = primary_height - ax_y - height`.
    pub fn to_screen(self, primary_height: f64) -> Rect<ScreenSpace> {
        Rect::from_raw(
            self.x,
            primary_height - self.y - self.height,
            self.width,
            self.height,
        )
    }
}

impl Rect<ScreenSpace> {
    /// Inverse of [`Rect::to_screen`]: `ax_y = primary_height - screen_y - height`.
    pub fn to_ax(self, primary_height: f64) -> Rect<AxSpace> {
        Rect::from_raw(
            self.x,
            primary_height - self.y - self.height,
            self.width,
            self.height,
        )
    }
}

impl<S: CoordinateSpace> fmt::Display for Rect<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}x{}) [{}]",
            self.x,
            self.y,
            self.width,
            self.height,
            S::NAME
        )
    }
}
