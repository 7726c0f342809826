//! Screen-space rectangles for scenes and veils.

use glam::Vec2;

/// A rectangle in physical screen coordinates.
///
/// `origin` is the top-left corner; `size` is width and height in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::ZERO
    }
}

impl Bounds {
    /// An empty rectangle at the origin.
    pub const ZERO: Bounds = Bounds {
        origin: Vec2::ZERO,
        size: Vec2::ZERO,
    };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    pub fn width(&self) -> f32 {
        self.size.x
    }

    pub fn height(&self) -> f32 {
        self.size.y
    }

    /// Returns `true` if the rectangle has no usable area.
    ///
    /// A zero, negative, or non-finite extent counts as degenerate. Minimized
    /// windows and windows that were never laid out report bounds like this.
    pub fn is_degenerate(&self) -> bool {
        !(self.size.x.is_finite() && self.size.y.is_finite())
            || !(self.origin.x.is_finite() && self.origin.y.is_finite())
            || self.size.x <= 0.0
            || self.size.y <= 0.0
    }

    /// Pick `self` unless it is degenerate, in which case use `fallback`.
    pub fn or_fallback(self, fallback: Bounds) -> Bounds {
        if self.is_degenerate() { fallback } else { self }
    }
}
