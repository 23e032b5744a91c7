use crate::vector::{Integral, Vector2};

/// Height of the draggable strip along the top edge of a window.
pub const TITLE_BAR_HEIGHT: i32 = 20;

/// Axis-aligned rectangle, half-open on the far edges.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Rect<T: Integral> {
    pub x0: T,
    pub y0: T,
    pub x1: T,
    pub y1: T,
}

impl<T: Integral + PartialOrd> Rect<T> {
    pub const fn new(x0: T, y0: T, x1: T, y1: T) -> Self {
        Rect { x0, y0, x1, y1 }
    }

    /// `x0 <= x < x1 && y0 <= y < y1`. An inverted rectangle contains nothing.
    pub fn contains(&self, p: Vector2<T>) -> bool {
        self.x0 <= p.x && p.x < self.x1 && self.y0 <= p.y && p.y < self.y1
    }

    pub fn is_empty(&self) -> bool {
        self.x1 <= self.x0 || self.y1 <= self.y0
    }
}

/// The draggable title strip of a window of the given size: full width, anchored at the
/// window's top-left corner.
pub fn title_region(window_size: Vector2<u32>) -> Rect<i32> {
    let width = i32::try_from(window_size.x).unwrap_or(i32::MAX);
    Rect::new(0, 0, width, TITLE_BAR_HEIGHT)
}
