//! integer display-space geometry used by every layout computation

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// All four fields zero. A rect with zero size but a non-zero origin is
    /// not considered empty.
    pub fn is_empty(&self) -> bool {
        self.x == 0 && self.y == 0 && self.width == 0 && self.height == 0
    }

    pub fn has_zero_size(&self) -> bool { self.width == 0 || self.height == 0 }

    pub fn is_landscape(&self) -> bool { self.width > self.height }

    pub fn right(&self) -> i32 { self.x + self.width as i32 }

    pub fn bottom(&self) -> i32 { self.y + self.height as i32 }

    pub fn translate(self, dx: i32, dy: i32) -> Self { Self { x: self.x + dx, y: self.y + dy, ..self } }

    /// Grows (or shrinks for negative amounts) the rect on every side.
    pub fn inflate(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x - dx,
            y: self.y - dy,
            width: (self.width as i64 + 2 * dx as i64).max(0) as u32,
            height: (self.height as i64 + 2 * dy as i64).max(0) as u32,
        }
    }

    /// Length of the horizontal span shared with `other`.
    pub fn overlap_x(&self, other: &Rect) -> u32 {
        let start = self.x.max(other.x);
        let end = self.right().min(other.right());
        (end - start).max(0) as u32
    }
}

pub trait RectExt {
    fn intersection(&self, other: &Self) -> Self;
}

impl RectExt for Rect {
    fn intersection(&self, other: &Self) -> Self {
        let min_x = self.x.max(other.x);
        let max_x = self.right().min(other.right());
        let min_y = self.y.max(other.y);
        let max_y = self.bottom().min(other.bottom());
        if max_x <= min_x || max_y <= min_y {
            return Rect::default();
        }
        Rect::new(min_x, min_y, (max_x - min_x) as u32, (max_y - min_y) as u32)
    }
}

/// Scales a density-independent length by a pixel ratio, truncating like
/// the display server's integer arithmetic.
pub fn scale(value: u32, ratio: f32) -> u32 { (value as f32 * ratio).max(0.0) as u32 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_empty_requires_all_zero() {
        assert!(Rect::default().is_empty());
        assert!(!Rect::new(10, 0, 0, 0).is_empty());
        assert!(Rect::new(10, 0, 0, 0).has_zero_size());
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(50, 50, 100, 100);
        assert_eq!(a.intersection(&b), Rect::new(50, 50, 50, 50));
    }

    #[test]
    fn test_no_intersection() {
        let a = Rect::new(0, 0, 100, 100);
        let b = Rect::new(200, 200, 100, 100);
        assert_eq!(a.intersection(&b), Rect::default());
    }

    #[test]
    fn test_overlap_x() {
        let window = Rect::new(900, 0, 200, 1000);
        assert_eq!(window.overlap_x(&Rect::new(0, 0, 1000, 1000)), 100);
        assert_eq!(window.overlap_x(&Rect::new(1000, 0, 1000, 1000)), 100);
        assert_eq!(window.overlap_x(&Rect::new(2000, 0, 1000, 1000)), 0);
    }

    #[test]
    fn test_inflate_clamps_size() {
        let rect = Rect::new(10, 10, 4, 100);
        assert_eq!(rect.inflate(5, 5), Rect::new(5, 5, 14, 110));
        assert_eq!(rect.inflate(-5, 0), Rect::new(15, 10, 0, 100));
    }

    #[test]
    fn test_scale_truncates() {
        assert_eq!(scale(37, 1.5), 55);
        assert_eq!(scale(320, 1.0), 320);
    }
}
