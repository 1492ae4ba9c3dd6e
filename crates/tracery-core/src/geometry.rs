//! Basic geometric types used by the layout engines.
//!
//! Coordinates follow screen conventions: `x` grows to the right and `y`
//! grows downwards. A step position is the top-left corner of its box.

use serde::{Deserialize, Serialize};

/// A point in 2-D layout space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point with the specified coordinates
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns the x-coordinate of the point
    pub fn x(self) -> f32 {
        self.x
    }

    /// Returns the y-coordinate of the point
    pub fn y(self) -> f32 {
        self.y
    }

    /// Adds another point to this point, returning a new point
    pub fn add_point(self, other: Point) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }

    /// Subtracts another point from this point, returning a new point
    pub fn sub_point(self, other: Point) -> Self {
        Self {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }

    /// Largest per-axis distance to another point.
    ///
    /// Used as the movement measure when checking layout convergence.
    pub fn max_axis_distance(self, other: Point) -> f32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }
}

/// Represents the dimensions of an element with width and height
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    width: f32,
    height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Returns the width dimension of this size
    pub fn width(self) -> f32 {
        self.width
    }

    /// Returns the height dimension of this size
    pub fn height(self) -> f32 {
        self.height
    }
}

/// An axis-aligned rectangle described by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    min_x: f32,
    min_y: f32,
    max_x: f32,
    max_y: f32,
}

impl Bounds {
    /// Creates bounds whose top-left corner is `point` and whose extent is `size`.
    pub fn new_from_top_left(point: Point, size: Size) -> Self {
        Self {
            min_x: point.x,
            min_y: point.y,
            max_x: point.x + size.width,
            max_y: point.y + size.height,
        }
    }

    pub fn min_x(self) -> f32 {
        self.min_x
    }

    pub fn min_y(self) -> f32 {
        self.min_y
    }

    pub fn max_x(self) -> f32 {
        self.max_x
    }

    pub fn max_y(self) -> f32 {
        self.max_y
    }

    pub fn width(self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(self) -> f32 {
        self.max_y - self.min_y
    }

    /// Returns the smallest bounds containing both `self` and `other`.
    pub fn merge(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Returns true when the two rectangles share interior area.
    ///
    /// Touching edges do not count as an intersection.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min_x < other.max_x
            && other.min_x < self.max_x
            && self.min_y < other.max_y
            && other.min_y < self.max_y
    }
}

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_point_default() {
        let point = Point::default();
        assert_eq!(point.x(), 0.0);
        assert_eq!(point.y(), 0.0);
    }

    #[test]
    fn test_point_add_and_sub() {
        let p1 = Point::new(5.0, 8.0);
        let p2 = Point::new(2.0, 3.0);

        let sum = p1.add_point(p2);
        assert_eq!(sum.x(), 7.0);
        assert_eq!(sum.y(), 11.0);

        let diff = p1.sub_point(p2);
        assert_eq!(diff.x(), 3.0);
        assert_eq!(diff.y(), 5.0);
    }

    #[test]
    fn test_point_max_axis_distance() {
        let a = Point::new(1.0, 10.0);
        let b = Point::new(4.0, 8.5);
        assert_approx_eq!(f32, a.max_axis_distance(b), 3.0);
        assert_approx_eq!(f32, b.max_axis_distance(a), 3.0);
        assert_approx_eq!(f32, a.max_axis_distance(a), 0.0);
    }

    #[test]
    fn test_point_serializes_as_xy_object() {
        let json = serde_json::to_string(&Point::new(1.5, -2.0)).unwrap();
        assert_eq!(json, r#"{"x":1.5,"y":-2.0}"#);
    }

    #[test]
    fn test_bounds_from_top_left() {
        let bounds = Bounds::new_from_top_left(Point::new(10.0, 20.0), Size::new(6.0, 8.0));

        assert_eq!(bounds.min_x(), 10.0);
        assert_eq!(bounds.min_y(), 20.0);
        assert_eq!(bounds.max_x(), 16.0);
        assert_eq!(bounds.max_y(), 28.0);
        assert_eq!(bounds.width(), 6.0);
        assert_eq!(bounds.height(), 8.0);
    }

    #[test]
    fn test_bounds_merge() {
        let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let b = Bounds::new_from_top_left(Point::new(5.0, -5.0), Size::new(20.0, 10.0));
        let merged = a.merge(&b);

        assert_eq!(merged.min_x(), 0.0);
        assert_eq!(merged.min_y(), -5.0);
        assert_eq!(merged.max_x(), 25.0);
        assert_eq!(merged.max_y(), 10.0);
    }

    #[test]
    fn test_bounds_intersects() {
        let a = Bounds::new_from_top_left(Point::new(0.0, 0.0), Size::new(10.0, 10.0));
        let overlapping = Bounds::new_from_top_left(Point::new(5.0, 5.0), Size::new(10.0, 10.0));
        let touching = Bounds::new_from_top_left(Point::new(10.0, 0.0), Size::new(10.0, 10.0));
        let apart = Bounds::new_from_top_left(Point::new(30.0, 30.0), Size::new(1.0, 1.0));

        assert!(a.intersects(&overlapping));
        assert!(!a.intersects(&touching));
        assert!(!a.intersects(&apart));
    }
}
