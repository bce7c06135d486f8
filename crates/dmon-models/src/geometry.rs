//! Geometry primitives for detections.
//!
//! All coordinates live in the detector's normalized frame space:
//! `(0.0, 0.0)` is the top-left corner of the image and `(1.0, 1.0)` the
//! bottom-right corner.

use serde::{Deserialize, Serialize};

/// A point in normalized frame space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    /// Movement vector from this point to `other`.
    pub fn vector_to(&self, other: &Point) -> Vector {
        Vector::from_points(self, other)
    }
}

/// An axis-aligned rectangle in normalized frame space.
///
/// `a` is the upper-left corner and `b` the lower-right corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub a: Point,
    pub b: Point,
}

impl BoundingBox {
    pub fn new(a: Point, b: Point) -> Self {
        Self { a, b }
    }

    /// Convenience constructor from corner coordinates.
    pub fn from_corners(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            a: Point::new(ax, ay),
            b: Point::new(bx, by),
        }
    }

    pub fn w(&self) -> f64 {
        self.b.x - self.a.x
    }

    pub fn h(&self) -> f64 {
        self.b.y - self.a.y
    }

    pub fn center(&self) -> Point {
        Point::new((self.a.x + self.b.x) / 2.0, (self.a.y + self.b.y) / 2.0)
    }

    pub fn area(&self) -> f64 {
        self.w() * self.h()
    }

    /// Intersection area divided by union area (IoU).
    pub fn percent_intersection_with(&self, other: &BoundingBox) -> f64 {
        let iw = (self.b.x.min(other.b.x) - self.a.x.max(other.a.x)).max(0.0);
        let ih = (self.b.y.min(other.b.y) - self.a.y.max(other.a.y)).max(0.0);
        let intersection = iw * ih;
        intersection / (self.area() + other.area() - intersection)
    }

    /// Corner-wise midpoint of two boxes.
    pub fn average_with(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox::from_corners(
            (self.a.x + other.a.x) / 2.0,
            (self.a.y + other.a.y) / 2.0,
            (self.b.x + other.b.x) / 2.0,
            (self.b.y + other.b.y) / 2.0,
        )
    }

    /// Corner-wise mean of a set of boxes. Returns `None` for an empty set.
    pub fn average_of<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        let mut count = 0usize;
        let mut sum = [0.0f64; 4];
        for bbox in boxes {
            count += 1;
            sum[0] += bbox.a.x;
            sum[1] += bbox.a.y;
            sum[2] += bbox.b.x;
            sum[3] += bbox.b.y;
        }
        if count == 0 {
            return None;
        }
        let n = count as f64;
        Some(BoundingBox::from_corners(
            sum[0] / n,
            sum[1] / n,
            sum[2] / n,
            sum[3] / n,
        ))
    }

    /// Smallest box enclosing every box in the set. Returns `None` for an empty set.
    pub fn enclosing<'a, I>(boxes: I) -> Option<BoundingBox>
    where
        I: IntoIterator<Item = &'a BoundingBox>,
    {
        boxes.into_iter().fold(None, |acc: Option<BoundingBox>, bbox| {
            Some(match acc {
                None => *bbox,
                Some(total) => BoundingBox::from_corners(
                    total.a.x.min(bbox.a.x),
                    total.a.y.min(bbox.a.y),
                    total.b.x.max(bbox.b.x),
                    total.b.y.max(bbox.b.y),
                ),
            })
        })
    }
}

/// A movement vector between two points.
///
/// `direction` is in degrees, counter-clockwise from "right" with the y axis
/// flipped so that "up" in the image is +90 and "down" is -90:
///
/// ```text
///   135   90   45
///      \  |  /
///  180 -- a -- 0
///      /  |  \
///  -135  -90  -45
/// ```
///
/// Straight left is reported as -180.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector {
    pub direction: f64,
    pub length: f64,
}

impl Vector {
    pub fn from_points(a: &Point, b: &Point) -> Self {
        let dx = b.x - a.x;
        let dy = b.y - a.y;
        Self {
            length: (dx * dx + dy * dy).sqrt(),
            direction: -dy.atan2(dx).to_degrees(),
        }
    }
}
