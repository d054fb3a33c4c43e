//! Scan data types shared between sensor sources and the touch pipeline.
//!
//! A [`Point2D`] is used in two coordinate spaces: sensor-space (millimeters,
//! origin at the scanner) and surface-space (pixels, origin at the top-left
//! corner of the screen). The pipeline only ever crosses between them through
//! an explicit mapping.

use serde::{Deserialize, Serialize};

/// A point in the scan plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2D) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Linear interpolation towards `other` (`t = 0` is `self`, `t = 1` is `other`).
    pub fn lerp(&self, other: &Point2D, t: f32) -> Point2D {
        Point2D {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }
}

/// Direction the scanner faces the screen from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Direction {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Direction {
    /// Whether the facing axis is vertical in sensor-space.
    pub fn is_vertical(&self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// Parse a direction name (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "up" => Some(Direction::Up),
            "down" => Some(Direction::Down),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            _ => None,
        }
    }
}

/// One sweep of the scanner, in angular scan order.
///
/// Order is significant: clustering treats scan-order neighbours as adjacent,
/// regardless of their spatial distance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanFrame {
    pub points: Vec<Point2D>,
}

impl ScanFrame {
    pub fn new(points: Vec<Point2D>) -> Self {
        Self { points }
    }

    /// The frame produced when the sensor has nothing to deliver.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Keep every `step`-th point, mimicking a coarser angular resolution.
    pub fn decimate(self, step: usize) -> Self {
        if step <= 1 {
            return self;
        }
        Self {
            points: self.points.into_iter().step_by(step).collect(),
        }
    }
}

impl FromIterator<Point2D> for ScanFrame {
    fn from_iter<I: IntoIterator<Item = Point2D>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}
