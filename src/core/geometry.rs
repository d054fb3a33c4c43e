//! Screen geometry: where the projection surface sits in sensor-space, and
//! how sensor-space points map onto its pixels.

use crate::sensor::types::{Direction, Point2D};
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in sensor-space (millimeters).
///
/// `top` is the smaller y, `bottom` the larger one, matching the pixel
/// convention of the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl SurfaceRect {
    pub fn from_center(center: Point2D, width: f32, height: f32) -> Self {
        Self {
            left: center.x - width * 0.5,
            right: center.x + width * 0.5,
            top: center.y - height * 0.5,
            bottom: center.y + height * 0.5,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn center(&self) -> Point2D {
        Point2D::new(
            (self.left + self.right) * 0.5,
            (self.top + self.bottom) * 0.5,
        )
    }
}

/// Pixel dimensions of the output surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutputSize {
    pub width_px: f32,
    pub height_px: f32,
}

impl OutputSize {
    pub fn new(width_px: f32, height_px: f32) -> Self {
        Self {
            width_px,
            height_px,
        }
    }
}

/// The physical screen, positioned relative to the scanner.
///
/// The rectangle is pushed `standoff + half-extent` away from the scanner
/// along the facing direction, so its near edge sits exactly `standoff`
/// millimeters from the sensor. It is recomputed by every setter.
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenSurface {
    facing: Direction,
    standoff_mm: f32,
    width_mm: f32,
    height_mm: f32,
    rect: SurfaceRect,
}

impl ScreenSurface {
    pub fn new(facing: Direction, standoff_mm: f32, width_mm: f32, height_mm: f32) -> Self {
        let mut surface = Self {
            facing,
            standoff_mm,
            width_mm,
            height_mm,
            rect: SurfaceRect::from_center(Point2D::default(), 0.0, 0.0),
        };
        surface.recompute();
        surface
    }

    pub fn facing(&self) -> Direction {
        self.facing
    }

    pub fn standoff_mm(&self) -> f32 {
        self.standoff_mm
    }

    pub fn width_mm(&self) -> f32 {
        self.width_mm
    }

    pub fn height_mm(&self) -> f32 {
        self.height_mm
    }

    /// Derived sensor-space rectangle.
    pub fn rect(&self) -> &SurfaceRect {
        &self.rect
    }

    pub fn set_facing(&mut self, facing: Direction) {
        self.facing = facing;
        self.recompute();
    }

    pub fn set_standoff(&mut self, standoff_mm: f32) {
        self.standoff_mm = standoff_mm;
        self.recompute();
    }

    pub fn set_dimensions(&mut self, width_mm: f32, height_mm: f32) {
        self.width_mm = width_mm;
        self.height_mm = height_mm;
        self.recompute();
    }

    fn recompute(&mut self) {
        let half_w = self.width_mm * 0.5;
        let half_h = self.height_mm * 0.5;
        let center = match self.facing {
            Direction::Down => Point2D::new(0.0, self.standoff_mm + half_h),
            Direction::Up => Point2D::new(0.0, -(self.standoff_mm + half_h)),
            Direction::Right => Point2D::new(self.standoff_mm + half_w, 0.0),
            Direction::Left => Point2D::new(-(self.standoff_mm + half_w), 0.0),
        };
        self.rect = SurfaceRect::from_center(center, self.width_mm, self.height_mm);
    }
}

/// Inclusive containment test against the surface rectangle.
pub fn is_inside(p: &Point2D, surface: &ScreenSurface) -> bool {
    let r = surface.rect();
    p.x >= r.left && p.x <= r.right && p.y >= r.top && p.y <= r.bottom
}

/// Map a sensor-space point to surface pixels, clamped to the output.
pub fn map_to_surface(p: &Point2D, surface: &ScreenSurface, output: OutputSize) -> Point2D {
    let r = surface.rect();
    Point2D::new(
        map_axis(p.x, r.left, r.right, output.width_px),
        map_axis(p.y, r.top, r.bottom, output.height_px),
    )
}

/// Reflect a point across the facing axis.
///
/// The negated axis is the one orthogonal to the facing direction: x for a
/// scanner facing up or down, y for one facing left or right.
pub fn mirror_point(p: &Point2D, facing: Direction) -> Point2D {
    if facing.is_vertical() {
        Point2D::new(-p.x, p.y)
    } else {
        Point2D::new(p.x, -p.y)
    }
}

/// Linear map of `value` from `[in_min, in_max]` to `[0, out_max]`, clamped.
///
/// A zero-length input range maps everything to the lower bound.
fn map_axis(value: f32, in_min: f32, in_max: f32, out_max: f32) -> f32 {
    let span = in_max - in_min;
    if !span.is_finite() || span.abs() < f32::EPSILON {
        return 0.0;
    }
    let mapped = (value - in_min) / span * out_max;
    mapped.clamp(0.0, out_max.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> ScreenSurface {
        ScreenSurface::new(Direction::Down, 0.0, 4000.0, 3000.0)
    }

    #[test]
    fn test_rect_follows_facing() {
        let down = screen();
        assert_eq!(
            *down.rect(),
            SurfaceRect {
                left: -2000.0,
                right: 2000.0,
                top: 0.0,
                bottom: 3000.0
            }
        );

        let mut surface = ScreenSurface::new(Direction::Up, 500.0, 4000.0, 3000.0);
        assert_eq!(surface.rect().center(), Point2D::new(0.0, -2000.0));
        assert_eq!(surface.rect().bottom, -500.0);

        surface.set_facing(Direction::Right);
        assert_eq!(surface.rect().center(), Point2D::new(2500.0, 0.0));
        assert_eq!(surface.rect().left, 500.0);

        surface.set_facing(Direction::Left);
        assert_eq!(surface.rect().right, -500.0);
    }

    #[test]
    fn test_setters_recompute_rect() {
        let mut surface = screen();
        surface.set_standoff(250.0);
        assert_eq!(surface.rect().top, 250.0);
        assert_eq!(surface.rect().bottom, 3250.0);

        surface.set_dimensions(2000.0, 1000.0);
        assert_eq!(surface.rect().width(), 2000.0);
        assert_eq!(surface.rect().height(), 1000.0);
        assert_eq!(surface.rect().center(), Point2D::new(0.0, 750.0));
    }

    #[test]
    fn test_containment_boundary() {
        let surface = screen();
        let eps = 0.01;

        assert!(is_inside(&Point2D::new(-2000.0, 1500.0), &surface));
        assert!(is_inside(&Point2D::new(2000.0, 1500.0), &surface));
        assert!(is_inside(&Point2D::new(0.0, 0.0), &surface));
        assert!(is_inside(&Point2D::new(0.0, 3000.0), &surface));

        assert!(!is_inside(&Point2D::new(-2000.0 - eps, 1500.0), &surface));
        assert!(!is_inside(&Point2D::new(2000.0 + eps, 1500.0), &surface));
        assert!(!is_inside(&Point2D::new(0.0, -eps), &surface));
        assert!(!is_inside(&Point2D::new(0.0, 3000.0 + eps), &surface));
    }

    #[test]
    fn test_mapping_corners_and_clamping() {
        let surface = screen();
        let output = OutputSize::new(1280.0, 800.0);

        assert_eq!(
            map_to_surface(&Point2D::new(-2000.0, 0.0), &surface, output),
            Point2D::new(0.0, 0.0)
        );
        assert_eq!(
            map_to_surface(&Point2D::new(2000.0, 3000.0), &surface, output),
            Point2D::new(1280.0, 800.0)
        );
        assert_eq!(
            map_to_surface(&Point2D::new(0.0, 1500.0), &surface, output),
            Point2D::new(640.0, 400.0)
        );
        assert_eq!(
            map_to_surface(&Point2D::new(-9000.0, 9000.0), &surface, output),
            Point2D::new(0.0, 800.0)
        );
    }

    #[test]
    fn test_mapping_is_monotonic() {
        let surface = screen();
        let output = OutputSize::new(1280.0, 800.0);
        let mut last = Point2D::new(f32::MIN, f32::MIN);
        for i in 0..=100 {
            let x = -3000.0 + i as f32 * 60.0;
            let y = -1000.0 + i as f32 * 50.0;
            let mapped = map_to_surface(&Point2D::new(x, y), &surface, output);
            assert!(mapped.x >= last.x && mapped.y >= last.y);
            assert!((0.0..=1280.0).contains(&mapped.x));
            assert!((0.0..=800.0).contains(&mapped.y));
            last = mapped;
        }
    }

    #[test]
    fn test_degenerate_surface_maps_to_lower_bound() {
        let surface = ScreenSurface::new(Direction::Down, 100.0, 0.0, 0.0);
        let output = OutputSize::new(1280.0, 800.0);
        let p = Point2D::new(0.0, 100.0);

        assert!(is_inside(&p, &surface));
        assert_eq!(map_to_surface(&p, &surface, output), Point2D::new(0.0, 0.0));
    }

    #[test]
    fn test_mirror_axis() {
        let p = Point2D::new(10.0, 20.0);
        assert_eq!(mirror_point(&p, Direction::Down), Point2D::new(-10.0, 20.0));
        assert_eq!(mirror_point(&p, Direction::Left), Point2D::new(10.0, -20.0));
    }
}
