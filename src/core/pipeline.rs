//! Per-frame processing: scan in, touches and clusters out.
//!
//! Every frame is processed from scratch. Nothing is tracked or smoothed
//! across frames.

use crate::core::clustering::RunClusterer;
use crate::core::geometry::{is_inside, map_to_surface, mirror_point, OutputSize, ScreenSurface};
use crate::sensor::types::{Point2D, ScanFrame};
use serde::{Deserialize, Serialize};

/// A single in-surface scan point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    /// Position in millimeters, after mirroring
    pub sensor_space: Point2D,
    /// Position in output pixels
    pub surface_space: Point2D,
}

/// A clustered touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterPoint {
    /// Cluster centroid in millimeters
    pub sensor_space: Point2D,
    /// Centroid in output pixels
    pub surface_space: Point2D,
    pub bounding_radius_mm: f32,
}

/// Anything that can be sent as a touch position in surface-space.
pub trait SurfacePoint {
    fn surface_position(&self) -> Point2D;
}

impl SurfacePoint for TouchPoint {
    fn surface_position(&self) -> Point2D {
        self.surface_space
    }
}

impl SurfacePoint for ClusterPoint {
    fn surface_position(&self) -> Point2D {
        self.surface_space
    }
}

/// Both alternative output sets of one frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameOutput {
    pub touches: Vec<TouchPoint>,
    pub clusters: Vec<ClusterPoint>,
}

impl FrameOutput {
    pub fn is_empty(&self) -> bool {
        self.touches.is_empty() && self.clusters.is_empty()
    }
}

/// Scan-to-touch pipeline.
#[derive(Debug, Clone, Default)]
pub struct TouchEventPipeline {
    clusterer: RunClusterer,
}

impl TouchEventPipeline {
    pub fn new(clusterer: RunClusterer) -> Self {
        Self { clusterer }
    }

    pub fn clusterer(&self) -> &RunClusterer {
        &self.clusterer
    }

    pub fn set_clusterer(&mut self, clusterer: RunClusterer) {
        self.clusterer = clusterer;
    }

    /// Process one frame.
    ///
    /// Mirroring is applied before the containment test. Touches keep scan
    /// order; clusters are built from the same inside/outside sequence.
    pub fn process(
        &self,
        frame: &ScanFrame,
        surface: &ScreenSurface,
        output: OutputSize,
        mirror: bool,
    ) -> FrameOutput {
        let classified: Vec<(Point2D, bool)> = frame
            .points
            .iter()
            .map(|p| {
                let p = if mirror {
                    mirror_point(p, surface.facing())
                } else {
                    *p
                };
                (p, is_inside(&p, surface))
            })
            .collect();

        let touches = classified
            .iter()
            .filter(|(_, inside)| *inside)
            .map(|(p, _)| TouchPoint {
                sensor_space: *p,
                surface_space: map_to_surface(p, surface, output),
            })
            .collect();

        let clusters = self
            .clusterer
            .cluster(classified)
            .into_iter()
            .map(|c| ClusterPoint {
                sensor_space: c.centroid,
                surface_space: map_to_surface(&c.centroid, surface, output),
                bounding_radius_mm: c.bounding_radius_mm,
            })
            .collect();

        FrameOutput { touches, clusters }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::types::Direction;

    fn surface() -> ScreenSurface {
        ScreenSurface::new(Direction::Down, 0.0, 4000.0, 3000.0)
    }

    fn output() -> OutputSize {
        OutputSize::new(1280.0, 800.0)
    }

    #[test]
    fn test_touches_keep_scan_order() {
        let frame = ScanFrame::new(vec![
            Point2D::new(1000.0, 1000.0),
            Point2D::new(-5000.0, 1000.0),
            Point2D::new(-1000.0, 2000.0),
        ]);
        let out = TouchEventPipeline::default().process(&frame, &surface(), output(), false);

        assert_eq!(out.touches.len(), 2);
        assert_eq!(out.touches[0].sensor_space, Point2D::new(1000.0, 1000.0));
        assert_eq!(out.touches[1].sensor_space, Point2D::new(-1000.0, 2000.0));
        assert!(out.clusters.is_empty());
    }

    #[test]
    fn test_mirror_applies_before_containment() {
        // Left of center lands right of center once mirrored.
        let surface = ScreenSurface::new(Direction::Down, 0.0, 1000.0, 1000.0);
        let frame = ScanFrame::new(vec![Point2D::new(-400.0, 500.0)]);
        let pipeline = TouchEventPipeline::default();

        let plain = pipeline.process(&frame, &surface, output(), false);
        let mirrored = pipeline.process(&frame, &surface, output(), true);

        assert_eq!(plain.touches[0].surface_space.x, 128.0);
        assert_eq!(mirrored.touches[0].sensor_space, Point2D::new(400.0, 500.0));
        assert_eq!(mirrored.touches[0].surface_space.x, 1152.0);
    }

    #[test]
    fn test_cluster_centroid_is_mapped() {
        let frame: ScanFrame = (0..10)
            .map(|i| Point2D::new(-45.0 + i as f32 * 10.0, 1500.0))
            .collect();
        let out = TouchEventPipeline::default().process(&frame, &surface(), output(), false);

        assert_eq!(out.clusters.len(), 1);
        let cluster = out.clusters[0];
        assert!(cluster.sensor_space.x.abs() < 1e-3);
        assert!((cluster.surface_space.x - 640.0).abs() < 1e-2);
        assert!((cluster.surface_space.y - 400.0).abs() < 1e-2);
        assert!((cluster.bounding_radius_mm - 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_empty_frame() {
        let out =
            TouchEventPipeline::default().process(&ScanFrame::empty(), &surface(), output(), true);
        assert!(out.is_empty());
    }
}
