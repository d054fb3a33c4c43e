//! Reduction of a classified scan into touch clusters.
//!
//! A cluster is a maximal run of consecutive in-surface points, in scan
//! order. Runs shorter than the configured minimum are discarded. Each
//! surviving run is closed into a polyline, resampled to a fixed vertex
//! count by arc length, and summarized by the center and half-diagonal of
//! the resampled bounding box.
//!
//! Scan order is treated as linear: a run touching the end of the sweep is
//! never joined with one starting at the beginning.

use crate::sensor::types::Point2D;
use serde::{Deserialize, Serialize};

/// Default minimum number of consecutive points forming a cluster.
pub const DEFAULT_MIN_RUN_LENGTH: usize = 10;

/// Default vertex count used when resampling a run.
pub const DEFAULT_RESAMPLE_COUNT: usize = 10;

/// A resolved cluster in sensor-space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Center of the resampled bounding box
    pub centroid: Point2D,
    /// Half the bounding box diagonal, in millimeters
    pub bounding_radius_mm: f32,
    /// Number of scan points in the originating run
    pub run_length: usize,
}

/// Groups contiguous inside-runs into clusters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunClusterer {
    min_run_length: usize,
    resample_count: usize,
}

impl Default for RunClusterer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_RUN_LENGTH, DEFAULT_RESAMPLE_COUNT)
    }
}

impl RunClusterer {
    pub fn new(min_run_length: usize, resample_count: usize) -> Self {
        Self {
            min_run_length: min_run_length.max(1),
            resample_count: resample_count.max(1),
        }
    }

    pub fn min_run_length(&self) -> usize {
        self.min_run_length
    }

    pub fn resample_count(&self) -> usize {
        self.resample_count
    }

    /// Cluster a scan given as `(point, inside)` pairs in scan order.
    ///
    /// Clusters are returned in the order their runs completed.
    pub fn cluster<I>(&self, classified: I) -> Vec<Cluster>
    where
        I: IntoIterator<Item = (Point2D, bool)>,
    {
        let mut clusters = Vec::new();
        let mut run: Vec<Point2D> = Vec::new();

        for (point, inside) in classified {
            if inside {
                run.push(point);
            } else {
                self.finish_run(&mut run, &mut clusters);
            }
        }
        self.finish_run(&mut run, &mut clusters);

        clusters
    }

    fn finish_run(&self, run: &mut Vec<Point2D>, clusters: &mut Vec<Cluster>) {
        if run.len() >= self.min_run_length {
            clusters.push(self.summarize(run));
        }
        run.clear();
    }

    fn summarize(&self, run: &[Point2D]) -> Cluster {
        let resampled = resample_closed(run, self.resample_count);

        let mut min = Point2D::new(f32::INFINITY, f32::INFINITY);
        let mut max = Point2D::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in &resampled {
            min.x = min.x.min(p.x);
            min.y = min.y.min(p.y);
            max.x = max.x.max(p.x);
            max.y = max.y.max(p.y);
        }

        let width = max.x - min.x;
        let height = max.y - min.y;
        Cluster {
            centroid: Point2D::new(min.x + width * 0.5, min.y + height * 0.5),
            bounding_radius_mm: width.hypot(height) * 0.5,
            run_length: run.len(),
        }
    }
}

/// Resample `points`, closed back onto its first vertex, to `count` vertices
/// evenly spaced by arc length. The first output vertex is `points[0]`.
pub fn resample_closed(points: &[Point2D], count: usize) -> Vec<Point2D> {
    let Some(&first) = points.first() else {
        return Vec::new();
    };
    if count == 0 {
        return Vec::new();
    }

    let mut vertices = points.to_vec();
    vertices.push(first);

    // Cumulative arc length at each vertex
    let mut lengths = Vec::with_capacity(vertices.len());
    let mut total = 0.0f32;
    lengths.push(0.0);
    for pair in vertices.windows(2) {
        total += pair[0].distance(&pair[1]);
        lengths.push(total);
    }

    if total <= f32::EPSILON {
        return vec![first; count];
    }

    let spacing = total / count as f32;
    let mut out = Vec::with_capacity(count);
    let mut segment = 0usize;

    for i in 0..count {
        let target = spacing * i as f32;
        while segment + 2 < lengths.len() && lengths[segment + 1] < target {
            segment += 1;
        }
        let start = lengths[segment];
        let seg_len = lengths[segment + 1] - start;
        let t = if seg_len > 0.0 {
            ((target - start) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        out.push(vertices[segment].lerp(&vertices[segment + 1], t));
    }

    out
}
