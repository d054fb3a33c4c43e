//! Core functionality for the laser touch pipeline.
//!
//! This module contains:
//! - Screen geometry, containment and sensor-to-pixel mapping
//! - Run clustering of in-surface scan points
//! - The per-frame pipeline combining both

pub mod clustering;
pub mod geometry;
pub mod pipeline;

// Re-export commonly used types
pub use clustering::{resample_closed, Cluster, RunClusterer};
pub use geometry::{is_inside, map_to_surface, mirror_point, OutputSize, ScreenSurface, SurfaceRect};
pub use pipeline::{ClusterPoint, FrameOutput, SurfacePoint, TouchEventPipeline, TouchPoint};
