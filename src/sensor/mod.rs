//! Scan sources for the laser touch pipeline.
//!
//! The physical scanner driver lives outside this crate. A [`ScanSource`]
//! is whatever delivers one [`ScanFrame`] per tick: a recorded session
//! played back from disk, or a disconnected placeholder that only ever
//! produces empty frames.

pub mod noop;
pub mod replay;
pub mod types;

pub use noop::NoopSource;
pub use replay::ReplaySource;
pub use types::{Direction, Point2D, ScanFrame};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Angular window and resolution of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanParameters {
    /// Start of the sweep, in degrees from the facing axis
    pub min_angle_deg: f32,
    /// End of the sweep, in degrees from the facing axis
    pub max_angle_deg: f32,
    /// Angular decimation: keep every `step`-th measurement
    pub step: usize,
}

impl Default for ScanParameters {
    fn default() -> Self {
        Self {
            min_angle_deg: -135.0,
            max_angle_deg: 135.0,
            step: 1,
        }
    }
}

impl ScanParameters {
    /// Restrict a frame to the configured sweep and resolution.
    ///
    /// Angles are measured from the facing axis, so a point straight ahead of
    /// the scanner is at 0 degrees whichever way it faces.
    pub fn apply(&self, frame: ScanFrame, facing: Direction) -> ScanFrame {
        let filtered: ScanFrame = frame
            .points
            .into_iter()
            .filter(|p| {
                let angle = angle_from_facing(p, facing);
                angle >= self.min_angle_deg && angle <= self.max_angle_deg
            })
            .collect();
        filtered.decimate(self.step)
    }
}

/// Signed angle of `p` relative to the facing axis, in degrees.
fn angle_from_facing(p: &Point2D, facing: Direction) -> f32 {
    let (along, across) = match facing {
        Direction::Down => (p.y, p.x),
        Direction::Up => (-p.y, -p.x),
        Direction::Right => (p.x, -p.y),
        Direction::Left => (-p.x, p.y),
    };
    across.atan2(along).to_degrees()
}

/// A producer of scan frames, polled once per tick.
pub trait ScanSource {
    /// Fetch the frame for the current tick.
    ///
    /// A source that has nothing to deliver (disconnected, stalled, finished)
    /// returns an empty frame and reports the condition itself.
    fn update(&mut self) -> ScanFrame;

    /// Direction the scanner currently faces.
    fn direction(&self) -> Direction;

    /// Re-orient the scanner.
    fn set_direction(&mut self, direction: Direction);

    /// Stop measuring, apply new scan parameters and start again.
    fn restart(&mut self, params: ScanParameters) -> Result<(), SourceError>;

    /// Whether the source is currently able to deliver frames.
    fn is_connected(&self) -> bool;
}

/// Errors raised by scan sources.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("could not open recording {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("source is already running")]
    AlreadyRunning,

    #[error("failed to spawn reader thread: {0}")]
    Spawn(std::io::Error),
}
