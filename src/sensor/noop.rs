//! Placeholder source for when no scanner is attached.
//!
//! Every tick yields an empty frame, so the pipeline keeps running and
//! simply emits nothing.

use super::{Direction, ScanFrame, ScanParameters, ScanSource, SourceError};
use tracing::{debug, warn};

/// A source that never delivers points.
pub struct NoopSource {
    direction: Direction,
    warned: bool,
}

impl NoopSource {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            warned: false,
        }
    }
}

impl Default for NoopSource {
    fn default() -> Self {
        Self::new(Direction::default())
    }
}

impl ScanSource for NoopSource {
    fn update(&mut self) -> ScanFrame {
        if !self.warned {
            warn!("scanner not connected, producing empty frames");
            self.warned = true;
        }
        ScanFrame::empty()
    }

    fn direction(&self) -> Direction {
        self.direction
    }

    fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    fn restart(&mut self, params: ScanParameters) -> Result<(), SourceError> {
        debug!(step = params.step, "no scanner attached, nothing to restart");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        false
    }
}
