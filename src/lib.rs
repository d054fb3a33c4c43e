//! Laser Touch - turns planar laser range scans into touch events.
//!
//! A rotating range scanner sweeps the plane just in front of a projection
//! screen. Every tick, the scan is matched against the screen rectangle;
//! points inside it become touches, contiguous runs of touches become
//! clusters, and the selected set is published as OSC messages.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────────────────────────┐   ┌──────────────┐
//! │  ScanSource  │──▶│           TouchEventPipeline          │──▶│ EventEmitter │
//! │ (replay/noop)│   │ mirror ─▶ contain ─▶ map ─▶ cluster   │   │  (OSC/UDP)   │
//! └──────────────┘   └───────────────────────────────────────┘   └──────────────┘
//!                                                                       │
//!                                                                       ▼
//!                                                               ┌──────────────┐
//!                                                               │MessageHistory│
//!                                                               │  (last 30)   │
//!                                                               └──────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use laser_touch::{app, sensor, Config};
//!
//! let config = Config::default();
//! let source = Box::new(sensor::NoopSource::default());
//! let mut app = app::AppContext::new(config, source, app::udp_sink_factory())
//!     .expect("Failed to start touch feed");
//!
//! // One tick: read a scan, process it, emit the selected touch set
//! let outcome = app.tick();
//! println!("{} touches", outcome.output.touches.len());
//! ```

pub mod app;
pub mod config;
pub mod core;
pub mod emitter;
pub mod sensor;
pub mod stats;
pub mod transport;

// Re-export key types at crate root for convenience
pub use app::{AppContext, AppError, TickOutcome};
pub use config::{Config, ConfigChange, ConfigError, Overrides};
pub use self::core::{
    ClusterPoint, FrameOutput, OutputSize, RunClusterer, ScreenSurface, TouchEventPipeline,
    TouchPoint,
};
pub use emitter::{EventEmitter, MessageHistory, SendingMode};
pub use sensor::{Direction, Point2D, ScanFrame, ScanSource};
pub use stats::{SessionStats, SharedSessionStats};
pub use transport::{MemorySink, MessageSink, OscMessage, UdpOscSender};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
