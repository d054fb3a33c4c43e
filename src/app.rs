//! Application context: everything one running feed needs, in one place.
//!
//! The context owns the configuration, the scan source, the pipeline, the
//! emitter with its history, and the session statistics. A tick reads the
//! configuration; configuration changes happen between ticks through
//! [`AppContext::apply`].

use crate::config::{Config, ConfigChange, ConfigError, OscConfig};
use crate::core::clustering::RunClusterer;
use crate::core::geometry::ScreenSurface;
use crate::core::pipeline::{FrameOutput, TouchEventPipeline};
use crate::emitter::{EventEmitter, MessageHistory};
use crate::sensor::{ScanSource, SourceError};
use crate::stats::{create_shared_stats, SharedSessionStats};
use crate::transport::{MessageSink, TransportError, UdpOscSender};
use std::time::Duration;
use tracing::{debug, info};

/// Builds a transport for a target. Called at startup and whenever the
/// target host or port changes.
pub type SinkFactory =
    Box<dyn Fn(&OscConfig) -> Result<Box<dyn MessageSink + Send>, TransportError>>;

/// Factory for the UDP transport.
pub fn udp_sink_factory() -> SinkFactory {
    Box::new(|osc: &OscConfig| -> Result<Box<dyn MessageSink + Send>, TransportError> {
        let sender = UdpOscSender::connect(&osc.host, osc.port)?;
        Ok(Box::new(sender) as Box<dyn MessageSink + Send>)
    })
}

/// Result of one tick.
#[derive(Debug, Clone, Default)]
pub struct TickOutcome {
    /// Points in the scan delivered by the source
    pub scan_points: usize,
    pub output: FrameOutput,
    /// Messages handed to the transport
    pub messages: usize,
}

/// Errors raised while building or reconfiguring the context.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// A running touch feed.
pub struct AppContext {
    config: Config,
    surface: ScreenSurface,
    pipeline: TouchEventPipeline,
    emitter: EventEmitter,
    source: Box<dyn ScanSource>,
    sink_factory: SinkFactory,
    stats: SharedSessionStats,
}

impl AppContext {
    /// Validate `config`, bring the source in line with it and build the transport.
    pub fn new(
        config: Config,
        mut source: Box<dyn ScanSource>,
        sink_factory: SinkFactory,
    ) -> Result<Self, AppError> {
        config.validate()?;

        source.set_direction(config.surface.facing);
        source.restart(config.scan)?;

        let sink = sink_factory(&config.osc)?;
        let emitter = EventEmitter::new(config.osc.address.clone(), sink);
        let pipeline = TouchEventPipeline::new(RunClusterer::new(
            config.clustering.min_run_length,
            config.clustering.resample_count,
        ));

        info!(
            facing = ?config.surface.facing,
            width_mm = config.surface.width_mm,
            height_mm = config.surface.height_mm,
            standoff_mm = config.surface.standoff_mm,
            mode = ?config.sending_mode,
            "touch feed ready"
        );

        Ok(Self {
            surface: config.surface.to_surface(),
            config,
            pipeline,
            emitter,
            source,
            sink_factory,
            stats: create_shared_stats(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn surface(&self) -> &ScreenSurface {
        &self.surface
    }

    /// Recently emitted messages, oldest first.
    pub fn history(&self) -> &MessageHistory {
        self.emitter.history()
    }

    pub fn stats(&self) -> SharedSessionStats {
        self.stats.clone()
    }

    pub fn source(&self) -> &dyn ScanSource {
        self.source.as_ref()
    }

    /// Time between ticks at the configured rate.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.config.tick_hz.max(1)))
    }

    /// Run one frame: read the scan, process it and emit the selected set.
    pub fn tick(&mut self) -> TickOutcome {
        let frame = self.source.update();

        let facing = self.source.direction();
        if facing != self.surface.facing() {
            debug!(?facing, "scanner direction changed");
            self.surface.set_facing(facing);
        }

        let output = self.pipeline.process(
            &frame,
            &self.surface,
            self.config.output.size(),
            self.config.mirror,
        );
        let messages = self.emitter.emit_frame(&output, self.config.sending_mode);

        self.stats
            .record_frame(frame.len(), output.touches.len(), output.clusters.len());
        self.stats.record_messages(messages);

        TickOutcome {
            scan_points: frame.len(),
            output,
            messages,
        }
    }

    /// Replace the configuration, performing the side effect of each change.
    ///
    /// On error, changes handled before the failing one stay in effect and the
    /// stored configuration is left as it was; applying the same
    /// configuration again is safe.
    pub fn apply(&mut self, new: Config) -> Result<Vec<ConfigChange>, AppError> {
        new.validate()?;

        let changes = self.config.diff(&new);
        for change in &changes {
            self.handle(change, &new)?;
        }

        self.config = new;
        Ok(changes)
    }

    fn handle(&mut self, change: &ConfigChange, new: &Config) -> Result<(), AppError> {
        match change {
            ConfigChange::SurfaceChanged => {
                self.surface.set_standoff(new.surface.standoff_mm);
                self.surface
                    .set_dimensions(new.surface.width_mm, new.surface.height_mm);
                info!(rect = ?self.surface.rect(), "surface updated");
            }
            ConfigChange::DirectionChanged(direction) => {
                self.source.set_direction(*direction);
                self.surface.set_facing(*direction);
                info!(?direction, "facing updated");
            }
            ConfigChange::MirrorChanged(mirror) => {
                info!(mirror, "mirroring updated");
            }
            ConfigChange::ScanChanged(params) => {
                info!(step = params.step, "restarting scanner");
                self.source.restart(*params)?;
            }
            ConfigChange::ClusteringChanged(clustering) => {
                self.pipeline.set_clusterer(RunClusterer::new(
                    clustering.min_run_length,
                    clustering.resample_count,
                ));
                info!(
                    min_run_length = clustering.min_run_length,
                    resample_count = clustering.resample_count,
                    "clustering updated"
                );
            }
            ConfigChange::OutputSizeChanged(output) => {
                info!(
                    width_px = output.width_px,
                    height_px = output.height_px,
                    "output size updated"
                );
            }
            ConfigChange::SendingModeChanged(mode) => {
                info!(?mode, "sending mode updated");
            }
            ConfigChange::TransportChanged { host, port } => {
                let sink = (self.sink_factory)(&new.osc)?;
                self.emitter.set_sink(sink);
                info!(%host, port, "transport rebuilt");
            }
            ConfigChange::AddressChanged(address) => {
                self.emitter.set_address(address.clone());
                info!(%address, "address updated");
            }
            ConfigChange::TickRateChanged(hz) => {
                info!(hz, "tick rate updated");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Overrides;
    use crate::emitter::SendingMode;
    use crate::sensor::{Direction, NoopSource, Point2D, ScanFrame, ScanParameters};
    use crate::transport::MemorySink;
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    /// Source fed from a queue, recording restarts.
    struct QueueSource {
        frames: VecDeque<ScanFrame>,
        direction: Direction,
        restarts: Rc<Cell<usize>>,
    }

    impl ScanSource for QueueSource {
        fn update(&mut self) -> ScanFrame {
            self.frames.pop_front().unwrap_or_default()
        }

        fn direction(&self) -> Direction {
            self.direction
        }

        fn set_direction(&mut self, direction: Direction) {
            self.direction = direction;
        }

        fn restart(&mut self, _params: ScanParameters) -> Result<(), SourceError> {
            self.restarts.set(self.restarts.get() + 1);
            Ok(())
        }

        fn is_connected(&self) -> bool {
            true
        }
    }

    fn memory_factory(sink: &MemorySink) -> SinkFactory {
        let sink = sink.clone();
        Box::new(move |_osc: &OscConfig| {
            Ok::<_, TransportError>(Box::new(sink.clone()) as Box<dyn MessageSink + Send>)
        })
    }

    fn context(frames: Vec<ScanFrame>) -> (AppContext, MemorySink, Rc<Cell<usize>>) {
        let sink = MemorySink::new();
        let restarts = Rc::new(Cell::new(0));
        let source = QueueSource {
            frames: frames.into(),
            direction: Direction::Up,
            restarts: restarts.clone(),
        };
        let mut config = Config::default();
        config.mirror = false;
        let app = AppContext::new(config, Box::new(source), memory_factory(&sink)).unwrap();
        (app, sink, restarts)
    }

    fn row(n: usize, y: f32) -> ScanFrame {
        (0..n)
            .map(|i| Point2D::new(i as f32 * 20.0, y))
            .collect()
    }

    #[test]
    fn test_new_syncs_source() {
        let (app, _sink, restarts) = context(vec![]);
        assert_eq!(app.source().direction(), Direction::Down);
        assert_eq!(restarts.get(), 1);
    }

    #[test]
    fn test_tick_emits_and_counts() {
        let (mut app, sink, _) = context(vec![row(12, 1000.0), ScanFrame::empty()]);

        let outcome = app.tick();
        assert_eq!(outcome.scan_points, 12);
        assert_eq!(outcome.output.touches.len(), 12);
        assert_eq!(outcome.output.clusters.len(), 1);
        assert_eq!(outcome.messages, 12);
        assert_eq!(sink.len(), 12);

        let outcome = app.tick();
        assert_eq!(outcome.messages, 0);
        assert_eq!(app.history().len(), 12);

        let stats = app.stats().snapshot();
        assert_eq!(stats.frames, 2);
        assert_eq!(stats.empty_frames, 1);
        assert_eq!(stats.messages, 12);
    }

    #[test]
    fn test_apply_dispatches_side_effects() {
        let (mut app, sink, restarts) = context(vec![row(12, 1000.0)]);

        let mut new = app.config().clone();
        new.scan.step = 2;
        new.sending_mode = SendingMode::ClusteredPointsAsString;
        new.osc.address = "/touches".to_string();
        new.surface.standoff_mm = 500.0;

        let changes = app.apply(new).unwrap();
        assert_eq!(changes.len(), 4);
        assert_eq!(restarts.get(), 2);
        assert_eq!(app.surface().rect().top, 500.0);

        let outcome = app.tick();
        assert_eq!(outcome.messages, 1);
        assert_eq!(sink.messages()[0].address, "/touches");
    }

    #[test]
    fn test_apply_rejects_invalid_config() {
        let (mut app, _sink, _) = context(vec![]);
        let mut bad = app.config().clone();
        bad.surface.height_mm = 0.0;

        assert!(matches!(app.apply(bad), Err(AppError::Config(_))));
        assert_eq!(app.config().surface.height_mm, 3000.0);
    }

    #[test]
    fn test_reload_keeps_command_line_settings() {
        let overrides = Overrides {
            sending_mode: Some(SendingMode::ClusteredPointsAsString),
            no_mirror: true,
            ..Overrides::default()
        };
        let sink = MemorySink::new();
        let mut config = Config::default();
        overrides.apply_to(&mut config);
        let source = QueueSource {
            frames: vec![row(12, 1000.0)].into(),
            direction: Direction::Down,
            restarts: Rc::new(Cell::new(0)),
        };
        let mut app = AppContext::new(config, Box::new(source), memory_factory(&sink)).unwrap();

        // The file on disk only changed its tick rate
        let mut reloaded = Config::default();
        reloaded.tick_hz = 30;
        overrides.apply_to(&mut reloaded);

        let changes = app.apply(reloaded).unwrap();
        assert_eq!(changes, vec![ConfigChange::TickRateChanged(30)]);
        assert_eq!(
            app.config().sending_mode,
            SendingMode::ClusteredPointsAsString
        );
        assert!(!app.config().mirror);

        let outcome = app.tick();
        assert_eq!(outcome.messages, 1);
    }

    #[test]
    fn test_direction_change_moves_surface() {
        let (mut app, _sink, _) = context(vec![]);
        let mut new = app.config().clone();
        new.surface.facing = Direction::Right;
        app.apply(new).unwrap();

        assert_eq!(app.source().direction(), Direction::Right);
        assert_eq!(app.surface().rect().left, 0.0);
    }

    #[test]
    fn test_disconnected_source_emits_nothing() {
        let sink = MemorySink::new();
        let mut app = AppContext::new(
            Config::default(),
            Box::new(NoopSource::default()),
            memory_factory(&sink),
        )
        .unwrap();

        let outcome = app.tick();
        assert!(outcome.output.is_empty());
        assert!(sink.is_empty());
        assert!(app.history().is_empty());
    }

    #[test]
    fn test_tick_interval() {
        let (app, _sink, _) = context(vec![]);
        assert_eq!(app.tick_interval(), Duration::from_secs_f64(1.0 / 60.0));
    }
}
