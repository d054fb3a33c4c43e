//! Serialization of touch sets into outbound messages.

use super::history::MessageHistory;
use crate::core::pipeline::{FrameOutput, SurfacePoint};
use crate::transport::{MessageSink, OscMessage};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Default OSC address for touch messages.
pub const DEFAULT_ADDRESS: &str = "/laserPoints";

/// Which output set is sent, and how it is serialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SendingMode {
    /// One message per raw touch, two float arguments
    #[default]
    Point,
    /// One message for all raw touches, as an `x,y/x,y` string
    PointsAsString,
    /// One message per cluster, two float arguments
    ClusteredPoint,
    /// One message for all clusters, as an `x,y/x,y` string
    ClusteredPointsAsString,
}

impl SendingMode {
    pub fn is_clustered(&self) -> bool {
        matches!(
            self,
            SendingMode::ClusteredPoint | SendingMode::ClusteredPointsAsString
        )
    }

    pub fn is_string(&self) -> bool {
        matches!(
            self,
            SendingMode::PointsAsString | SendingMode::ClusteredPointsAsString
        )
    }

    /// Parse a mode name as used on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace(['-', '_'], "").as_str() {
            "point" | "points" => Some(SendingMode::Point),
            "pointsasstring" | "string" => Some(SendingMode::PointsAsString),
            "clusteredpoint" | "clusters" => Some(SendingMode::ClusteredPoint),
            "clusteredpointsasstring" | "clusterstring" => {
                Some(SendingMode::ClusteredPointsAsString)
            }
            _ => None,
        }
    }
}

/// Sends touch sets through a sink and records each message in a history.
pub struct EventEmitter {
    address: String,
    sink: Box<dyn MessageSink + Send>,
    history: MessageHistory,
}

impl EventEmitter {
    pub fn new(address: impl Into<String>, sink: Box<dyn MessageSink + Send>) -> Self {
        Self {
            address: address.into(),
            sink,
            history: MessageHistory::new(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn set_address(&mut self, address: impl Into<String>) {
        self.address = address.into();
    }

    /// Swap the transport. History is kept.
    pub fn set_sink(&mut self, sink: Box<dyn MessageSink + Send>) {
        self.sink = sink;
    }

    /// Read-only view of recently emitted messages.
    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    /// Send the output set selected by `mode`. Returns the number of messages sent.
    pub fn emit_frame(&mut self, output: &FrameOutput, mode: SendingMode) -> usize {
        if mode.is_clustered() {
            self.emit(&output.clusters, mode)
        } else {
            self.emit(&output.touches, mode)
        }
    }

    /// Send `points` using the serialization of `mode`, preserving input order.
    ///
    /// An empty set sends nothing and leaves the history untouched.
    pub fn emit<P: SurfacePoint>(&mut self, points: &[P], mode: SendingMode) -> usize {
        if points.is_empty() {
            return 0;
        }

        if mode.is_string() {
            let payload = points
                .iter()
                .map(|p| {
                    let pos = p.surface_position();
                    format!("{},{}", pos.x, pos.y)
                })
                .collect::<Vec<_>>()
                .join("/");
            self.dispatch(OscMessage::new(self.address.clone()).with_string(payload));
            1
        } else {
            for p in points {
                let pos = p.surface_position();
                self.dispatch(
                    OscMessage::new(self.address.clone())
                        .with_float(pos.x)
                        .with_float(pos.y),
                );
            }
            points.len()
        }
    }

    fn dispatch(&mut self, message: OscMessage) {
        self.sink.send(&message);
        let description = message.to_string();
        trace!(%description, "emitted");
        self.history.push(description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::pipeline::{ClusterPoint, TouchPoint};
    use crate::sensor::types::Point2D;
    use crate::transport::{MemorySink, OscArg};

    fn touch(x: f32, y: f32) -> TouchPoint {
        TouchPoint {
            sensor_space: Point2D::default(),
            surface_space: Point2D::new(x, y),
        }
    }

    fn emitter() -> (EventEmitter, MemorySink) {
        let sink = MemorySink::new();
        (
            EventEmitter::new(DEFAULT_ADDRESS, Box::new(sink.clone())),
            sink,
        )
    }

    #[test]
    fn test_points_as_string() {
        let (mut emitter, sink) = emitter();
        let sent = emitter.emit(&[touch(10.0, 20.0), touch(30.0, 40.0)], SendingMode::PointsAsString);

        assert_eq!(sent, 1);
        let messages = sink.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].address, "/laserPoints");
        assert_eq!(messages[0].args, vec![OscArg::Str("10,20/30,40".to_string())]);
        assert_eq!(
            emitter.history().latest().unwrap().description,
            "/laserPoints 10,20/30,40"
        );
    }

    #[test]
    fn test_one_message_per_point() {
        let (mut emitter, sink) = emitter();
        let sent = emitter.emit(&[touch(1.5, 2.0), touch(3.0, 4.0)], SendingMode::Point);

        assert_eq!(sent, 2);
        let messages = sink.messages();
        assert_eq!(messages[0].args, vec![OscArg::Float(1.5), OscArg::Float(2.0)]);
        assert_eq!(messages[1].args, vec![OscArg::Float(3.0), OscArg::Float(4.0)]);

        let history: Vec<&str> = emitter.history().descriptions().collect();
        assert_eq!(history, vec!["/laserPoints 1.5 2", "/laserPoints 3 4"]);
    }

    #[test]
    fn test_empty_set_is_noop() {
        let (mut emitter, sink) = emitter();
        let none: [TouchPoint; 0] = [];
        assert_eq!(emitter.emit(&none, SendingMode::PointsAsString), 0);
        assert_eq!(emitter.emit(&none, SendingMode::Point), 0);
        assert!(sink.is_empty());
        assert!(emitter.history().is_empty());
    }

    #[test]
    fn test_emit_frame_selects_set_by_mode() {
        let (mut emitter, sink) = emitter();
        let output = FrameOutput {
            touches: vec![touch(1.0, 1.0), touch(2.0, 2.0), touch(3.0, 3.0)],
            clusters: vec![ClusterPoint {
                sensor_space: Point2D::default(),
                surface_space: Point2D::new(2.0, 2.0),
                bounding_radius_mm: 10.0,
            }],
        };

        assert_eq!(emitter.emit_frame(&output, SendingMode::ClusteredPoint), 1);
        assert_eq!(emitter.emit_frame(&output, SendingMode::Point), 3);
        assert_eq!(
            emitter.emit_frame(&output, SendingMode::ClusteredPointsAsString),
            1
        );
        assert_eq!(sink.messages()[4].args, vec![OscArg::Str("2,2".to_string())]);
    }

    #[test]
    fn test_history_holds_latest_thirty() {
        let (mut emitter, _sink) = emitter();
        for i in 0..31 {
            emitter.emit(&[touch(i as f32, 0.0)], SendingMode::Point);
        }
        let history: Vec<&str> = emitter.history().descriptions().collect();
        assert_eq!(history.len(), 30);
        assert_eq!(history[0], "/laserPoints 1 0");
        assert_eq!(history[29], "/laserPoints 30 0");
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(SendingMode::parse("point"), Some(SendingMode::Point));
        assert_eq!(
            SendingMode::parse("points-as-string"),
            Some(SendingMode::PointsAsString)
        );
        assert_eq!(
            SendingMode::parse("ClusteredPointsAsString"),
            Some(SendingMode::ClusteredPointsAsString)
        );
        assert_eq!(SendingMode::parse("bogus"), None);
        assert!(SendingMode::ClusteredPoint.is_clustered());
        assert!(!SendingMode::ClusteredPoint.is_string());
    }
}
