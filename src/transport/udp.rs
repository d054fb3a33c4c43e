//! UDP transport for OSC packets.

use super::{MessageSink, OscMessage, TransportError};
use std::net::UdpSocket;
use tracing::{info, warn};

/// Sends each message as one UDP datagram to a fixed target.
///
/// Delivery is fire-and-forget. Send failures are logged here and never
/// surface to the emitter.
pub struct UdpOscSender {
    socket: UdpSocket,
    target: String,
}

impl UdpOscSender {
    /// Bind an ephemeral local port and connect it to `host:port`.
    pub fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let target = format!("{host}:{port}");
        let socket = UdpSocket::bind(("0.0.0.0", 0)).map_err(TransportError::Bind)?;
        socket
            .connect(&target)
            .map_err(|source| TransportError::Connect {
                target: target.clone(),
                source,
            })?;

        info!(%target, "OSC sender ready");
        Ok(Self { socket, target })
    }
}

impl MessageSink for UdpOscSender {
    fn send(&mut self, message: &OscMessage) {
        let packet = match message.encode() {
            Ok(packet) => packet,
            Err(e) => {
                warn!(address = %message.address, error = ?e, "could not encode OSC message");
                return;
            }
        };
        if let Err(e) = self.socket.send(&packet) {
            warn!(target = %self.target, error = %e, "OSC send failed");
        }
    }
}
