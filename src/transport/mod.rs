//! Outbound transport for touch messages.
//!
//! The emitter only decides message shape and order. Getting the bytes to a
//! listener is the job of a [`MessageSink`].

pub mod memory;
pub mod osc;
pub mod udp;

pub use memory::MemorySink;
pub use osc::{OscArg, OscMessage};
pub use udp::UdpOscSender;

/// Accepts outbound messages. Delivery is fire-and-forget.
pub trait MessageSink {
    fn send(&mut self, message: &OscMessage);
}

/// Errors raised while setting up a transport.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to bind local socket: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to connect to {target}: {source}")]
    Connect {
        target: String,
        #[source]
        source: std::io::Error,
    },
}
