//! OSC message shape for the touch feed.
//!
//! Only the two argument types the feed uses are supported: 32-bit floats
//! and strings. Wire encoding is delegated to `rosc`.

use rosc::{OscPacket, OscType};
use std::fmt;

/// A single OSC argument.
#[derive(Debug, Clone, PartialEq)]
pub enum OscArg {
    Float(f32),
    Str(String),
}

impl From<&OscArg> for OscType {
    fn from(arg: &OscArg) -> Self {
        match arg {
            OscArg::Float(v) => OscType::Float(*v),
            OscArg::Str(s) => OscType::String(s.clone()),
        }
    }
}

impl fmt::Display for OscArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscArg::Float(v) => write!(f, "{v}"),
            OscArg::Str(s) => write!(f, "{s}"),
        }
    }
}

/// An outbound message: an address pattern plus arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct OscMessage {
    pub address: String,
    pub args: Vec<OscArg>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            args: Vec::new(),
        }
    }

    pub fn with_float(mut self, value: f32) -> Self {
        self.args.push(OscArg::Float(value));
        self
    }

    pub fn with_string(mut self, value: impl Into<String>) -> Self {
        self.args.push(OscArg::Str(value.into()));
        self
    }

    /// Wrap as a single-message OSC packet.
    pub fn to_packet(&self) -> OscPacket {
        OscPacket::Message(rosc::OscMessage {
            addr: self.address.clone(),
            args: self.args.iter().map(OscType::from).collect(),
        })
    }

    /// Encode as an OSC 1.0 datagram.
    pub fn encode(&self) -> Result<Vec<u8>, rosc::OscError> {
        rosc::encoder::encode(&self.to_packet())
    }
}

/// Human-readable form: the address followed by space-separated arguments.
impl fmt::Display for OscMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
