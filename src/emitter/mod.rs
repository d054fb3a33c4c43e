//! Event emission for the laser touch pipeline.
//!
//! This module turns the selected output set of a frame into outbound
//! messages and keeps a bounded history of what was sent.

pub mod events;
pub mod history;

// Re-export commonly used types
pub use events::{EventEmitter, SendingMode, DEFAULT_ADDRESS};
pub use history::{HistoryEntry, MessageHistory, HISTORY_CAPACITY};
