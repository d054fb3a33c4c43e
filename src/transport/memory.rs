//! In-memory sink, for dry runs and tests.
//!
//! Clones share the same buffer, so one handle can be given to the emitter
//! while another inspects what was sent.

use super::{MessageSink, OscMessage};
use std::sync::{Arc, Mutex, MutexGuard};

/// Records every message instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<OscMessage>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything sent so far, in send order.
    pub fn messages(&self) -> Vec<OscMessage> {
        self.lock().clone()
    }

    /// Number of messages sent so far.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove and return everything sent so far.
    pub fn take(&self) -> Vec<OscMessage> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, Vec<OscMessage>> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl MessageSink for MemorySink {
    fn send(&mut self, message: &OscMessage) {
        self.lock().push(message.clone());
    }
}
