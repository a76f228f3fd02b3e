use crate::midi::{MidiError, MidiMessage, MidiSink, Result};
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory sink that records what was sent. Clones share the same log,
/// so a test can keep one handle while the pulse loop owns another.
#[derive(Debug, Clone, Default)]
pub struct MockMidiEngine {
    sent: Arc<Mutex<Vec<MidiMessage>>>,
    failing: bool,
}

impl MockMidiEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every send fails, like a closed transport.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<MidiMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl MidiSink for MockMidiEngine {
    fn send(&mut self, msg: MidiMessage) -> Result<()> {
        if self.failing {
            return Err(MidiError::Send("mock transport closed".to_string()));
        }
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(msg);
        Ok(())
    }
}
