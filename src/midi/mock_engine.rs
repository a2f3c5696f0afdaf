use crate::midi::{MidiEngine, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Scripted MIDI engine for tests.
///
/// Inbound messages are queued up front and handed out one per `poll`;
/// everything sent is captured in a buffer the test keeps a handle to.
pub struct MockMidiEngine {
    inbound: VecDeque<Vec<u8>>,
    sent: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockMidiEngine {
    pub fn new() -> Self {
        MockMidiEngine {
            inbound: VecDeque::new(),
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queues a raw message for a later `poll`.
    pub fn queue(&mut self, bytes: Vec<u8>) {
        self.inbound.push_back(bytes);
    }

    /// Handle onto the captured outbound messages.
    pub fn sent_handle(&self) -> Arc<Mutex<Vec<Vec<u8>>>> {
        Arc::clone(&self.sent)
    }
}

impl Default for MockMidiEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiEngine for MockMidiEngine {
    fn poll(&mut self) -> Result<Option<Vec<u8>>> {
        Ok(self.inbound.pop_front())
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        self.sent.lock().unwrap().push(bytes.to_vec());
        Ok(())
    }
}
