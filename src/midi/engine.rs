use std::error::Error;
use std::fmt;

/// Custom error type for MIDI operations
#[derive(Debug)]
pub enum MidiError {
    /// Error when sending bytes to a port
    SendError(String),
    /// Error when receiving bytes from a port
    RecvError(String),
    /// Error when opening or locating a port
    ConnectionError(String),
}

impl fmt::Display for MidiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MidiError::SendError(msg) => write!(f, "MIDI send error: {}", msg),
            MidiError::RecvError(msg) => write!(f, "MIDI receive error: {}", msg),
            MidiError::ConnectionError(msg) => write!(f, "MIDI connection error: {}", msg),
        }
    }
}

impl Error for MidiError {}

/// Result type for MIDI operations
pub type Result<T> = std::result::Result<T, MidiError>;

/// Trait defining the byte-level channel the synchronization core runs over.
///
/// Nothing here blocks: `poll` returns immediately with `None` when no
/// message is pending, which is what keeps the engine's cooperative loop
/// deterministic.
pub trait MidiEngine: Send {
    /// Non-blocking receive of the next pending raw message, if any.
    fn poll(&mut self) -> Result<Option<Vec<u8>>>;

    /// Sends raw bytes to the port.
    fn send(&mut self, bytes: &[u8]) -> Result<()>;
}
