//! MIDI channel abstraction
//!
//! The synchronization core talks to MIDI through the [`MidiEngine`] trait:
//! a non-blocking `poll` for inbound bytes and a `send` for outbound bytes.
//! [`MidirEngine`] backs it with real ports via midir; [`MockMidiEngine`]
//! scripts inbound traffic and captures outbound traffic for tests.

mod engine;
pub mod midir_engine;
pub mod mock_engine;

pub use engine::{MidiEngine, MidiError, Result};
pub use midir_engine::{list_input_ports, list_output_ports, MidirEngine};
pub use mock_engine::MockMidiEngine;
