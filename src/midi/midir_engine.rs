use crate::midi::{MidiEngine, MidiError, Result};
use crossbeam::channel::{unbounded, Receiver, TryRecvError};
use log::info;
use midir::{Ignore, MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};

/// Real MIDI port access via midir.
///
/// Input bytes arrive on the driver's callback thread and are handed over a
/// crossbeam channel; `poll` drains it with `try_recv` so the engine side
/// never blocks. The connections close when the engine is dropped.
pub struct MidirEngine {
    #[allow(dead_code)]
    input: Option<MidiInputConnection<()>>,
    output: Option<MidiOutputConnection>,
    rx: Option<Receiver<Vec<u8>>>,
}

impl MidirEngine {
    /// Opens an input port whose name contains `name`.
    pub fn open_input(name: &str) -> Result<Self> {
        let mut midi_in = MidiInput::new("mtcsyncrs-in")
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;
        midi_in.ignore(Ignore::None);

        let in_ports = midi_in.ports();
        let in_port = in_ports
            .iter()
            .find(|p| midi_in.port_name(p).unwrap_or_default().contains(name))
            .ok_or_else(|| MidiError::ConnectionError(format!("input port '{}' not found", name)))?;

        let (tx, rx) = unbounded();
        let input = midi_in
            .connect(
                in_port,
                "mtcsyncrs-input",
                move |_stamp, message, _| {
                    let _ = tx.send(message.to_vec());
                },
                (),
            )
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        info!("Opened MIDI input port matching '{}'", name);
        Ok(MidirEngine {
            input: Some(input),
            output: None,
            rx: Some(rx),
        })
    }

    /// Opens an output port whose name contains `name`.
    pub fn open_output(name: &str) -> Result<Self> {
        let midi_out = MidiOutput::new("mtcsyncrs-out")
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        let out_ports = midi_out.ports();
        let out_port = out_ports
            .iter()
            .find(|p| midi_out.port_name(p).unwrap_or_default().contains(name))
            .ok_or_else(|| {
                MidiError::ConnectionError(format!("output port '{}' not found", name))
            })?;

        let output = midi_out
            .connect(out_port, "mtcsyncrs-output")
            .map_err(|e| MidiError::ConnectionError(e.to_string()))?;

        info!("Opened MIDI output port matching '{}'", name);
        Ok(MidirEngine {
            input: None,
            output: Some(output),
            rx: None,
        })
    }
}

impl MidiEngine for MidirEngine {
    fn poll(&mut self) -> Result<Option<Vec<u8>>> {
        let Some(rx) = &self.rx else {
            return Ok(None);
        };
        match rx.try_recv() {
            Ok(bytes) => Ok(Some(bytes)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(MidiError::RecvError("input connection dropped".to_string()))
            }
        }
    }

    fn send(&mut self, bytes: &[u8]) -> Result<()> {
        let Some(output) = &mut self.output else {
            return Err(MidiError::SendError("no output connection".to_string()));
        };
        output
            .send(bytes)
            .map_err(|e| MidiError::SendError(e.to_string()))
    }
}

/// Names of the available MIDI input ports.
pub fn list_input_ports() -> Vec<String> {
    let mut ports = Vec::new();
    if let Ok(midi_in) = MidiInput::new("mtcsyncrs-list") {
        for port in midi_in.ports() {
            if let Ok(name) = midi_in.port_name(&port) {
                ports.push(name);
            }
        }
    }
    ports
}

/// Names of the available MIDI output ports.
pub fn list_output_ports() -> Vec<String> {
    let mut ports = Vec::new();
    if let Ok(midi_out) = MidiOutput::new("mtcsyncrs-list") {
        for port in midi_out.ports() {
            if let Ok(name) = midi_out.port_name(&port) {
                ports.push(name);
            }
        }
    }
    ports
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_without_output_connection_errors() {
        let mut engine = MidirEngine {
            input: None,
            output: None,
            rx: None,
        };
        assert!(matches!(
            engine.send(&[0x90, 0x30, 0x40]),
            Err(MidiError::SendError(_))
        ));
        // polling with no input just reports no pending message
        assert!(engine.poll().unwrap().is_none());
    }
}
