//! MIDI Time Code wire protocol
//!
//! Two message shapes carry a timecode over MIDI: eight quarter-frame
//! messages (status 0xF1, one nibble of payload each) streamed at every
//! frame boundary, or a single full-frame sysex sent as a periodic
//! resynchronization anchor. [`MtcMessage`] models both; the
//! [`QuarterFrameAccumulator`] reassembles a timecode from the quarter-frame
//! stream.

use crate::timecode::{FrameRate, Timecode};

/// Quarter-frame status byte
pub const QUARTER_FRAME_STATUS: u8 = 0xF1;
/// Sysex start / end
pub const SYSEX_START: u8 = 0xF0;
pub const SYSEX_END: u8 = 0xF7;
/// Universal real-time header identifying an MTC full-frame message
pub const FULL_FRAME_HEADER: [u8; 4] = [0x7F, 0x7F, 0x01, 0x01];

/// A decoded MTC wire message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MtcMessage {
    /// One of the eight nibble carriers. `frame_type` selects which nibble
    /// of the timecode the low-nibble `value` holds.
    QuarterFrame { frame_type: u8, value: u8 },
    /// A complete timecode delivered atomically over sysex.
    FullFrame(Timecode),
}

impl MtcMessage {
    /// Parses raw MIDI bytes into an MTC message.
    ///
    /// Returns `None` for anything that is not MTC: other channel or system
    /// messages, sysex with a foreign header, or truncated payloads. Not an
    /// error, just not ours.
    pub fn from_bytes(data: &[u8]) -> Option<MtcMessage> {
        match data.first()? {
            &QUARTER_FRAME_STATUS => {
                let byte = *data.get(1)?;
                Some(MtcMessage::QuarterFrame {
                    frame_type: (byte >> 4) & 0x07,
                    value: byte & 0x0F,
                })
            }
            &SYSEX_START => {
                if data.len() < 9 || data[1..5] != FULL_FRAME_HEADER {
                    return None;
                }
                let (hours, rate) = unpack_hours(data[5]);
                let tc = Timecode::new(rate, hours, data[6] & 0x3F, data[7] & 0x3F, data[8] & 0x1F).ok()?;
                Some(MtcMessage::FullFrame(tc))
            }
            _ => None,
        }
    }

    /// Serializes for the wire.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            MtcMessage::QuarterFrame { frame_type, value } => {
                vec![QUARTER_FRAME_STATUS, ((frame_type & 0x07) << 4) | (value & 0x0F)]
            }
            MtcMessage::FullFrame(tc) => {
                let mut bytes = Vec::with_capacity(10);
                bytes.push(SYSEX_START);
                bytes.extend_from_slice(&FULL_FRAME_HEADER);
                bytes.push(pack_hours(tc.hours(), tc.rate()));
                bytes.push(tc.minutes());
                bytes.push(tc.seconds());
                bytes.push(tc.frames());
                bytes.push(SYSEX_END);
                bytes
            }
        }
    }
}

/// The hours byte packs the 2-bit rate code above a 5-bit hour.
fn pack_hours(hours: u8, rate: FrameRate) -> u8 {
    (rate.code() << 5) | (hours & 0x1F)
}

fn unpack_hours(byte: u8) -> (u8, FrameRate) {
    (byte & 0x1F, FrameRate::from_code((byte >> 5) & 0x03))
}

/// The eight quarter-frame messages for one timecode, frame types 0 through 7.
///
/// Type 7 carries the high hour bit together with the rate flag; a receiver
/// commits its accumulator when it arrives.
pub fn quarter_frames(tc: &Timecode) -> [MtcMessage; 8] {
    let hours_byte = pack_hours(tc.hours(), tc.rate());
    let nibbles = [
        tc.frames() & 0x0F,
        tc.frames() >> 4,
        tc.seconds() & 0x0F,
        tc.seconds() >> 4,
        tc.minutes() & 0x0F,
        tc.minutes() >> 4,
        hours_byte & 0x0F,
        hours_byte >> 4,
    ];
    let mut messages = [MtcMessage::QuarterFrame {
        frame_type: 0,
        value: 0,
    }; 8];
    for (frame_type, (slot, value)) in messages.iter_mut().zip(nibbles).enumerate() {
        *slot = MtcMessage::QuarterFrame {
            frame_type: frame_type as u8,
            value,
        };
    }
    messages
}

/// The atomic full-frame sysex for one timecode.
pub fn full_frame(tc: &Timecode) -> MtcMessage {
    MtcMessage::FullFrame(*tc)
}

/// Sliding 8-slot window over the most recent nibble seen for each
/// quarter-frame type.
///
/// Slots are continuously overwritten and never reset; a late-starting
/// receiver converges as soon as all eight types have been seen in any
/// order. Type 7 is the commit signal: the assembled timecode is only
/// meaningful once it has been written, since it carries the rate flag.
#[derive(Debug, Default)]
pub struct QuarterFrameAccumulator {
    slots: [u8; 8],
}

impl QuarterFrameAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores one quarter-frame nibble. Returns the committed timecode when
    /// the terminal type 7 arrives, `None` for types 0 through 6.
    pub fn absorb(&mut self, frame_type: u8, value: u8) -> Option<Timecode> {
        self.slots[usize::from(frame_type & 0x07)] = value & 0x0F;
        if frame_type & 0x07 == 7 {
            Some(self.assemble())
        } else {
            None
        }
    }

    /// Routes any MTC message: quarter frames through the window, full
    /// frames decoded directly (they bypass assembly by design).
    pub fn decode(&mut self, message: MtcMessage) -> Option<Timecode> {
        match message {
            MtcMessage::QuarterFrame { frame_type, value } => self.absorb(frame_type, value),
            MtcMessage::FullFrame(tc) => Some(tc),
        }
    }

    fn assemble(&self) -> Timecode {
        let frames = self.slots[0] | ((self.slots[1] & 0x01) << 4);
        let seconds = self.slots[2] | ((self.slots[3] & 0x03) << 4);
        let minutes = self.slots[4] | ((self.slots[5] & 0x03) << 4);
        let hours_byte = self.slots[6] | (self.slots[7] << 4);
        let (hours, rate) = unpack_hours(hours_byte);

        // The slots are masked nibbles, so every field is already in range.
        Timecode::new(rate, hours, minutes, seconds, frames)
            .unwrap_or_else(|_| Timecode::zero(rate))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_frame_byte_layout() {
        let msg = MtcMessage::QuarterFrame {
            frame_type: 5,
            value: 0x0A,
        };
        assert_eq!(msg.to_bytes(), vec![0xF1, 0x5A]);
        assert_eq!(MtcMessage::from_bytes(&[0xF1, 0x5A]), Some(msg));
    }

    #[test]
    fn test_full_frame_byte_layout() {
        let tc = Timecode::new(FrameRate::Fps25, 1, 2, 3, 4).unwrap();
        let bytes = full_frame(&tc).to_bytes();
        // rate code 1 in bits 5-6 of the hours byte
        assert_eq!(
            bytes,
            vec![0xF0, 0x7F, 0x7F, 0x01, 0x01, 0x21, 0x02, 0x03, 0x04, 0xF7]
        );
    }

    #[test]
    fn test_foreign_sysex_ignored() {
        // valid sysex, wrong header
        assert_eq!(
            MtcMessage::from_bytes(&[0xF0, 0x43, 0x12, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0xF7]),
            None
        );
    }

    #[test]
    fn test_truncated_messages_ignored() {
        assert_eq!(MtcMessage::from_bytes(&[]), None);
        assert_eq!(MtcMessage::from_bytes(&[0xF1]), None);
        assert_eq!(MtcMessage::from_bytes(&[0xF0, 0x7F, 0x7F, 0x01, 0x01, 0x21]), None);
    }

    #[test]
    fn test_non_mtc_status_ignored() {
        assert_eq!(MtcMessage::from_bytes(&[0x90, 0x37, 0x56]), None);
        assert_eq!(MtcMessage::from_bytes(&[0xF8]), None);
    }
}
