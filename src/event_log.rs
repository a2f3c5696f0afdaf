//! Timecode-triggered event log, parsed from and persisted to a plain text
//! file
//!
//! One event per line: `HH:MM:SS:FF B1,B2,B3 [# comment]`. Blank lines and
//! `#`-leading lines are skipped silently; malformed lines are reported and
//! skipped so one bad line never aborts the file. Text after the bytes that
//! does not start with `#` is ignored on parse and dropped on rewrite.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io::{self, BufRead};
use std::path::Path;

use log::warn;

use crate::timecode::{FrameRate, Timecode};

/// An immutable timecode-stamped 3-byte MIDI command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub timecode: Timecode,
    pub command: [u8; 3],
    /// Trailing comment, kept only so a written log round-trips.
    pub comment: Option<String>,
}

impl Event {
    pub fn new(timecode: Timecode, command: [u8; 3], comment: Option<String>) -> Self {
        Event {
            timecode,
            command,
            comment,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:02X},{:02X},{:02X}",
            self.timecode, self.command[0], self.command[1], self.command[2]
        )?;
        if let Some(comment) = &self.comment {
            write!(f, " # {}", comment)?;
        }
        Ok(())
    }
}

/// Error type for event log I/O
#[derive(Debug)]
pub enum EventLogError {
    Io(io::Error),
}

impl fmt::Display for EventLogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventLogError::Io(e) => write!(f, "event log I/O error: {}", e),
        }
    }
}

impl Error for EventLogError {}

impl From<io::Error> for EventLogError {
    fn from(e: io::Error) -> Self {
        EventLogError::Io(e)
    }
}

/// Ordered sequence of events, non-decreasing by timecode by construction
/// (file line order, or append order while recording). Never re-sorted.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    pub fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Index of the first event strictly after `tc`, or `None` when every
    /// event is at or before it. This is the rescan used after a backward
    /// time jump.
    pub fn first_after(&self, tc: &Timecode) -> Option<usize> {
        self.events.iter().position(|event| event.timecode > *tc)
    }

    /// Parses a log from any line source. Best-effort: malformed lines are
    /// reported through the logger and skipped. Event timecodes are read at
    /// `rate`; comparisons against wire timecodes ignore the rate anyway.
    pub fn parse<R: BufRead>(reader: R, rate: FrameRate) -> Result<Self, EventLogError> {
        let mut log = EventLog::new();
        for line in reader.lines() {
            let line = line?;
            if let Some(event) = parse_line(&line, rate) {
                log.push(event);
            }
        }
        Ok(log)
    }

    /// Loads a log file.
    pub fn load(path: &Path, rate: FrameRate) -> Result<Self, EventLogError> {
        let file = fs::File::open(path)?;
        Self::parse(io::BufReader::new(file), rate)
    }

    /// Renders the log back into the text format, one event per line.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for event in &self.events {
            out.push_str(&event.to_string());
            out.push('\n');
        }
        out
    }

    /// Full-file rewrite. Used both for the periodic record-mode checkpoint
    /// and for the final flush at shutdown.
    pub fn save(&self, path: &Path) -> Result<(), EventLogError> {
        fs::write(path, self.to_text())?;
        Ok(())
    }
}

/// Parses one line; `None` for blanks, comments, and reported junk.
fn parse_line(line: &str, rate: FrameRate) -> Option<Event> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }

    let mut fields = trimmed.split_whitespace();
    let tc_field = fields.next()?;
    let Some(hex_field) = fields.next() else {
        warn!("ignoring event line with missing command bytes: {}", trimmed);
        return None;
    };

    let timecode = match Timecode::parse(tc_field, rate) {
        Ok(tc) => tc,
        Err(e) => {
            warn!("ignoring event line ({}): {}", e, trimmed);
            return None;
        }
    };

    let Some(command) = parse_command(hex_field) else {
        warn!(
            "ignoring event line, command is not three hex bytes: {}",
            trimmed
        );
        return None;
    };

    // everything after the bytes is ignored unless it is a comment
    let comment = trimmed
        .find('#')
        .map(|i| trimmed[i + 1..].trim().to_string())
        .filter(|c| !c.is_empty());

    Some(Event::new(timecode, command, comment))
}

fn parse_command(field: &str) -> Option<[u8; 3]> {
    let mut bytes = [0u8; 3];
    let mut parts = field.split(',');
    for slot in bytes.iter_mut() {
        *slot = u8::from_str_radix(parts.next()?, 16).ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = "\
# header comment

01:10:04:21 90,37,56 # -> note_on channel=0 note=55 velocity=86
01:10:05:01 90,37,00
01:10:06:23 B0,01,75 everything after the three bytes will be ignored
";

    #[test]
    fn test_parse_sample_config() {
        let log = EventLog::parse(Cursor::new(SAMPLE), FrameRate::Fps24).unwrap();
        assert_eq!(log.len(), 3);
        assert_eq!(log.get(0).unwrap().command, [0x90, 0x37, 0x56]);
        assert_eq!(
            log.get(0).unwrap().comment.as_deref(),
            Some("-> note_on channel=0 note=55 velocity=86")
        );
        assert_eq!(log.get(1).unwrap().comment, None);
        // trailing junk without '#' is ignored, not kept as a comment
        assert_eq!(log.get(2).unwrap().comment, None);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = "01:10:04:21 90,37,56\n01:10:05:01\nnot-a-timecode 90,37,56\n01:10:06:00 90,zz,56\n";
        let log = EventLog::parse(Cursor::new(text), FrameRate::Fps24).unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_round_trip_preserves_comments() {
        let log = EventLog::parse(Cursor::new(SAMPLE), FrameRate::Fps24).unwrap();
        let text = log.to_text();
        let reparsed = EventLog::parse(Cursor::new(text.as_str()), FrameRate::Fps24).unwrap();
        assert_eq!(log.events(), reparsed.events());
    }

    #[test]
    fn test_first_after() {
        let log = EventLog::parse(Cursor::new(SAMPLE), FrameRate::Fps24).unwrap();
        let early = Timecode::parse("00:00:00:10", FrameRate::Fps24).unwrap();
        assert_eq!(log.first_after(&early), Some(0));

        let mid = Timecode::parse("01:10:04:21", FrameRate::Fps24).unwrap();
        assert_eq!(log.first_after(&mid), Some(1));

        let late = Timecode::parse("23:00:00:00", FrameRate::Fps24).unwrap();
        assert_eq!(log.first_after(&late), None);
    }
}
