//! SMPTE-style timecode values at a fixed frame rate
//!
//! A [`Timecode`] is an immutable HH:MM:SS:FF position. Arithmetic rolls
//! overflow frame→second→minute→hour and wraps at 24 hours. Ordering and
//! equality compare the position only, not the frame rate, so entries parsed
//! from an event log before the wire rate is known still compare correctly
//! against timecodes decoded off the wire.

use std::cmp::Ordering;
use std::error::Error;
use std::fmt;
use std::str::FromStr;

/// The four frame rates the MTC rate flag can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRate {
    /// 24 fps - film
    Fps24,
    /// 25 fps - PAL
    Fps25,
    /// 29.97 fps (30000/1001) - NTSC drop-frame
    Fps29_97,
    /// 30 fps
    Fps30,
}

impl FrameRate {
    /// The 2-bit rate code carried in quarter-frame type 7 and the full-frame
    /// hours byte: 0=24, 1=25, 2=29.97 drop, 3=30.
    pub fn code(&self) -> u8 {
        match self {
            FrameRate::Fps24 => 0,
            FrameRate::Fps25 => 1,
            FrameRate::Fps29_97 => 2,
            FrameRate::Fps30 => 3,
        }
    }

    /// Decodes the 2-bit wire code. Only the low two bits are inspected.
    pub fn from_code(code: u8) -> Self {
        match code & 0x03 {
            0 => FrameRate::Fps24,
            1 => FrameRate::Fps25,
            2 => FrameRate::Fps29_97,
            _ => FrameRate::Fps30,
        }
    }

    /// Nominal integer frames per second used for timecode arithmetic.
    /// Drop-frame 29.97 counts 30 frame numbers per second.
    pub fn frames_per_second(&self) -> u32 {
        match self {
            FrameRate::Fps24 => 24,
            FrameRate::Fps25 => 25,
            FrameRate::Fps29_97 | FrameRate::Fps30 => 30,
        }
    }

    /// Exact rate for wall-clock extrapolation (29.97 = 30000/1001).
    pub fn as_f64(&self) -> f64 {
        match self {
            FrameRate::Fps24 => 24.0,
            FrameRate::Fps25 => 25.0,
            FrameRate::Fps29_97 => 30_000.0 / 1001.0,
            FrameRate::Fps30 => 30.0,
        }
    }
}

impl fmt::Display for FrameRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameRate::Fps24 => write!(f, "24 fps"),
            FrameRate::Fps25 => write!(f, "25 fps"),
            FrameRate::Fps29_97 => write!(f, "29.97 fps"),
            FrameRate::Fps30 => write!(f, "30 fps"),
        }
    }
}

impl FromStr for FrameRate {
    type Err = TimecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "24" => Ok(FrameRate::Fps24),
            "25" => Ok(FrameRate::Fps25),
            "29.97" | "30drop" => Ok(FrameRate::Fps29_97),
            "30" => Ok(FrameRate::Fps30),
            _ => Err(TimecodeError::UnsupportedRate(s.to_string())),
        }
    }
}

/// Error type for timecode parsing and construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimecodeError {
    /// Input did not match HH:MM:SS:FF
    ParseError(String),
    /// A field was outside its legal range
    FieldRange { field: &'static str, value: u32 },
    /// Frame rate string is not one of 24/25/29.97/30
    UnsupportedRate(String),
}

impl fmt::Display for TimecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimecodeError::ParseError(s) => {
                write!(f, "invalid timecode '{}', expected HH:MM:SS:FF", s)
            }
            TimecodeError::FieldRange { field, value } => {
                write!(f, "timecode {} value {} out of range", field, value)
            }
            TimecodeError::UnsupportedRate(s) => {
                write!(f, "unsupported frame rate '{}'", s)
            }
        }
    }
}

impl Error for TimecodeError {}

/// An HH:MM:SS:FF position at a fixed frame rate, always normalized
#[derive(Debug, Clone, Copy)]
pub struct Timecode {
    rate: FrameRate,
    hours: u8,
    minutes: u8,
    seconds: u8,
    frames: u8,
}

impl Timecode {
    /// Frame zero of hour zero at the given rate.
    pub fn zero(rate: FrameRate) -> Self {
        Timecode {
            rate,
            hours: 0,
            minutes: 0,
            seconds: 0,
            frames: 0,
        }
    }

    /// Builds a timecode, rejecting out-of-range fields.
    pub fn new(rate: FrameRate, hours: u8, minutes: u8, seconds: u8, frames: u8) -> Result<Self, TimecodeError> {
        if hours > 23 {
            return Err(TimecodeError::FieldRange {
                field: "hours",
                value: u32::from(hours),
            });
        }
        if minutes > 59 {
            return Err(TimecodeError::FieldRange {
                field: "minutes",
                value: u32::from(minutes),
            });
        }
        if seconds > 59 {
            return Err(TimecodeError::FieldRange {
                field: "seconds",
                value: u32::from(seconds),
            });
        }
        if u32::from(frames) >= rate.frames_per_second() {
            return Err(TimecodeError::FieldRange {
                field: "frames",
                value: u32::from(frames),
            });
        }
        Ok(Timecode {
            rate,
            hours,
            minutes,
            seconds,
            frames,
        })
    }

    /// Parses `HH:MM:SS:FF` at the given rate.
    pub fn parse(s: &str, rate: FrameRate) -> Result<Self, TimecodeError> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(TimecodeError::ParseError(s.to_string()));
        }
        let mut fields = [0u8; 4];
        for (slot, part) in fields.iter_mut().zip(&parts) {
            *slot = part
                .parse::<u8>()
                .map_err(|_| TimecodeError::ParseError(s.to_string()))?;
        }
        Timecode::new(rate, fields[0], fields[1], fields[2], fields[3])
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    pub fn hours(&self) -> u8 {
        self.hours
    }

    pub fn minutes(&self) -> u8 {
        self.minutes
    }

    pub fn seconds(&self) -> u8 {
        self.seconds
    }

    pub fn frames(&self) -> u8 {
        self.frames
    }

    /// Absolute frame count since 00:00:00:00 at the nominal rate.
    pub fn total_frames(&self) -> u64 {
        let fps = u64::from(self.rate.frames_per_second());
        let seconds = u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds);
        seconds * fps + u64::from(self.frames)
    }

    /// Returns this timecode advanced by `count` frames, normalized and
    /// wrapped at 24 hours.
    pub fn add(&self, count: u64) -> Timecode {
        let fps = u64::from(self.rate.frames_per_second());
        let frames_per_day = 24 * 3600 * fps;
        let total = (self.total_frames() + count) % frames_per_day;

        let frames = (total % fps) as u8;
        let seconds_total = total / fps;
        Timecode {
            rate: self.rate,
            hours: (seconds_total / 3600) as u8,
            minutes: ((seconds_total / 60) % 60) as u8,
            seconds: (seconds_total % 60) as u8,
            frames,
        }
    }

    /// The next frame; `add(1)` spelled the way callers that step a running
    /// clock read best.
    pub fn next(&self) -> Timecode {
        self.add(1)
    }

    fn position(&self) -> (u8, u8, u8, u8) {
        (self.hours, self.minutes, self.seconds, self.frames)
    }
}

// Ordering and equality deliberately ignore the rate: an event list parsed at
// a provisional rate must still order against wire-decoded timecodes.
impl PartialEq for Timecode {
    fn eq(&self, other: &Self) -> bool {
        self.position() == other.position()
    }
}

impl Eq for Timecode {}

impl PartialOrd for Timecode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timecode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.position().cmp(&other.position())
    }
}

impl fmt::Display for Timecode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.hours, self.minutes, self.seconds, self.frames
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_validation() {
        assert!(Timecode::new(FrameRate::Fps24, 23, 59, 59, 23).is_ok());
        assert!(Timecode::new(FrameRate::Fps24, 24, 0, 0, 0).is_err());
        assert!(Timecode::new(FrameRate::Fps24, 0, 60, 0, 0).is_err());
        assert!(Timecode::new(FrameRate::Fps24, 0, 0, 0, 24).is_err());
        // 24 is a valid frame number at 25 fps
        assert!(Timecode::new(FrameRate::Fps25, 0, 0, 0, 24).is_ok());
    }

    #[test]
    fn test_add_rolls_fields() {
        let tc = Timecode::new(FrameRate::Fps24, 0, 0, 0, 23).unwrap();
        let next = tc.add(1);
        assert_eq!(next.to_string(), "00:00:01:00");

        let tc = Timecode::new(FrameRate::Fps24, 0, 0, 59, 23).unwrap();
        assert_eq!(tc.add(1).to_string(), "00:01:00:00");

        let tc = Timecode::new(FrameRate::Fps24, 0, 59, 59, 23).unwrap();
        assert_eq!(tc.add(1).to_string(), "01:00:00:00");
    }

    #[test]
    fn test_add_wraps_at_24_hours() {
        let tc = Timecode::new(FrameRate::Fps24, 23, 59, 59, 23).unwrap();
        assert_eq!(tc.add(1), Timecode::zero(FrameRate::Fps24));
    }

    #[test]
    fn test_add_many_frames() {
        let tc = Timecode::zero(FrameRate::Fps25);
        // one hour of frames at 25 fps
        assert_eq!(tc.add(25 * 3600).to_string(), "01:00:00:00");
    }

    #[test]
    fn test_parse_format_round_trip() {
        let tc = Timecode::parse("01:10:04:21", FrameRate::Fps24).unwrap();
        assert_eq!(tc.to_string(), "01:10:04:21");
        assert_eq!(tc.hours(), 1);
        assert_eq!(tc.frames(), 21);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(Timecode::parse("01:10:04", FrameRate::Fps24).is_err());
        assert!(Timecode::parse("aa:bb:cc:dd", FrameRate::Fps24).is_err());
        assert!(Timecode::parse("01:10:04:99", FrameRate::Fps24).is_err());
    }

    #[test]
    fn test_ordering_ignores_rate() {
        let a = Timecode::parse("00:00:01:00", FrameRate::Fps24).unwrap();
        let b = Timecode::parse("00:00:01:00", FrameRate::Fps30).unwrap();
        assert_eq!(a, b);

        let later = Timecode::parse("00:00:02:00", FrameRate::Fps30).unwrap();
        assert!(a < later);
    }

    #[test]
    fn test_rate_code_round_trip() {
        for rate in [
            FrameRate::Fps24,
            FrameRate::Fps25,
            FrameRate::Fps29_97,
            FrameRate::Fps30,
        ] {
            assert_eq!(FrameRate::from_code(rate.code()), rate);
        }
    }
}
