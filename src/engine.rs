//! The real-time synchronization loop
//!
//! Single-threaded cooperative polling: each iteration drains at most one
//! message from the MTC source, updates the clock estimate, recomputes "now"
//! and then either fires due events (playback) or captures one inbound
//! command (record). A short fixed sleep between iterations yields the
//! processor without becoming the dominant source of jitter; the accuracy
//! budget is MTC's sparse update cadence, not CPU contention.
//!
//! All mutable state lives inside the engine instance and is touched only by
//! the loop, so there is nothing to lock. Cancellation is a shared flag
//! checked once per iteration; the final event-log flush still runs after it
//! is seen.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use indicatif::ProgressBar;
use log::{debug, info};

use crate::estimator::ClockEstimate;
use crate::event_log::{Event, EventLog, EventLogError};
use crate::midi::{MidiEngine, MidiError};
use crate::mtc::{MtcMessage, QuarterFrameAccumulator};
use crate::timecode::Timecode;

/// Sleep between loop iterations. Small enough that the MTC update cadence,
/// not the sleep, bounds scheduling accuracy.
pub const POLL_INTERVAL: Duration = Duration::from_micros(100);

/// Full-log rewrite every this many captured events, bounding data loss on
/// abrupt termination.
pub const CHECKPOINT_INTERVAL: usize = 10;

/// Operating mode, fixed for the lifetime of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fire events from the log as the estimated clock passes them.
    Playback,
    /// Append inbound commands stamped with the estimated clock.
    Record,
}

/// Error type for engine failures. Only MIDI and persistence I/O abort a
/// run; everything else degrades gracefully.
#[derive(Debug)]
pub enum EngineError {
    Midi(MidiError),
    Log(EventLogError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Midi(e) => write!(f, "engine MIDI failure: {}", e),
            EngineError::Log(e) => write!(f, "engine event log failure: {}", e),
        }
    }
}

impl Error for EngineError {}

impl From<MidiError> for EngineError {
    fn from(e: MidiError) -> Self {
        EngineError::Midi(e)
    }
}

impl From<EventLogError> for EngineError {
    fn from(e: EventLogError) -> Self {
        EngineError::Log(e)
    }
}

/// The synchronization engine.
///
/// `mtc` is the port carrying MTC. `midi` is the event port: the sink in
/// playback, a separate capture source in record. When `midi` is absent the
/// MTC port does both jobs, matching the one-port setups the original
/// hardware rigs use.
pub struct SyncEngine<M: MidiEngine> {
    mtc: M,
    midi: Option<M>,
    mode: Mode,
    log: EventLog,
    log_path: PathBuf,
    // None means "no upcoming event": either not yet scanned, exhausted, or
    // invalidated by a backward jump. Each committed timecode retries the
    // scan, so a rewound timeline picks the right event back up.
    cursor: Option<usize>,
    clock: Option<ClockEstimate>,
    accumulator: QuarterFrameAccumulator,
    shutdown: Arc<AtomicBool>,
    status: Option<ProgressBar>,
    captured: usize,
    checkpoints: usize,
    stale_reported: bool,
}

impl<M: MidiEngine> SyncEngine<M> {
    pub fn new(mtc: M, mode: Mode, log: EventLog, log_path: impl Into<PathBuf>) -> Self {
        SyncEngine {
            mtc,
            midi: None,
            mode,
            log,
            log_path: log_path.into(),
            cursor: None,
            clock: None,
            accumulator: QuarterFrameAccumulator::new(),
            shutdown: Arc::new(AtomicBool::new(false)),
            status: None,
            captured: 0,
            checkpoints: 0,
            stale_reported: false,
        }
    }

    /// Attaches a dedicated event port (sink in playback, capture source in
    /// record).
    pub fn with_midi(mut self, midi: M) -> Self {
        self.midi = Some(midi);
        self
    }

    /// Attaches a status spinner for the rolling one-line display.
    pub fn with_status(mut self, status: ProgressBar) -> Self {
        self.status = Some(status);
        self
    }

    /// Flag that stops the loop; hand this to a Ctrl+C handler.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    /// Events captured so far in record mode.
    pub fn captured(&self) -> usize {
        self.captured
    }

    /// Checkpoint writes performed so far (excluding the final flush).
    pub fn checkpoints(&self) -> usize {
        self.checkpoints
    }

    /// True once the first timecode has been committed.
    pub fn is_tracking(&self) -> bool {
        self.clock.is_some()
    }

    /// Runs until the shutdown flag is raised, then flushes.
    pub fn run(&mut self) -> Result<(), EngineError> {
        info!("Synchronization engine running in {:?} mode", self.mode);
        while !self.shutdown.load(Ordering::SeqCst) {
            self.step(Instant::now())?;
            thread::sleep(POLL_INTERVAL);
        }
        info!("Cancellation requested, shutting down");
        self.finish()
    }

    /// One loop iteration at the given instant. Public so tests and external
    /// drivers can run the engine against a simulated clock.
    pub fn step(&mut self, now: Instant) -> Result<(), EngineError> {
        // grab the timecode update first; events are stamped against it
        let mtc_bytes = self.mtc.poll()?;
        if let Some(bytes) = &mtc_bytes {
            if let Some(message) = MtcMessage::from_bytes(bytes) {
                if let Some(tc) = self.accumulator.decode(message) {
                    self.on_timecode(tc, now);
                }
            }
        }

        // Idle until the first committed timecode
        let Some(clock) = &self.clock else {
            return Ok(());
        };
        let tc_now = clock.now(now);
        self.report_staleness(now, &tc_now);

        match self.mode {
            Mode::Playback => self.fire_due(&tc_now)?,
            Mode::Record => self.capture(mtc_bytes, tc_now)?,
        }
        Ok(())
    }

    /// Final flush; run() calls this after cancellation, but external
    /// drivers stepping the engine by hand must call it themselves.
    pub fn finish(&mut self) -> Result<(), EngineError> {
        if self.mode == Mode::Record && self.captured > 0 {
            self.log.save(&self.log_path)?;
            info!(
                "Final flush: {} events written to {}",
                self.log.len(),
                self.log_path.display()
            );
        }
        Ok(())
    }

    fn on_timecode(&mut self, tc: Timecode, now: Instant) {
        let backward = self
            .clock
            .as_ref()
            .is_some_and(|clock| tc < clock.last_confirmed());
        if backward {
            info!("Time went backward to {}, resetting playback cursor", tc);
            self.cursor = None;
        }

        match &mut self.clock {
            Some(clock) => clock.confirm(tc, now),
            None => {
                info!("Locked to incoming timecode {} at {}", tc, tc.rate());
                self.clock = Some(ClockEstimate::new(tc, now));
            }
        }
        self.stale_reported = false;

        // with no upcoming event, try to find one past the committed time
        if self.mode == Mode::Playback && self.cursor.is_none() {
            self.cursor = self.log.first_after(&tc);
            match self.cursor.and_then(|i| self.log.get(i)) {
                Some(event) => self.set_status(format!("{} NEXT EVENT: {}", tc, event)),
                None => self.set_status(format!(
                    "{} no upcoming events, still listening in case the timeline resets",
                    tc
                )),
            }
        }
    }

    fn report_staleness(&mut self, now: Instant, tc_now: &Timecode) {
        let stale = self
            .clock
            .as_ref()
            .is_some_and(|clock| clock.is_stale(now));
        if stale && !self.stale_reported {
            info!("MTC source went silent, clock frozen at {}", tc_now);
            self.set_status(format!("{} (frozen, no MTC)", tc_now));
            self.stale_reported = true;
        }
    }

    /// Sends every event the estimated clock has reached, in order.
    fn fire_due(&mut self, tc_now: &Timecode) -> Result<(), EngineError> {
        while let Some(index) = self.cursor {
            let Some(event) = self.log.get(index) else {
                self.cursor = None;
                break;
            };
            if event.timecode > *tc_now {
                break;
            }

            let command = event.command;
            let line = format!("{} fired {}", tc_now, event);
            match &mut self.midi {
                Some(midi) => midi.send(&command)?,
                None => self.mtc.send(&command)?,
            }
            info!("{}", line);
            self.set_status(line);

            let next = index + 1;
            self.cursor = if next < self.log.len() {
                Some(next)
            } else {
                debug!("Event log exhausted, tracking clock only");
                None
            };
        }
        Ok(())
    }

    /// Appends one inbound non-MTC command stamped with the estimated clock.
    fn capture(&mut self, mtc_bytes: Option<Vec<u8>>, tc_now: Timecode) -> Result<(), EngineError> {
        let bytes = match &mut self.midi {
            Some(midi) => midi.poll()?,
            // one port can do both jobs
            None => mtc_bytes,
        };
        let Some(bytes) = bytes else {
            return Ok(());
        };
        // MTC itself is never recorded, and neither is any other system
        // message: sysex and real-time traffic does not fit the 3-byte
        // command shape.
        if bytes.is_empty() || bytes[0] >= 0xF0 {
            return Ok(());
        }

        // The persisted format is fixed-width, always three bytes; 2-byte
        // commands (program change, channel aftertouch) carry a trailing
        // 00 pad.
        let mut command = [0u8; 3];
        for (slot, byte) in command.iter_mut().zip(&bytes) {
            *slot = *byte;
        }
        let event = Event::new(tc_now, command, Some(describe_command(&command)));
        self.set_status(event.to_string());
        self.log.push(event);
        self.captured += 1;

        if self.captured % CHECKPOINT_INTERVAL == 0 {
            self.log.save(&self.log_path)?;
            self.checkpoints += 1;
            debug!(
                "Checkpoint {}: {} events written to {}",
                self.checkpoints,
                self.log.len(),
                self.log_path.display()
            );
        }
        Ok(())
    }

    fn set_status(&self, message: String) {
        if let Some(status) = &self.status {
            status.set_message(message);
        }
    }
}

/// Human-readable gloss stored as the comment of a captured event.
fn describe_command(command: &[u8; 3]) -> String {
    let channel = command[0] & 0x0F;
    match command[0] & 0xF0 {
        0x80 => format!("note_off channel={} note={} velocity={}", channel, command[1], command[2]),
        0x90 => format!("note_on channel={} note={} velocity={}", channel, command[1], command[2]),
        0xA0 => format!("polytouch channel={} note={} value={}", channel, command[1], command[2]),
        0xB0 => format!("control_change channel={} control={} value={}", channel, command[1], command[2]),
        0xC0 => format!("program_change channel={} program={}", channel, command[1]),
        0xD0 => format!("aftertouch channel={} value={}", channel, command[1]),
        0xE0 => format!("pitchwheel channel={} lsb={} msb={}", channel, command[1], command[2]),
        _ => format!("raw {:02X} {:02X} {:02X}", command[0], command[1], command[2]),
    }
}
