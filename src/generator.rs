//! MTC sender: drives a local frame clock and streams it out as MTC
//!
//! Quarter-frame bursts go out at every frame boundary; roughly every ten
//! frame periods a full-frame sysex goes out instead as a resynchronization
//! anchor. The eight quarter frames are emitted by a plain bounded loop over
//! frame types 0 through 7.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{info, trace};

use crate::midi::{MidiEngine, Result};
use crate::mtc::{full_frame, quarter_frames};
use crate::timecode::Timecode;

/// Frame periods between full-frame resync anchors.
const FULL_FRAME_PERIOD: u64 = 10;

/// Streams MTC from a locally running clock
pub struct MtcGenerator<M: MidiEngine> {
    out: M,
    tc: Timecode,
    shutdown: Arc<AtomicBool>,
}

impl<M: MidiEngine> MtcGenerator<M> {
    pub fn new(out: M, start: Timecode) -> Self {
        MtcGenerator {
            out,
            tc: start,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Flag that stops the stream early; hand this to a Ctrl+C handler.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// The timecode of the most recently emitted frame.
    pub fn current(&self) -> Timecode {
        self.tc
    }

    /// Runs the clock for `duration`, emitting as frames come due.
    pub fn run(&mut self, duration: Duration) -> Result<()> {
        let frame_period = Duration::from_secs_f64(1.0 / self.tc.rate().as_f64());
        let start = Instant::now();
        let end = start + duration;
        let mut frame_count: u64 = 0;
        let mut next_frame = start;
        let mut next_full_frame = start;

        info!(
            "Generating MTC from {} at {} for {:?}",
            self.tc,
            self.tc.rate(),
            duration
        );

        loop {
            let now = Instant::now();
            if now > end || self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            if now >= next_full_frame {
                self.tc = self.tc.next();
                frame_count += 1;
                self.send_full_frame()?;
                next_frame = start + frame_period.mul_f64(frame_count as f64);
                next_full_frame = next_frame + frame_period.mul_f64(FULL_FRAME_PERIOD as f64);
            } else if now > next_frame {
                self.tc = self.tc.next();
                frame_count += 1;
                self.send_quarter_frames()?;
                next_frame = start + frame_period.mul_f64(frame_count as f64);
            }

            let wake_at = next_frame.min(next_full_frame).min(end);
            let now = Instant::now();
            if wake_at > now {
                thread::sleep(wake_at - now);
            }
        }

        info!("MTC generation finished at {}", self.tc);
        Ok(())
    }

    fn send_full_frame(&mut self) -> Result<()> {
        trace!("FF {}", self.tc);
        let bytes = full_frame(&self.tc).to_bytes();
        self.out.send(&bytes)
    }

    fn send_quarter_frames(&mut self) -> Result<()> {
        trace!("QF {}", self.tc);
        for message in quarter_frames(&self.tc) {
            self.out.send(&message.to_bytes())?;
        }
        Ok(())
    }
}
