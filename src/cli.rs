use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Follow MTC on a port and play back or record timecoded MIDI events
    Follow {
        /// Name of the MIDI port to send to (playback) or capture from (record)
        #[arg(short = 'p', long)]
        port: Option<String>,

        /// Name of the MIDI port carrying MTC, defaults to the same as --port
        #[arg(short = 'm', long)]
        mtc: Option<String>,

        /// Record incoming events instead of playing back
        #[arg(short, long)]
        record: bool,

        /// Event log file to read (playback) or write (record)
        #[arg(short, long, default_value = "events.mtc2midi")]
        config: PathBuf,
    },

    /// Generate MTC on a port from a locally running clock
    Generate {
        /// Name of the MIDI port to send MTC to
        #[arg(short, long)]
        port: Option<String>,

        /// Frame rate: 24, 25, 29.97 or 30
        #[arg(short, long, default_value = "24")]
        fps: String,

        /// Start timecode
        #[arg(short, long, default_value = "00:00:00:00")]
        start: String,

        /// Seconds to run for
        #[arg(short, long, default_value_t = 60.0)]
        duration: f64,
    },

    /// List the available MIDI input and output ports
    ListPorts,
}
