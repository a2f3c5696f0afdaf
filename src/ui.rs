//! Terminal status display
//!
//! A single indicatif spinner stands in for the carriage-return status line
//! the engine's predecessors printed: current timecode plus the next event
//! due or the last line captured.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub fn create_status_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {wide_msg}")
            .unwrap(),
    );
    pb.set_prefix("MTC");
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
