pub mod cli;
pub mod engine;
pub mod estimator;
pub mod event_log;
pub mod generator;
pub mod logging;
pub mod midi;
pub mod mtc;
pub mod timecode;
pub mod ui;
