//! Library side of the `kartlog` binary: argument parsing and the parse report.

pub mod args;
pub mod report;

pub use args::{Command, ParseArgs};
pub use report::{ParseReport, NO_LAP_DATA_MESSAGE};
