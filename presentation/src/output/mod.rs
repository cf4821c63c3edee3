//! Output formatting for finished panels

pub mod console;
pub mod formatter;
pub mod report;
