//! Usage accounting adapter
//!
//! [`UsageCounter`] implements the [`UsageTracker`](panel_application::UsageTracker)
//! port with atomic totals plus a per-purpose breakdown.

mod counter;

pub use counter::{PurposeUsage, UsageCounter, UsageSnapshot};
