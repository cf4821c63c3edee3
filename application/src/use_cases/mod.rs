//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod analyze_consensus;
pub mod assemble_panel;
pub mod run_panel;
pub(crate) mod shared;
