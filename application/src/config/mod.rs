//! Application-level configuration.
//!
//! - [`DeliberationParams`]: rounds, optional phases and generation temperatures

pub mod deliberation_params;

pub use deliberation_params::DeliberationParams;
