//! Core domain concepts shared across all subdomains.
//!
//! - [`question::Question`]: a validated question to put before a panel
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: text helpers used when quoting member output

pub mod error;
pub mod question;
pub mod string;
