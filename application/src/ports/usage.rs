//! Usage accounting port
//!
//! Informed after every successful generation call. Not needed for
//! correctness; adapters count calls and characters per purpose.

/// Callback for generation usage
pub trait UsageTracker: Send + Sync {
    /// `purpose` names the step, e.g. `opening_statements` or `semantic_similarity`.
    fn record(&self, purpose: &str, prompt_chars: usize, response_chars: usize);
}

/// No-op tracker
pub struct NoUsageTracking;

impl UsageTracker for NoUsageTracking {
    fn record(&self, _purpose: &str, _prompt_chars: usize, _response_chars: usize) {}
}
