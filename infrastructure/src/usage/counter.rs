use panel_application::ports::usage::UsageTracker;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

/// Calls and characters for one purpose
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PurposeUsage {
    pub calls: u64,
    pub prompt_chars: usize,
    pub response_chars: usize,
}

/// Point-in-time copy of a [`UsageCounter`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UsageSnapshot {
    pub calls: u64,
    pub prompt_chars: usize,
    pub response_chars: usize,
    pub by_purpose: BTreeMap<String, PurposeUsage>,
}

/// Counts every successful generation call
#[derive(Debug, Default)]
pub struct UsageCounter {
    calls: AtomicU64,
    prompt_chars: AtomicUsize,
    response_chars: AtomicUsize,
    by_purpose: Mutex<BTreeMap<String, PurposeUsage>>,
}

impl UsageCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> UsageSnapshot {
        let by_purpose = self
            .by_purpose
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        UsageSnapshot {
            calls: self.calls.load(Ordering::Relaxed),
            prompt_chars: self.prompt_chars.load(Ordering::Relaxed),
            response_chars: self.response_chars.load(Ordering::Relaxed),
            by_purpose,
        }
    }
}

impl UsageTracker for UsageCounter {
    fn record(&self, purpose: &str, prompt_chars: usize, response_chars: usize) {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.prompt_chars.fetch_add(prompt_chars, Ordering::Relaxed);
        self.response_chars
            .fetch_add(response_chars, Ordering::Relaxed);

        let mut by_purpose = self
            .by_purpose
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let entry = by_purpose.entry(purpose.to_string()).or_default();
        entry.calls += 1;
        entry.prompt_chars += prompt_chars;
        entry.response_chars += response_chars;
    }
}
