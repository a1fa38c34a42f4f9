//! Wait urgency: how long a party has been waiting, in three bands.
//!
//! With threshold `T`: below `T/2` is low, `[T/2, T)` is medium, `T` and above
//! is high. Recomputed on every render so bands advance as time passes.

use serde::{Deserialize, Serialize};

use crate::config::UrgencyConfig;

/// Urgency band for a waiting party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifies elapsed waiting time against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrgencyPolicy {
    threshold_ms: i64,
}

pub const DEFAULT_THRESHOLD_MS: i64 = 60_000;

impl UrgencyPolicy {
    /// Zero is bumped to 1ms so every band stays well defined.
    pub fn new(threshold_ms: u64) -> Self {
        let threshold_ms = i64::try_from(threshold_ms).unwrap_or(i64::MAX).max(1);
        Self { threshold_ms }
    }

    pub fn from_config(config: &UrgencyConfig) -> Self {
        Self::new(config.threshold_ms)
    }

    pub fn threshold_ms(&self) -> i64 {
        self.threshold_ms
    }

    /// Classify a party booked at `booked_at`, as of `now` (both epoch millis).
    /// A booking in the future (clock skew) counts as zero elapsed.
    pub fn classify(&self, booked_at: i64, now: i64) -> Urgency {
        self.classify_elapsed(now.saturating_sub(booked_at).max(0))
    }

    pub fn classify_elapsed(&self, elapsed_ms: i64) -> Urgency {
        if elapsed_ms >= self.threshold_ms {
            Urgency::High
        } else if elapsed_ms >= self.threshold_ms / 2 {
            Urgency::Medium
        } else {
            Urgency::Low
        }
    }
}

impl Default for UrgencyPolicy {
    fn default() -> Self {
        Self { threshold_ms: DEFAULT_THRESHOLD_MS }
    }
}
