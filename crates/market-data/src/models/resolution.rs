//! Attempt tracking for resolution diagnostics.

use super::quote::{FundNav, Quote, SourceTier};

/// How one attempt within a tier ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AttemptOutcome {
    Success,
    RateLimited,
    Failed,
    Skipped,
}

/// Record of a single attempt during a resolution.
#[derive(Clone, Debug)]
pub struct AttemptTrace {
    pub tier: SourceTier,
    pub detail: String,
    pub outcome: AttemptOutcome,
}

/// A resolved quote with its serving path.
///
/// A cache hit returns the stored quote verbatim: `quote.source_tier`
/// keeps the provenance of whichever tier produced it, while
/// `served_from` says the cache answered this call.
#[derive(Clone, Debug)]
pub struct Resolution {
    pub quote: Quote,
    pub served_from: SourceTier,
    pub attempts: Vec<AttemptTrace>,
}

/// A resolved fund NAV with its serving path.
#[derive(Clone, Debug)]
pub struct NavResolution {
    pub nav: FundNav,
    pub served_from: SourceTier,
    pub attempts: Vec<AttemptTrace>,
}

/// Ordered attempt records collected while a resolution walks the
/// tier ladder.
#[derive(Clone, Debug, Default)]
pub struct AttemptLog {
    attempts: Vec<AttemptTrace>,
}

impl AttemptLog {
    pub fn new() -> Self {
        Self {
            attempts: Vec::new(),
        }
    }

    pub fn record_success(&mut self, tier: SourceTier, detail: &str) {
        self.record(tier, detail, AttemptOutcome::Success);
    }

    pub fn record_failure(&mut self, tier: SourceTier, detail: &str) {
        self.record(tier, detail, AttemptOutcome::Failed);
    }

    pub fn record_rate_limited(&mut self, tier: SourceTier, detail: &str) {
        self.record(tier, detail, AttemptOutcome::RateLimited);
    }

    pub fn record_skip(&mut self, tier: SourceTier, detail: &str) {
        self.record(tier, detail, AttemptOutcome::Skipped);
    }

    fn record(&mut self, tier: SourceTier, detail: &str, outcome: AttemptOutcome) {
        self.attempts.push(AttemptTrace {
            tier,
            detail: detail.to_string(),
            outcome,
        });
    }

    /// Summary for logging/debugging.
    pub fn summary(&self) -> String {
        self.attempts
            .iter()
            .map(|a| {
                let outcome = match a.outcome {
                    AttemptOutcome::Success => "SUCCESS",
                    AttemptOutcome::RateLimited => "RATE_LIMITED",
                    AttemptOutcome::Failed => "FAILED",
                    AttemptOutcome::Skipped => "SKIPPED",
                };
                format!("{}: {} ({})", a.tier, outcome, a.detail)
            })
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    /// Check if any attempt succeeded.
    pub fn has_success(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.outcome == AttemptOutcome::Success)
    }

    pub fn into_attempts(self) -> Vec<AttemptTrace> {
        self.attempts
    }
}
