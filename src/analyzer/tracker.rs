//! Retry coordination and usage tracking for analysis.
//!
//! This module provides:
//! - `RetryPolicy` - configuration for retry behavior
//! - `RetryCoordinator` - manages retry waits with exponential backoff
//! - `UsageTracker` - per-batch outcome records
//! - `UsageSummary` - aggregate attached to the `complete` event
//!
//! # Retry Strategy
//!
//! - 2 retries per batch by default (3 attempts)
//! - Exponential backoff: 1s -> 2s -> 4s, capped at 60s
//! - Respects agent-provided retry-after duration for rate limits

use serde::Serialize;
use std::time::{Duration, Instant};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: usize = 2;

/// Default base delay between attempts.
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, first one included (default: 3)
    pub max_attempts: usize,
    /// Initial delay in milliseconds (default: 1000, 0 disables waiting)
    pub initial_delay_ms: u64,
    /// Backoff multiplier (default: 2.0)
    pub backoff_multiplier: f64,
    /// Maximum delay in milliseconds (default: 60000)
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RETRIES + 1,
            initial_delay_ms: DEFAULT_RETRY_DELAY_MS,
            backoff_multiplier: 2.0,
            max_delay_ms: 60000,
        }
    }
}

impl RetryPolicy {
    /// Create a new retry policy with custom settings.
    pub fn new(
        max_attempts: usize,
        initial_delay_ms: u64,
        backoff_multiplier: f64,
        max_delay_ms: u64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay_ms,
            backoff_multiplier,
            max_delay_ms,
        }
    }

    /// Policy allowing `max_retries` retries after the first attempt.
    pub fn with_retries(max_retries: usize, initial_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_retries.saturating_add(1),
            initial_delay_ms,
            ..Self::default()
        }
    }

    /// Calculate delay for a given retry number (0-indexed).
    ///
    /// Uses exponential backoff: delay = initial * (multiplier ^ retry)
    /// Capped at max_delay_ms.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let delay_ms = self.initial_delay_ms as f64 * self.backoff_multiplier.powi(attempt as i32);
        let capped = delay_ms.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(capped)
    }

    /// Whether another attempt is allowed after `attempts` have been made.
    pub fn should_retry(&self, attempts: usize) -> bool {
        attempts < self.max_attempts
    }
}

/// Coordinates retry waits for batch analysis.
#[derive(Debug, Clone, Default)]
pub struct RetryCoordinator {
    policy: RetryPolicy,
}

impl RetryCoordinator {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Calculate wait duration before retry number `retry` (0-indexed).
    ///
    /// Exponential backoff, stretched to `agent_retry_after` (from a rate
    /// limit response) when that is longer. Always capped at max_delay.
    pub fn wait_duration(&self, retry: usize, agent_retry_after: Option<Duration>) -> Duration {
        let backoff = self.policy.delay_for_attempt(retry);
        match agent_retry_after {
            Some(retry_after) => retry_after
                .max(backoff)
                .min(Duration::from_millis(self.policy.max_delay_ms)),
            None => backoff,
        }
    }

    pub fn should_retry(&self, attempts: usize) -> bool {
        self.policy.should_retry(attempts)
    }

    pub fn max_attempts(&self) -> usize {
        self.policy.max_attempts
    }
}

/// How a batch ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOutcome {
    /// The collaborator described every field.
    Described,
    /// Templated metadata was synthesized after retries ran out.
    FellBack,
}

/// Usage record for a single batch.
#[derive(Debug, Clone)]
pub struct BatchUsage {
    /// Position of the batch in the run (1-based)
    pub batch: usize,
    pub section: String,
    pub fields: usize,
    pub attempts: usize,
    pub duration: Duration,
    pub outcome: BatchOutcome,
}

/// Summary report of an analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub batches_processed: usize,
    pub described_batches: usize,
    pub fallback_batches: usize,
    /// Fields covered by templated metadata
    pub fallback_fields: usize,
    pub total_attempts: usize,
    pub total_retries: usize,
    /// Wall time since tracking started
    pub duration_ms: u64,
}

impl UsageSummary {
    /// Share of batches described by the collaborator (0.0 - 1.0).
    pub fn success_rate(&self) -> f64 {
        if self.batches_processed == 0 {
            return 0.0;
        }
        self.described_batches as f64 / self.batches_processed as f64
    }
}

/// Collects per-batch outcomes during a run.
#[derive(Debug)]
pub struct UsageTracker {
    batches: Vec<BatchUsage>,
    start_time: Instant,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn record(&mut self, usage: BatchUsage) {
        tracing::debug!(
            batch = usage.batch,
            section = %usage.section,
            attempts = usage.attempts,
            outcome = ?usage.outcome,
            elapsed_ms = usage.duration.as_millis() as u64,
            "batch finished"
        );
        self.batches.push(usage);
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn summary(&self) -> UsageSummary {
        let batches_processed = self.batches.len();
        let fell_back = || {
            self.batches
                .iter()
                .filter(|b| b.outcome == BatchOutcome::FellBack)
        };
        let fallback_batches = fell_back().count();
        let total_attempts: usize = self.batches.iter().map(|b| b.attempts).sum();

        UsageSummary {
            batches_processed,
            described_batches: batches_processed - fallback_batches,
            fallback_batches,
            fallback_fields: fell_back().map(|b| b.fields).sum(),
            total_attempts,
            // first attempt of each batch is not a retry
            total_retries: self
                .batches
                .iter()
                .map(|b| b.attempts.saturating_sub(1))
                .sum(),
            duration_ms: self.elapsed().as_millis() as u64,
        }
    }
}

impl Default for UsageTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a duration for display.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}s", secs)
    } else {
        format!("{}ms", d.as_millis())
    }
}
