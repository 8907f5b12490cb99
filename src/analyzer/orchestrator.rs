//! The analysis control loop.
//!
//! A run flattens the document, groups fields by root key, cuts groups into
//! batches and submits them one at a time. Each batch walks an explicit
//! [`BatchState`] machine: submit, retry on an unusable attempt, then either
//! succeed or fall back to templated metadata. Events are emitted in a
//! fixed order and the run always ends with `complete` or `error`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::Value;

use super::backend::AgentBackend;
use super::batch::{plan_batches, Batch, DEFAULT_BATCH_SIZE};
use super::error::{AnalysisError, AttemptFailure};
use super::events::{EventSink, ProgressEvent};
use super::prompt::{build_batch_prompt, Prompt, DEFAULT_CONTEXT, DEFAULT_LANGUAGE};
use super::result::FieldAnalysis;
use super::tracker::{
    BatchOutcome, BatchUsage, RetryCoordinator, RetryPolicy, UsageSummary, UsageTracker,
};
use crate::catalog::{flatten_with_stats, group_by_root, FlattenStats};

/// Default per-call deadline.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Slice used when sleeping between attempts so cancellation stays prompt.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Settings for one orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub batch_size: usize,
    pub retry: RetryPolicy,
    /// Deadline for each collaborator call
    pub timeout: Duration,
    /// Document context; the section name is appended per batch
    pub context: String,
    pub language: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            context: DEFAULT_CONTEXT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

/// Lifecycle of a single batch.
#[derive(Debug)]
pub enum BatchState {
    /// Attempt number `attempt` (1-based) is about to be made.
    Submit { attempt: usize },
    /// Attempt `attempt` failed; wait before the next one.
    Retrying {
        attempt: usize,
        reason: AttemptFailure,
        wait: Duration,
    },
    /// Every field was described.
    Succeeded {
        attempts: usize,
        results: Vec<FieldAnalysis>,
    },
    /// No attempts left; fallback metadata is used.
    Exhausted {
        attempts: usize,
        reason: AttemptFailure,
    },
}

/// Sequential batch analyzer.
///
/// One orchestrator serves one run at a time; concurrent runs use separate
/// instances.
pub struct AnalysisOrchestrator<'a> {
    backend: &'a dyn AgentBackend,
    config: OrchestratorConfig,
    retry: RetryCoordinator,
    cancel: Option<Arc<AtomicBool>>,
}

impl<'a> AnalysisOrchestrator<'a> {
    pub fn new(backend: &'a dyn AgentBackend, config: OrchestratorConfig) -> Self {
        let retry = RetryCoordinator::new(config.retry.clone());
        Self {
            backend,
            config,
            retry,
            cancel: None,
        }
    }

    /// Stop at the next batch boundary or retry wait once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Analyze a document, streaming events into `sink`.
    ///
    /// A missing or `null` document is an input fault. Failures of
    /// individual batches never surface here; they degrade to fallback
    /// metadata. The returned error has already been reported as an `error`
    /// event unless the sink itself closed.
    pub fn run(
        &self,
        document: Option<&Value>,
        sink: &mut dyn EventSink,
    ) -> Result<UsageSummary, AnalysisError> {
        match self.analyze(document, sink) {
            Ok(usage) => Ok(usage),
            Err(AnalysisError::ChannelClosed) => {
                tracing::warn!("observer disconnected, analysis stopped");
                Err(AnalysisError::ChannelClosed)
            }
            Err(err) => {
                tracing::error!(error = %err, "analysis failed");
                // Nothing more can be done if the observer is gone as well
                let _ = sink.emit(ProgressEvent::error(err.to_string()));
                Err(err)
            }
        }
    }

    fn analyze(
        &self,
        document: Option<&Value>,
        sink: &mut dyn EventSink,
    ) -> Result<UsageSummary, AnalysisError> {
        let document = match document {
            Some(Value::Null) | None => return Err(AnalysisError::NoDocument),
            Some(doc) => doc,
        };

        sink.emit(ProgressEvent::Flatten {
            message: "Preprocessing JSON structure...".to_string(),
        })?;

        let flattened = flatten_with_stats(document);
        let groups = group_by_root(&flattened.items);
        let total_fields: usize = groups.iter().map(|g| g.analyzable_count()).sum();

        tracing::info!(
            fields = total_fields,
            sections = groups.len(),
            original_size = flattened.stats.original_size,
            "document flattened"
        );

        sink.emit(ProgressEvent::FlattenComplete {
            message: format!(
                "Found {} fields in {} sections",
                total_fields,
                groups.len()
            ),
            stats: flattened.stats.clone(),
            sections: groups
                .iter()
                .map(|g| format!("{} ({})", g.root_key, g.analyzable_count()))
                .collect(),
        })?;

        let batches = plan_batches(&groups, self.config.batch_size);
        let total_batches = batches.len();

        sink.emit(ProgressEvent::AnalyzeStart {
            message: format!(
                "Analyzing {} fields in {} batches...",
                total_fields, total_batches
            ),
            total_fields,
            total_batches,
        })?;

        let mut tracker = UsageTracker::new();
        let mut results: Vec<FieldAnalysis> = Vec::with_capacity(total_fields);

        for (position, batch) in batches.iter().enumerate() {
            let current_batch = position + 1;

            if self.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            if !sink.is_open() {
                return Err(AnalysisError::ChannelClosed);
            }

            let label = batch.label();
            sink.emit(ProgressEvent::Analyzing {
                message: format!("{} ({} fields)...", label, batch.len()),
                current_section: batch.section.clone(),
                current_batch,
                total_batches,
            })?;

            let analyzed = self.process_batch(batch, current_batch, &mut tracker)?;
            results.extend(analyzed);

            sink.emit(ProgressEvent::SectionComplete {
                message: format!("{} complete", label),
                current_section: batch.section.clone(),
                current_batch,
                total_batches,
                fields_analyzed: results.len(),
            })?;
        }

        let usage = tracker.summary();
        tracing::info!(
            fields = results.len(),
            batches = usage.batches_processed,
            fallback_batches = usage.fallback_batches,
            retries = usage.total_retries,
            "analysis complete"
        );

        sink.emit(ProgressEvent::Complete {
            stats: FlattenStats {
                flattened_count: total_fields,
                ..flattened.stats
            },
            results,
            usage: usage.clone(),
        })?;

        Ok(usage)
    }

    /// Drive one batch through [`BatchState`] until it has results.
    fn process_batch(
        &self,
        batch: &Batch,
        position: usize,
        tracker: &mut UsageTracker,
    ) -> Result<Vec<FieldAnalysis>, AnalysisError> {
        let prompt = build_batch_prompt(batch, &self.config.context, &self.config.language)
            .map_err(|e| AnalysisError::RequestBuild {
                section: batch.section.clone(),
                message: e.to_string(),
            })?;

        let started = Instant::now();
        let mut state = BatchState::Submit { attempt: 1 };

        loop {
            state = match state {
                BatchState::Submit { attempt } => match self.attempt(&prompt, batch) {
                    Ok(results) => BatchState::Succeeded {
                        attempts: attempt,
                        results,
                    },
                    Err(reason) if self.retry.should_retry(attempt) => {
                        let wait = self.retry.wait_duration(attempt - 1, reason.retry_after());
                        BatchState::Retrying {
                            attempt,
                            reason,
                            wait,
                        }
                    }
                    Err(reason) => BatchState::Exhausted {
                        attempts: attempt,
                        reason,
                    },
                },
                BatchState::Retrying {
                    attempt,
                    reason,
                    wait,
                } => {
                    tracing::warn!(
                        section = %batch.section,
                        batch = position,
                        attempt,
                        max_attempts = self.retry.max_attempts(),
                        wait_ms = wait.as_millis() as u64,
                        reason = %reason,
                        "batch attempt failed, retrying"
                    );
                    self.pause(wait)?;
                    BatchState::Submit {
                        attempt: attempt + 1,
                    }
                }
                BatchState::Succeeded { attempts, results } => {
                    tracker.record(BatchUsage {
                        batch: position,
                        section: batch.section.clone(),
                        fields: batch.len(),
                        attempts,
                        duration: started.elapsed(),
                        outcome: BatchOutcome::Described,
                    });
                    return Ok(results);
                }
                BatchState::Exhausted { attempts, reason } => {
                    tracing::warn!(
                        section = %batch.section,
                        batch = position,
                        attempts,
                        reason = %reason,
                        "retries exhausted, using fallback metadata"
                    );
                    tracker.record(BatchUsage {
                        batch: position,
                        section: batch.section.clone(),
                        fields: batch.len(),
                        attempts,
                        duration: started.elapsed(),
                        outcome: BatchOutcome::FellBack,
                    });
                    return Ok(batch.descriptors.iter().map(FieldAnalysis::fallback).collect());
                }
            };
        }
    }

    /// One collaborator call and the checks that make its reply usable.
    fn attempt(&self, prompt: &Prompt, batch: &Batch) -> Result<Vec<FieldAnalysis>, AttemptFailure> {
        let response = self
            .backend
            .invoke(prompt, self.config.timeout)
            .map_err(|e| AttemptFailure::from_backend_error(&e))?;

        let raw = self
            .backend
            .parse_response(&response)
            .map_err(|e| AttemptFailure::from_backend_error(&e))?;

        if raw.is_empty() {
            return Err(AttemptFailure::Empty);
        }
        if raw.len() != batch.len() {
            return Err(AttemptFailure::Misaligned {
                expected: batch.len(),
                got: raw.len(),
            });
        }

        Ok(raw
            .into_iter()
            .zip(&batch.descriptors)
            .map(|(raw, desc)| FieldAnalysis::reconcile(raw, desc))
            .collect())
    }

    /// Sleep between attempts, waking early on cancellation.
    fn pause(&self, wait: Duration) -> Result<(), AnalysisError> {
        let deadline = Instant::now() + wait;
        loop {
            if self.is_cancelled() {
                return Err(AnalysisError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(());
            }
            thread::sleep(CANCEL_POLL_INTERVAL.min(deadline - now));
        }
    }
}
