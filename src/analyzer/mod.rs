//! Field analysis: batching flattened fields through an inference agent.
//!
//! The pipeline flattens a document, groups fields by root key, cuts
//! groups into fixed-size batches and asks an agent to describe each batch.
//! Unusable replies are retried and finally replaced by templated metadata,
//! so every analyzable field ends up in the catalogue. Progress is streamed
//! as [`ProgressEvent`]s.
//!
//! # Module Structure
//!
//! - [`backend`] - agent backends (Claude, Codex, Gemini, command, OpenAI)
//! - [`batch`] - batch planning and field descriptors
//! - [`events`] - progress events, wire framing and sinks
//! - [`orchestrator`] - the per-batch retry/fallback state machine
//! - [`parse`] - extraction of JSON arrays from agent replies
//! - [`service`] - threading and I/O around the orchestrator

pub mod backend;
pub mod batch;
pub mod error;
pub mod events;
pub mod orchestrator;
pub mod parse;
pub mod progress;
pub mod prompt;
pub mod result;
pub mod service;
pub mod tracker;

pub use backend::{AgentBackend, AgentType, BackendError, BackendOptions};
pub use batch::{plan_batches, Batch, FieldDescriptor, DEFAULT_BATCH_SIZE};
pub use error::{AnalysisError, AttemptFailure};
pub use events::{
    encode_event, ChannelSink, EventFormat, EventRecord, EventSink, ProgressEvent, SinkClosed,
    WriterSink,
};
pub use orchestrator::{AnalysisOrchestrator, BatchState, OrchestratorConfig};
pub use parse::{parse_field_metadata, RawFieldMetadata};
pub use progress::DefaultProgressReporter;
pub use prompt::{build_batch_prompt, Prompt};
pub use result::FieldAnalysis;
pub use service::{parse_document, AnalyzeOptions, AnalyzerService};
pub use tracker::{RetryCoordinator, RetryPolicy, UsageSummary, UsageTracker};
