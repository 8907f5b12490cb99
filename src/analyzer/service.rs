//! AnalyzerService facade for running an analysis against a byte stream.
//!
//! # Workflow
//!
//! 1. Parse the input document
//! 2. Check that the agent is usable
//! 3. Run the orchestrator on a worker thread
//! 4. Forward every event to the output writer and the stderr reporter
//!
//! The worker owns the sending half of a channel; the calling thread drains
//! it. When the output closes the receiver is dropped and the worker stops
//! at its next emission.

use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use serde_json::Value;

use super::backend::{AgentBackend, AgentType, BackendOptions};
use super::batch::DEFAULT_BATCH_SIZE;
use super::error::AnalysisError;
use super::events::{ChannelSink, EventFormat, EventSink, ProgressEvent, WriterSink};
use super::orchestrator::{AnalysisOrchestrator, OrchestratorConfig, DEFAULT_TIMEOUT_SECS};
use super::progress::DefaultProgressReporter;
use super::prompt::{DEFAULT_CONTEXT, DEFAULT_LANGUAGE};
use super::tracker::{RetryPolicy, UsageSummary, DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY_MS};

/// Configuration options for analysis.
#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    /// Agent to use for analysis
    pub agent: AgentType,
    /// Settings passed to the agent backend
    pub backend: BackendOptions,
    /// Fields per collaborator call
    pub batch_size: usize,
    /// Retries after the first attempt of each batch
    pub max_retries: usize,
    /// Base delay between attempts in milliseconds
    pub retry_delay_ms: u64,
    /// Timeout per call in seconds
    pub timeout_secs: u64,
    pub context: String,
    pub language: String,
    /// Framing of the event stream
    pub format: EventFormat,
    /// Quiet mode (suppress progress output)
    pub quiet: bool,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            agent: AgentType::Claude,
            backend: BackendOptions::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            context: DEFAULT_CONTEXT.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            format: EventFormat::default(),
            quiet: false,
        }
    }
}

impl AnalyzeOptions {
    /// Create options for a specific agent.
    pub fn with_agent(agent: AgentType) -> Self {
        Self {
            agent,
            ..Default::default()
        }
    }

    pub fn backend_options(mut self, backend: BackendOptions) -> Self {
        self.backend = backend;
        self
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn max_retries(mut self, retries: usize) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn retry_delay(mut self, millis: u64) -> Self {
        self.retry_delay_ms = millis;
        self
    }

    /// Set timeout per call.
    pub fn timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = context.into();
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn format(mut self, format: EventFormat) -> Self {
        self.format = format;
        self
    }

    /// Enable quiet mode.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }

    /// Orchestrator settings derived from these options.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            batch_size: self.batch_size,
            retry: RetryPolicy::with_retries(self.max_retries, self.retry_delay_ms),
            timeout: Duration::from_secs(self.timeout_secs),
            context: self.context.clone(),
            language: self.language.clone(),
        }
    }
}

/// Parse request text into a document.
///
/// Blank input means no document was provided.
pub fn parse_document(input: &str) -> Result<Option<Value>, AnalysisError> {
    if input.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(input)
        .map(Some)
        .map_err(|e| AnalysisError::InvalidJson {
            message: e.to_string(),
        })
}

/// Main service for analyzing documents.
///
/// Facade pattern - wires the orchestrator to an output stream.
pub struct AnalyzerService {
    options: AnalyzeOptions,
    backend: Box<dyn AgentBackend>,
    cancel: Arc<AtomicBool>,
}

impl AnalyzerService {
    /// Create a new analyzer service with options.
    pub fn new(options: AnalyzeOptions) -> Self {
        let backend = options.agent.create_backend_with(&options.backend);
        Self::with_backend(options, backend)
    }

    /// Create with a custom backend (for testing).
    pub fn with_backend(options: AnalyzeOptions, backend: Box<dyn AgentBackend>) -> Self {
        Self {
            options,
            backend,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if the configured agent is available.
    pub fn is_agent_available(&self) -> bool {
        self.backend.is_available()
    }

    /// Flag that stops the run at the next batch boundary when set.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    pub fn options(&self) -> &AnalyzeOptions {
        &self.options
    }

    fn reporter(&self) -> DefaultProgressReporter {
        if self.options.quiet {
            DefaultProgressReporter::quiet()
        } else {
            DefaultProgressReporter::new()
        }
    }

    /// Parse `input` and analyze it.
    ///
    /// Unparseable input is reported as a single `error` event.
    pub fn analyze_input<W: Write>(
        &self,
        input: &str,
        out: W,
    ) -> Result<UsageSummary, AnalysisError> {
        match parse_document(input) {
            Ok(document) => self.analyze(document, out),
            Err(err) => {
                self.fail_early(&err, out);
                Err(err)
            }
        }
    }

    /// Analyze a document, writing framed events to `out`.
    ///
    /// The stream always ends with exactly one `complete` or `error` record
    /// unless `out` itself fails.
    pub fn analyze<W: Write>(
        &self,
        document: Option<Value>,
        out: W,
    ) -> Result<UsageSummary, AnalysisError> {
        if document.is_some() && !self.backend.is_available() {
            let err = AnalysisError::AgentNotAvailable {
                agent: self.options.agent,
            };
            self.fail_early(&err, out);
            return Err(err);
        }

        tracing::info!(
            agent = self.backend.name(),
            batch_size = self.options.batch_size,
            max_retries = self.options.max_retries,
            "starting analysis"
        );

        let orchestrator =
            AnalysisOrchestrator::new(self.backend.as_ref(), self.options.orchestrator_config())
                .with_cancel_flag(self.cancel_flag());
        let reporter = self.reporter();
        let mut writer = WriterSink::new(out, self.options.format);
        let (tx, rx) = mpsc::channel::<ProgressEvent>();

        let (joined, terminal_seen) = thread::scope(|scope| {
            let worker = scope.spawn(move || {
                let mut sink = ChannelSink::new(tx);
                orchestrator.run(document.as_ref(), &mut sink)
            });

            let mut terminal_seen = false;
            for event in rx {
                reporter.observe(&event);
                terminal_seen |= event.is_terminal();
                if writer.emit(event).is_err() {
                    // Dropping the receiver stops the worker at its next event
                    break;
                }
            }

            (worker.join(), terminal_seen)
        });

        let result = joined.unwrap_or_else(|_| {
            tracing::error!("analysis worker panicked");
            Err(AnalysisError::WorkerPanicked)
        });

        if !terminal_seen && writer.is_open() {
            let message = match &result {
                Err(err) => err.to_string(),
                Ok(_) => AnalysisError::WorkerPanicked.to_string(),
            };
            let event = ProgressEvent::error(message);
            reporter.observe(&event);
            let _ = writer.emit(event);
        }

        result
    }

    /// Report a failure that happened before the worker started.
    fn fail_early<W: Write>(&self, err: &AnalysisError, out: W) {
        tracing::error!(error = %err, "analysis not started");
        let event = ProgressEvent::error(err.to_string());
        self.reporter().observe(&event);
        let _ = WriterSink::new(out, self.options.format).emit(event);
    }
}
