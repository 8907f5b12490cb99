//! Analyze command handler
//!
//! Uses the AnalyzerService facade to orchestrate analysis:
//! 1. Merge config with CLI overrides
//! 2. Read the document (file or stdin)
//! 3. Register Ctrl+C to cancel between batches
//! 4. Stream events to stdout

use std::io;
use std::sync::atomic::Ordering;

use anyhow::{anyhow, Result};

use fieldcat::analyzer::backend::OpenAiOptions;
use fieldcat::analyzer::{AgentType, AnalyzeOptions, AnalyzerService, BackendOptions, EventFormat};
use fieldcat::config::{AnalysisConfig, Config};

use super::read_input;

/// Arguments of `fieldcat analyze`.
#[derive(Debug, Default)]
pub struct AnalyzeArgs {
    pub file: String,
    pub agent: Option<String>,
    pub batch_size: Option<usize>,
    pub max_retries: Option<usize>,
    pub retry_delay_ms: Option<u64>,
    pub timeout: Option<u64>,
    pub context: Option<String>,
    pub language: Option<String>,
    pub format: Option<String>,
    pub quiet: bool,
}

/// Catalogue a document using an AI agent.
///
/// Events go to stdout. Returns an error when the run ends with an
/// `error` event so the process exits non-zero.
#[cfg(not(tarpaulin_include))]
pub fn handle(args: AnalyzeArgs) -> Result<()> {
    let config = Config::load()?;
    let options = build_options(&config, &args)?;

    let input = read_input(&args.file)?;
    let service = AnalyzerService::new(options);

    let cancel = service.cancel_flag();
    ctrlc::set_handler(move || {
        cancel.store(true, Ordering::SeqCst);
    })
    .ok(); // Ignore if handler already set

    let stdout = io::stdout();
    service
        .analyze_input(&input, stdout.lock())
        .map(|_| ())
        .map_err(Into::into)
}

/// Resolve analysis options: CLI flags override config, config overrides defaults.
///
/// The merged values go through the same bounds checks as the config file.
pub fn build_options(config: &Config, args: &AnalyzeArgs) -> Result<AnalyzeOptions> {
    let analysis = merge_analysis(&config.analysis, args);
    analysis
        .validate()
        .map_err(|e| anyhow!("Invalid analysis options: {}", e))?;

    let agent: AgentType = analysis.agent.parse()?;

    let format_name = args.format.as_deref().unwrap_or(&config.output.format);
    let format: EventFormat = format_name.parse().map_err(|e: String| anyhow!(e))?;

    let backend = BackendOptions {
        extra_args: config.agent_extra_args(agent.command_name()).to_vec(),
        program: config.command.program.clone(),
        openai: OpenAiOptions {
            base_url: config.openai.base_url.clone(),
            model: config.openai.model.clone(),
            api_key_env: config.openai.api_key_env.clone(),
        },
    };

    let mut options = AnalyzeOptions::with_agent(agent)
        .backend_options(backend)
        .batch_size(analysis.batch_size)
        .max_retries(analysis.max_retries)
        .retry_delay(analysis.retry_delay_ms)
        .timeout(analysis.timeout)
        .context(analysis.context)
        .language(analysis.language)
        .format(format);
    if args.quiet {
        options = options.quiet();
    }
    Ok(options)
}

fn merge_analysis(base: &AnalysisConfig, args: &AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        agent: args.agent.clone().unwrap_or_else(|| base.agent.clone()),
        batch_size: args.batch_size.unwrap_or(base.batch_size),
        max_retries: args.max_retries.unwrap_or(base.max_retries),
        retry_delay_ms: args.retry_delay_ms.unwrap_or(base.retry_delay_ms),
        timeout: args.timeout.unwrap_or(base.timeout),
        language: args.language.clone().unwrap_or_else(|| base.language.clone()),
        context: args.context.clone().unwrap_or_else(|| base.context.clone()),
    }
}
