//! CLI definitions for fieldcat
//!
//! This module contains the clap CLI structure definitions, separated from main.rs
//! so they can be accessed by xtask for man page generation.

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, Subcommand};
use clap_complete::Shell as CompletionShell;

/// Build clap styles.
///
/// - Green: headers, usage, command names
/// - White: descriptions, placeholders
pub fn build_cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::White.on_default())
        .valid(AnsiColor::White.on_default())
        .invalid(AnsiColor::Red.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

#[derive(Parser)]
#[command(name = "fieldcat")]
#[command(about = "[ Field Catalogue ] - flatten JSON API responses and describe every field with AI")]
#[command(
    long_about = "Field Catalogue (fieldcat) - build a data dictionary from a JSON document.

fieldcat flattens a nested JSON document into dotted field paths, groups
them by top-level key and asks an AI agent to name and describe each field
in batches. Progress and results are streamed to stdout as NDJSON or
Server-Sent Events. Batches the agent cannot describe fall back to
templated metadata, so every field ends up in the catalogue.

QUICK START:
    fieldcat analyze response.json         Catalogue a document
    fieldcat flatten response.json         Show flattened field paths
    fieldcat schema response.json          Show the document structure
    curl -s $URL | fieldcat analyze -      Read the document from stdin

Configuration lives in ~/.config/fieldcat/config.toml."
)]
#[command(version)]
#[command(styles = build_cli_styles())]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Catalogue every field of a JSON document with an AI agent
    #[command(long_about = "Catalogue every field of a JSON document with an AI agent.

Events are written to stdout, one per line (ndjson) or as SSE frames.
A human-readable progress view is written to stderr. The stream always
ends with a single 'complete' or 'error' event.

EXAMPLES:
    fieldcat analyze response.json                 Analyze with configured agent
    fieldcat analyze response.json --agent codex   Use a specific agent
    fieldcat analyze - --format sse < data.json    Stream SSE frames from stdin
    fieldcat analyze data.json --language German --batch-size 20")]
    Analyze {
        /// Path to the JSON document, or '-' for stdin
        #[arg(help = "Path to the JSON document ('-' reads stdin)")]
        file: String,
        /// Override the configured analysis agent
        #[arg(long, short, help = "Agent to use: claude, codex, gemini, command, openai")]
        agent: Option<String>,
        /// Fields per agent call
        #[arg(long, help = "Fields per agent call (overrides config)")]
        batch_size: Option<usize>,
        /// Retries per batch before falling back
        #[arg(long, help = "Retries per batch before fallback metadata is used")]
        max_retries: Option<usize>,
        /// Base delay between attempts in milliseconds
        #[arg(long, help = "Base delay between attempts in ms, doubled per retry (0 disables)")]
        retry_delay_ms: Option<u64>,
        /// Timeout per agent call in seconds
        #[arg(long, short, help = "Timeout per agent call in seconds")]
        timeout: Option<u64>,
        /// Context sentence sent with each batch
        #[arg(long, help = "Context describing the document (e.g. 'Weather API response')")]
        context: Option<String>,
        /// Output language of names and descriptions
        #[arg(long, help = "Language for generated names and descriptions")]
        language: Option<String>,
        /// Event framing on stdout
        #[arg(long, short, help = "Output format: ndjson or sse")]
        format: Option<String>,
        /// Suppress the progress view on stderr
        #[arg(long, short, help = "Suppress progress output on stderr")]
        quiet: bool,
    },

    /// Print the flattened field paths of a JSON document
    #[command(long_about = "Print the flattened field paths of a JSON document as JSON.

Only the first element of each array is descended into; arrays also get a
synthetic '<path>._length' entry.

EXAMPLES:
    fieldcat flatten response.json
    fieldcat flatten response.json --grouped")]
    Flatten {
        /// Path to the JSON document, or '-' for stdin
        #[arg(help = "Path to the JSON document ('-' reads stdin)")]
        file: String,
        /// Group fields by top-level key
        #[arg(long, short, help = "Group fields by their top-level key")]
        grouped: bool,
        /// Keep synthetic ._length entries
        #[arg(long, help = "Keep synthetic ._length entries in the output")]
        include_meta: bool,
    },

    /// Split a JSON document into byte-bounded chunks
    #[command(long_about = "Split a JSON document into byte-bounded structural chunks.

Pagination and hypermedia keys (configured in [chunking].skip_fields)
are removed first. Objects that fit are kept whole; large arrays are
split into per-item chunks.

EXAMPLES:
    fieldcat chunk response.json
    fieldcat chunk response.json --max-size 2000")]
    Chunk {
        /// Path to the JSON document, or '-' for stdin
        #[arg(help = "Path to the JSON document ('-' reads stdin)")]
        file: String,
        /// Byte ceiling per chunk
        #[arg(long, short, help = "Maximum chunk size in bytes (overrides config)")]
        max_size: Option<usize>,
    },

    /// Describe the structure of a JSON document
    #[command(long_about = "Describe the structure of a JSON document.

Prints the root type, top-level keys, array and object paths and a
field tree with sample values.

EXAMPLES:
    fieldcat schema response.json
    fieldcat schema response.json --json")]
    Schema {
        /// Path to the JSON document, or '-' for stdin
        #[arg(help = "Path to the JSON document ('-' reads stdin)")]
        file: String,
        /// Print the schema as JSON instead of text
        #[arg(long, help = "Print the schema as JSON")]
        json: bool,
    },

    /// Configuration management
    #[command(
        subcommand,
        long_about = "View the fieldcat configuration.

Configuration is stored in ~/.config/fieldcat/config.toml and includes
the analysis agent, batching and retry settings, chunking limits and
the output format.

EXAMPLES:
    fieldcat config show     Display current configuration
    fieldcat config path     Print the config file location
    fieldcat config init     Write a config file with defaults"
    )]
    Config(ConfigCommands),

    /// Generate shell completions
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration as TOML
    Show,
    /// Print the config file path
    Path,
    /// Write a default config file if none exists
    Init,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_flags_parse() {
        let cli = Cli::try_parse_from([
            "fieldcat",
            "analyze",
            "-",
            "--agent",
            "codex",
            "--batch-size",
            "10",
            "--format",
            "sse",
            "-q",
        ])
        .unwrap();
        match cli.command {
            Commands::Analyze {
                file,
                agent,
                batch_size,
                format,
                quiet,
                ..
            } => {
                assert_eq!(file, "-");
                assert_eq!(agent.as_deref(), Some("codex"));
                assert_eq!(batch_size, Some(10));
                assert_eq!(format.as_deref(), Some("sse"));
                assert!(quiet);
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn verbose_is_global_and_counted() {
        let cli = Cli::try_parse_from(["fieldcat", "flatten", "a.json", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }
}
