//! Field Catalogue (fieldcat) - CLI entry point

mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fieldcat::cli::{Cli, Commands, ConfigCommands};

/// Route logs to stderr so stdout stays a clean event stream.
///
/// `RUST_LOG` wins over `-v` when set.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("fieldcat={}", default_level)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(not(tarpaulin_include))]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            file,
            agent,
            batch_size,
            max_retries,
            retry_delay_ms,
            timeout,
            context,
            language,
            format,
            quiet,
        } => commands::analyze::handle(commands::analyze::AnalyzeArgs {
            file,
            agent,
            batch_size,
            max_retries,
            retry_delay_ms,
            timeout,
            context,
            language,
            format,
            quiet,
        }),
        Commands::Flatten {
            file,
            grouped,
            include_meta,
        } => commands::flatten::handle(&file, grouped, include_meta),
        Commands::Chunk { file, max_size } => commands::chunk::handle(&file, max_size),
        Commands::Schema { file, json } => commands::schema::handle(&file, json),
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(),
            ConfigCommands::Path => commands::config::handle_path(),
            ConfigCommands::Init => commands::config::handle_init(),
        },
        Commands::Completions { shell } => commands::completions::handle::<Cli>(shell),
    }
}
