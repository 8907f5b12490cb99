//! Command handlers for the fieldcat CLI.
//!
//! Each submodule handles a specific CLI command or command group.
//! The main dispatch logic remains in main.rs.

pub mod analyze;
pub mod chunk;
pub mod completions;
pub mod config;
pub mod flatten;
pub mod schema;

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Read a document from a file, or from stdin when `file` is `-`.
pub fn read_input(file: &str) -> Result<String> {
    if file == "-" {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read stdin")?;
        return Ok(buffer);
    }

    let path = Path::new(file);
    if !path.exists() {
        anyhow::bail!("File not found: {}", file);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", file))
}

/// Read and parse a document, rejecting blank input.
pub fn read_document(file: &str) -> Result<Value> {
    let input = read_input(file)?;
    if input.trim().is_empty() {
        anyhow::bail!("No JSON data provided");
    }
    serde_json::from_str(&input).with_context(|| format!("Invalid JSON input: {}", file))
}

/// Print a value as pretty JSON on stdout.
pub fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
