//! Schema command handler

use anyhow::Result;

use fieldcat::chunking::schema_overview;
use fieldcat::config::Config;

use super::{chunk, print_json, read_document};

/// Print the structure of a document, as text or JSON.
#[cfg(not(tarpaulin_include))]
pub fn handle(file: &str, json: bool) -> Result<()> {
    let config = Config::load()?;
    let document = read_document(file)?;
    let schema = chunk::chunker(&config.chunking, None)?.schema(&document);

    if json {
        print_json(&schema)
    } else {
        println!("{}", schema_overview(&schema));
        Ok(())
    }
}
