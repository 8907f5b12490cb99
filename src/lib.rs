//! Field Catalogue (fieldcat) Library
//!
//! Flattens JSON documents into addressable field paths and catalogues each
//! field with an inference agent, streaming progress as it goes.

pub mod analyzer;
pub mod catalog;
pub mod chunking;
pub mod cli;
pub mod config;

pub use analyzer::{AgentType, AnalyzeOptions, AnalyzerService, FieldAnalysis, ProgressEvent};
pub use catalog::{flatten, group_by_root, FlatField, Group};
pub use config::Config;
