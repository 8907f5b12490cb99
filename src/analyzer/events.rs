//! Progress events and the sinks that carry them to an observer.
//!
//! Every run emits an ordered stream of [`ProgressEvent`]s ending in exactly
//! one terminal event (`complete` or `error`). On the wire each event is
//! wrapped as `{"event": <channel>, "data": <event>}` where the channel is
//! `progress`, `complete` or `error`.

use std::io::Write;
use std::str::FromStr;
use std::sync::mpsc::Sender;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::result::FieldAnalysis;
use super::tracker::UsageSummary;
use crate::catalog::FlattenStats;

/// One step of an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Flattening has started.
    Flatten { message: String },

    /// Flattening is done.
    #[serde(rename_all = "camelCase")]
    FlattenComplete {
        message: String,
        stats: FlattenStats,
        /// `"<root key> (<field count>)"` per section
        sections: Vec<String>,
    },

    /// Batches are planned.
    #[serde(rename_all = "camelCase")]
    AnalyzeStart {
        message: String,
        total_fields: usize,
        total_batches: usize,
    },

    /// A batch is about to be submitted.
    #[serde(rename_all = "camelCase")]
    Analyzing {
        message: String,
        current_section: String,
        /// 1-based position across the whole run
        current_batch: usize,
        total_batches: usize,
    },

    /// A batch has results (described or fallback).
    #[serde(rename_all = "camelCase")]
    SectionComplete {
        message: String,
        current_section: String,
        current_batch: usize,
        total_batches: usize,
        /// Results accumulated so far
        fields_analyzed: usize,
    },

    /// The catalogue is complete.
    Complete {
        stats: FlattenStats,
        results: Vec<FieldAnalysis>,
        usage: UsageSummary,
    },

    /// The run failed.
    Error { message: String },
}

impl ProgressEvent {
    /// Wire channel of the event.
    pub fn channel(&self) -> &'static str {
        match self {
            ProgressEvent::Complete { .. } => "complete",
            ProgressEvent::Error { .. } => "error",
            _ => "progress",
        }
    }

    /// Whether the event ends the stream.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. }
        )
    }

    pub fn error(message: impl Into<String>) -> Self {
        ProgressEvent::Error {
            message: message.into(),
        }
    }
}

/// Wire envelope of an event.
#[derive(Debug, Serialize)]
pub struct EventRecord<'a> {
    pub event: &'static str,
    pub data: &'a ProgressEvent,
}

impl<'a> From<&'a ProgressEvent> for EventRecord<'a> {
    fn from(data: &'a ProgressEvent) -> Self {
        Self {
            event: data.channel(),
            data,
        }
    }
}

/// Framing used when writing events to a byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventFormat {
    /// One JSON record per line
    #[default]
    Ndjson,
    /// Server-sent events: `data: <record>` followed by a blank line
    Sse,
}

impl FromStr for EventFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ndjson" | "jsonl" => Ok(EventFormat::Ndjson),
            "sse" => Ok(EventFormat::Sse),
            other => Err(format!(
                "Unknown output format: '{}'. Supported formats: ndjson, sse",
                other
            )),
        }
    }
}

impl std::fmt::Display for EventFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventFormat::Ndjson => write!(f, "ndjson"),
            EventFormat::Sse => write!(f, "sse"),
        }
    }
}

/// Render one event in the given framing.
pub fn encode_event(event: &ProgressEvent, format: EventFormat) -> serde_json::Result<String> {
    let record = serde_json::to_string(&EventRecord::from(event))?;
    Ok(match format {
        EventFormat::Ndjson => format!("{}\n", record),
        EventFormat::Sse => format!("data: {}\n\n", record),
    })
}

/// The observer is gone; no further events can be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event sink closed")]
pub struct SinkClosed;

/// Destination for progress events.
pub trait EventSink {
    /// Deliver an event, failing once the observer has gone away.
    fn emit(&mut self, event: ProgressEvent) -> Result<(), SinkClosed>;

    /// Whether the observer is still listening.
    fn is_open(&self) -> bool {
        true
    }
}

/// Collects events in memory.
impl EventSink for Vec<ProgressEvent> {
    fn emit(&mut self, event: ProgressEvent) -> Result<(), SinkClosed> {
        self.push(event);
        Ok(())
    }
}

/// Forwards events to another thread.
#[derive(Debug)]
pub struct ChannelSink {
    tx: Sender<ProgressEvent>,
    open: bool,
}

impl ChannelSink {
    pub fn new(tx: Sender<ProgressEvent>) -> Self {
        Self { tx, open: true }
    }
}

impl EventSink for ChannelSink {
    fn emit(&mut self, event: ProgressEvent) -> Result<(), SinkClosed> {
        if !self.open {
            return Err(SinkClosed);
        }
        self.tx.send(event).map_err(|_| {
            self.open = false;
            SinkClosed
        })
    }

    fn is_open(&self) -> bool {
        self.open
    }
}

/// Writes framed events to a byte stream, flushing after each one.
#[derive(Debug)]
pub struct WriterSink<W: Write> {
    writer: W,
    format: EventFormat,
    open: bool,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W, format: EventFormat) -> Self {
        Self {
            writer,
            format,
            open: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> EventSink for WriterSink<W> {
    fn emit(&mut self, event: ProgressEvent) -> Result<(), SinkClosed> {
        if !self.open {
            return Err(SinkClosed);
        }

        let written = encode_event(&event, self.format)
            .map_err(std::io::Error::from)
            .and_then(|frame| {
                self.writer.write_all(frame.as_bytes())?;
                self.writer.flush()
            });

        if let Err(e) = written {
            tracing::warn!(error = %e, "event output closed");
            self.open = false;
            return Err(SinkClosed);
        }
        Ok(())
    }

    fn is_open(&self) -> bool {
        self.open
    }
}
