use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

use momo_core::RejectionEntry;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Audit log IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Audit entry serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Append-only destination for rejected messages.
///
/// An `Ok` from [`append`](AuditSink::append) means the entry is durable as far
/// as the sink can make it; the pipeline treats any error as fatal.
pub trait AuditSink {
    fn append(&mut self, entry: &RejectionEntry) -> Result<(), AuditError>;
}

// ── In-memory sink (tests, library callers) ───────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    pub entries: Vec<RejectionEntry>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&mut self, entry: &RejectionEntry) -> Result<(), AuditError> {
        self.entries.push(entry.clone());
        Ok(())
    }
}

// ── Line-oriented sink over any writer ────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditFormat {
    /// `<rfc3339> - Unprocessed SMS #<n> (<reason>): <body>`
    #[default]
    Text,
    /// One JSON object per line.
    JsonLines,
}

impl std::str::FromStr for AuditFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(AuditFormat::Text),
            "json" | "jsonl" | "json_lines" => Ok(AuditFormat::JsonLines),
            other => Err(format!("Unknown audit format: '{other}'")),
        }
    }
}

/// Writes one line per entry and flushes after each, so entries already
/// handled survive a crash later in the batch.
pub struct LogAuditSink<W: Write> {
    writer: W,
    format: AuditFormat,
}

impl<W: Write> LogAuditSink<W> {
    pub fn new(writer: W, format: AuditFormat) -> Self {
        Self { writer, format }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl LogAuditSink<File> {
    /// Open `path` for appending, creating it if needed.
    pub fn open(path: &Path, format: AuditFormat) -> Result<Self, AuditError> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(file, format))
    }
}

impl<W: Write> AuditSink for LogAuditSink<W> {
    fn append(&mut self, entry: &RejectionEntry) -> Result<(), AuditError> {
        match self.format {
            AuditFormat::Text => {
                // Keep one entry per line even for multi-line SMS bodies.
                let line = entry.to_string().replace(['\r', '\n'], " ");
                writeln!(self.writer, "{line}")?;
            }
            AuditFormat::JsonLines => {
                serde_json::to_writer(&mut self.writer, entry)?;
                self.writer.write_all(b"\n")?;
            }
        }
        self.writer.flush()?;
        Ok(())
    }
}
