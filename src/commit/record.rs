//! Structured commit records emitted by the log reader.
//!
//! Records are self-describing: field names and order are fixed by the struct
//! definitions below, and actions carry an explicit `type` tag. A
//! [`RecordWriter`] streams them one at a time.

use crate::commit::{Action, Commit};
use crate::types::{CommitId, ObjectId};
use chrono::{DateTime, SecondsFormat, Utc};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub id: CommitId,
    pub parent: Option<CommitId>,
    pub author: String,
    pub date: DateTime<Utc>,
    pub message: String,
    pub actions: Vec<ActionRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionRecord {
    Add {
        object: ObjectId,
        size: u64,
        count: u64,
    },
    Delete {
        object: ObjectId,
    },
    AddVector {
        object: ObjectId,
    },
    DeleteVector {
        object: ObjectId,
    },
    Meta {
        key: String,
        value: String,
    },
}

impl From<&Action> for ActionRecord {
    fn from(action: &Action) -> Self {
        match action {
            Action::Add { object } => ActionRecord::Add {
                object: object.id,
                size: object.size,
                count: object.count,
            },
            Action::Delete { object } => ActionRecord::Delete { object: *object },
            Action::AddVector { object } => ActionRecord::AddVector { object: *object },
            Action::DeleteVector { object } => ActionRecord::DeleteVector { object: *object },
            Action::Meta { key, value } => ActionRecord::Meta {
                key: key.clone(),
                value: value.clone(),
            },
        }
    }
}

impl From<&Commit> for CommitRecord {
    fn from(commit: &Commit) -> Self {
        Self {
            id: commit.id,
            parent: if commit.parent.is_nil() {
                None
            } else {
                Some(commit.parent)
            },
            author: commit.author.clone(),
            date: commit.date,
            message: commit.message.clone(),
            actions: commit.actions.iter().map(ActionRecord::from).collect(),
        }
    }
}

impl CommitRecord {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Output format for commit records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// One JSON object per line
    Json,
    /// Human-readable, git-log style
    Text,
}

impl std::str::FromStr for RecordFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(RecordFormat::Json),
            "text" => Ok(RecordFormat::Text),
            other => Err(format!(
                "invalid record format: {} (must be 'json' or 'text')",
                other
            )),
        }
    }
}

/// Writes commit records to a sink as they arrive.
pub struct RecordWriter<W: Write> {
    out: W,
    format: RecordFormat,
    color: bool,
    written: usize,
}

impl<W: Write> RecordWriter<W> {
    pub fn new(out: W, format: RecordFormat) -> Self {
        Self {
            out,
            format,
            color: false,
            written: 0,
        }
    }

    /// Colorize commit ids in text output.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn write(&mut self, record: &CommitRecord) -> io::Result<()> {
        match self.format {
            RecordFormat::Json => {
                serde_json::to_writer(&mut self.out, record)?;
                writeln!(self.out)?;
            }
            RecordFormat::Text => self.write_text(record)?,
        }
        self.written += 1;
        Ok(())
    }

    fn write_text(&mut self, record: &CommitRecord) -> io::Result<()> {
        if self.written > 0 {
            writeln!(self.out)?;
        }
        let id = record.id.to_string();
        if self.color {
            writeln!(self.out, "commit {}", id.yellow())?;
        } else {
            writeln!(self.out, "commit {}", id)?;
        }
        writeln!(self.out, "Author: {}", record.author)?;
        writeln!(
            self.out,
            "Date:   {}",
            record.date.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        writeln!(self.out)?;
        for line in record.message.lines() {
            writeln!(self.out, "    {}", line)?;
        }
        for action in &record.actions {
            let line = match action {
                ActionRecord::Add {
                    object,
                    size,
                    count,
                } => format!("+ {} {} bytes {} records", object, size, count),
                ActionRecord::Delete { object } => format!("- {}", object),
                ActionRecord::AddVector { object } => format!("+vector {}", object),
                ActionRecord::DeleteVector { object } => format!("-vector {}", object),
                ActionRecord::Meta { key, value } => format!("meta {}={}", key, value),
            };
            writeln!(self.out, "    {}", line)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
