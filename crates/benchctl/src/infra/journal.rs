//! Journal of everything a procedure did to the bench.
//!
//! One JSON object per line, appended, so a run that dies half-way still
//! leaves a readable record up to the failing step.

use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalEventType {
    /// Instrument session opened and connect sequence completed
    InstrumentConnected,
    /// Procedure started
    ProcedureStart,
    /// Step finished successfully
    StepCompleted,
    /// Step failed; the run stops here
    StepFailed,
    /// Output switched off during shutdown
    OutputSafed,
    /// Instrument session closed
    InstrumentClosed,
    /// Procedure finished, successfully or not
    ProcedureEnd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Monotonic microseconds since the journal was opened
    pub timestamp_us: u64,
    /// Wall-clock Unix timestamp in microseconds
    pub unix_us: u64,
    pub event_type: JournalEventType,
    pub details: serde_json::Value,
}

pub struct CommandJournal {
    started: Instant,
    writer: Mutex<BufWriter<File>>,
}

impl CommandJournal {
    /// Open `path` for appending, creating parent directories as needed.
    pub fn new(path: &Path) -> std::io::Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;

        Ok(Self {
            started: Instant::now(),
            writer: Mutex::new(BufWriter::with_capacity(8192, file)),
        })
    }

    pub fn log(&self, entry: &JournalEntry) -> std::io::Result<()> {
        let mut writer = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        serde_json::to_writer(&mut *writer, entry)?;
        writer.write_all(b"\n")?;
        writer.flush()
    }

    pub fn log_event(
        &self,
        event_type: JournalEventType,
        details: serde_json::Value,
    ) -> std::io::Result<()> {
        let unix_us = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;
        self.log(&JournalEntry {
            timestamp_us: self.started.elapsed().as_micros() as u64,
            unix_us,
            event_type,
            details,
        })
    }
}
