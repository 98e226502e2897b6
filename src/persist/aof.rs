//! Append-Only File Module
//!
//! Durable, ordered command log used for crash recovery. Every mutating
//! command is appended as one JSON object per line and fsync'd before the
//! operation returns to the client:
//!
//! ```text
//! {"op":"SET","key":"user","value":"alice","ttl":0}
//! {"op":"DEL","key":"user"}
//! ```
//!
//! Write failures during steady state are logged and swallowed; the in-memory
//! mutation stands. Replay tolerates malformed and truncated lines, so a
//! crash mid-write costs at most the final partial record.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

// == AOF Command ==
/// A single mutating command recorded in the log.
///
/// `ttl` is in seconds; 0 means no expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum AofCommand {
    #[serde(rename = "SET")]
    Set { key: String, value: String, ttl: u64 },
    #[serde(rename = "DEL")]
    Del { key: String },
}

// == AOF Writer ==
/// Serial writer for the command log.
///
/// Record order matches call order; the facade only calls in while holding
/// its own lock, so log order matches index-mutation order.
#[derive(Debug)]
pub struct AofWriter {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl AofWriter {
    /// Opens the log at `path` in append mode, creating it if absent.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    /// Appends a SET record. Failures are logged, never propagated.
    pub fn log_set(&mut self, key: &str, value: &str, ttl_seconds: u64) {
        self.log(&AofCommand::Set {
            key: key.to_string(),
            value: value.to_string(),
            ttl: ttl_seconds,
        });
    }

    /// Appends a DEL record. Failures are logged, never propagated.
    pub fn log_del(&mut self, key: &str) {
        self.log(&AofCommand::Del {
            key: key.to_string(),
        });
    }

    fn log(&mut self, command: &AofCommand) {
        if let Err(err) = self.write_command(command) {
            warn!("AOF write error: {}", err);
        }
    }

    /// Writes one record, flushes userspace buffers and fsyncs the file.
    fn write_command(&mut self, command: &AofCommand) -> io::Result<()> {
        let line = serde_json::to_string(command)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Flushes buffered data and fsyncs without writing a record.
    pub fn flush_and_sync(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Truncates the log to zero length and reopens it for appending.
    ///
    /// Called after a successful snapshot; the snapshot subsumes everything
    /// the truncated log contained.
    pub fn truncate(&mut self) -> io::Result<()> {
        self.writer.flush()?;
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.sync_all()?;
        drop(file);

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.writer = BufWriter::new(file);
        Ok(())
    }

    /// Flushes, fsyncs and releases the file handle.
    pub fn close(mut self) -> io::Result<()> {
        self.flush_and_sync()
    }
}

// == Replay ==
/// Counters describing an AOF replay pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplayStats {
    /// Records decoded and applied
    pub applied: usize,
    /// Lines skipped as malformed or unknown
    pub skipped: usize,
}

/// Replays every decodable record from `reader`, in order, through `apply`.
///
/// Malformed lines (including a partial final line left by a crash) and
/// records with unknown op tags are skipped with a warning; recovery is
/// best-effort and never aborts on bad input.
pub fn replay<R, F>(reader: R, mut apply: F) -> ReplayStats
where
    R: BufRead,
    F: FnMut(AofCommand),
{
    let mut stats = ReplayStats::default();

    for (line_number, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                warn!("AOF read error at line {}: {}", line_number + 1, err);
                break;
            }
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        match serde_json::from_str::<AofCommand>(trimmed) {
            Ok(command) => {
                apply(command);
                stats.applied += 1;
            }
            Err(err) => {
                warn!("Skipping AOF line {}: {}", line_number + 1, err);
                stats.skipped += 1;
            }
        }
    }

    stats
}

/// Opens the log for replay. Returns `None` when no log exists yet.
pub fn open_for_replay(path: &Path) -> io::Result<Option<io::BufReader<File>>> {
    match File::open(path) {
        Ok(file) => Ok(Some(io::BufReader::new(file))),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err),
    }
}
