//! Append-only sample writer for crash-safe cursor logging.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use beatsync_common::error::{BeatsyncError, BeatsyncResult};
use beatsync_project_model::cursor::{CursorSample, SampleStreamHeader};

/// Samples buffered between forced flushes.
const FLUSH_EVERY: u64 = 1000;

/// Writes cursor samples to a JSONL file in append-only mode.
pub struct SampleWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    samples_written: u64,
}

impl SampleWriter {
    /// Create a new sample writer, writing the header as the first line.
    pub fn new(path: impl Into<PathBuf>, header: &SampleStreamHeader) -> BeatsyncResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        let mut writer = BufWriter::new(file);

        // Header is a comment line so sample parsers can skip it.
        let header_json = serde_json::to_string(header)?;
        writeln!(writer, "# {header_json}")
            .map_err(|e| BeatsyncError::capture(format!("Failed to write header: {e}")))?;

        Ok(Self {
            writer,
            path,
            samples_written: 0,
        })
    }

    /// Write a single sample as a JSONL line.
    pub fn write_sample(&mut self, sample: &CursorSample) -> BeatsyncResult<()> {
        let json = serde_json::to_string(sample)?;
        writeln!(self.writer, "{json}")
            .map_err(|e| BeatsyncError::capture(format!("Failed to write sample: {e}")))?;
        self.samples_written += 1;

        if self.samples_written % FLUSH_EVERY == 0 {
            self.flush()?;
        }

        Ok(())
    }

    /// Flush buffered writes to disk.
    pub fn flush(&mut self) -> BeatsyncResult<()> {
        self.writer
            .flush()
            .map_err(|e| BeatsyncError::capture(format!("Failed to flush samples: {e}")))
    }

    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SampleWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}
