//! Output file handling.
//!
//! The output is only ever appended to. Each flush cycle opens the file in
//! append mode, writes a contiguous run of segments, flushes, and closes it
//! again so no handle with unflushed data outlives a cycle.

use std::io;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

/// Opens the output file for one append cycle.
#[derive(Debug, Clone)]
pub struct AppendWriter {
    path: PathBuf,
}

impl AppendWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Open (creating if needed) the file for appending.
    pub async fn open(&self) -> io::Result<AppendCycle> {
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        Ok(AppendCycle { file, written: 0 })
    }
}

/// An open append handle for a single flush cycle.
pub struct AppendCycle {
    file: File,
    written: u64,
}

impl AppendCycle {
    pub async fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data).await?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Flush and close. Returns the number of bytes appended in this cycle.
    pub async fn finish(mut self) -> io::Result<u64> {
        self.file.flush().await?;
        Ok(self.written)
    }
}
