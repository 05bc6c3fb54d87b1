use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

use crate::domain::error::{SerconError, SerconResult};

const RECORD_SEPARATOR: &str = "\n";

struct OpenCapture {
    path: PathBuf,
    writer: BufWriter<File>,
}

/// Append-only file receiving committed terminal lines.
///
/// Clones share the same handle, so the menu can toggle it while the
/// renderer appends.
#[derive(Clone, Default)]
pub struct CaptureSink {
    inner: Arc<Mutex<Option<OpenCapture>>>,
}

impl CaptureSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start capturing into `path`. Does nothing if already capturing.
    pub fn enable(&self, path: &Path) -> SerconResult<()> {
        let mut inner = self.lock();
        if let Some(open) = inner.as_ref() {
            if open.path != path {
                warn!(
                    "Capture already writing to {}, ignoring {}",
                    open.path.display(),
                    path.display()
                );
            }
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| SerconError::Capture {
                path: path.display().to_string(),
                source,
            })?;

        info!("Capture enabled: {}", path.display());
        *inner = Some(OpenCapture {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        });
        Ok(())
    }

    /// Stop capturing and close the file. Does nothing if not capturing.
    pub fn disable(&self) -> SerconResult<()> {
        if let Some(mut open) = self.lock().take() {
            info!("Capture disabled: {}", open.path.display());
            open.writer.flush().map_err(|source| SerconError::Capture {
                path: open.path.display().to_string(),
                source,
            })?;
        }
        Ok(())
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().is_some()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.lock().as_ref().map(|open| open.path.clone())
    }

    /// Append one committed line. Returns whether it was written.
    pub fn append(&self, line: &str) -> SerconResult<bool> {
        let mut inner = self.lock();
        let Some(open) = inner.as_mut() else {
            return Ok(false);
        };

        let result = open
            .writer
            .write_all(line.as_bytes())
            .and_then(|_| open.writer.write_all(RECORD_SEPARATOR.as_bytes()))
            .and_then(|_| open.writer.flush());

        result.map(|_| true).map_err(|source| SerconError::Capture {
            path: open.path.display().to_string(),
            source,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Option<OpenCapture>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for CaptureSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSink")
            .field("path", &self.path())
            .finish()
    }
}
