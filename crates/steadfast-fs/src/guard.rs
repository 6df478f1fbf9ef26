//! Optimistic detection of external modifications
//!
//! When enabled, a read records the file's modification time and a
//! fingerprint of the bytes read. Before a write the guard compares the
//! current modification time against the record; only when the times differ
//! is the on-disk content fingerprinted, so a plain `touch` does not count as
//! a change. Edits that land within the filesystem's timestamp granularity of
//! the recorded read are not detected.

use std::fs;
use std::io::ErrorKind;
use std::time::SystemTime;

use tracing::warn;

use crate::checksum::Fingerprint;
use crate::{Error, NormalizedPath, Result};

/// What a file looked like when it was last read or written through a guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRecord {
    /// `None` forces the fingerprint comparison on every check.
    pub mtime: Option<SystemTime>,
    pub fingerprint: Fingerprint,
}

/// Per-file conflict tracking.
#[derive(Debug, Clone, Default)]
pub struct OverwriteGuard {
    enabled: bool,
    record: Option<ReadRecord>,
}

impl OverwriteGuard {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            record: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turn tracking on or off. Turning it off discards the record.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.record = None;
        }
    }

    pub fn record(&self) -> Option<&ReadRecord> {
        self.record.as_ref()
    }

    pub fn clear(&mut self) {
        self.record = None;
    }

    /// Remember a read of `content`, with `mtime` taken before the read.
    pub fn observe(&mut self, mtime: Option<SystemTime>, content: &[u8]) {
        if self.enabled {
            self.record = Some(ReadRecord {
                mtime,
                fingerprint: Fingerprint::of_bytes(content),
            });
        }
    }

    /// Require the on-disk content to match `fingerprint` at the next check,
    /// regardless of modification time.
    pub fn expect(&mut self, fingerprint: Fingerprint) {
        self.enabled = true;
        self.record = Some(ReadRecord {
            mtime: None,
            fingerprint,
        });
    }

    /// Fail with [`Error::Conflict`] if `path` changed since the record.
    ///
    /// Passes when tracking is disabled or nothing was read yet. A file that
    /// disappeared compares as empty content.
    pub fn check(&self, path: &NormalizedPath) -> Result<()> {
        let Some(record) = self.record.filter(|_| self.enabled) else {
            return Ok(());
        };

        if let Some(seen) = record.mtime {
            if modified(path)? == Some(seen) {
                return Ok(());
            }
            warn!(path = %path, "mtime check failed, comparing fingerprints");
        }

        let native = path.to_native();
        let current = match fs::read(&native) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::io(native, e)),
        };

        if Fingerprint::of_bytes(&current) == record.fingerprint {
            Ok(())
        } else {
            Err(Error::Conflict { path: native })
        }
    }

    /// Track `content` as just committed to `path`.
    ///
    /// If the new modification time can not be read the record is dropped,
    /// so the next write goes through unchecked rather than failing.
    pub fn refresh(&mut self, path: &NormalizedPath, content: &[u8]) {
        if !self.enabled {
            return;
        }
        match modified(path) {
            Ok(mtime) => self.observe(mtime, content),
            Err(e) => {
                warn!(path = %path, error = %e, "Could not stat committed file, dropping read record");
                self.record = None;
            }
        }
    }
}

/// Modification time of `path`, `None` if it does not exist.
pub(crate) fn modified(path: &NormalizedPath) -> Result<Option<SystemTime>> {
    let native = path.to_native();
    match fs::metadata(&native).and_then(|meta| meta.modified()) {
        Ok(time) => Ok(Some(time)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(native, e)),
    }
}
