//! Durable write-commit protocol
//!
//! Content is staged in a sibling file named after the target plus a reserved
//! suffix, forced to stable storage, and only then substituted for the target.
//! A crash before the substitution leaves the old target untouched; after it,
//! the target holds the complete new content.
//!
//! ```text
//! begin -> Writing -> Flushing -> Committing -> Committed
//! ```
//!
//! [`DurableWriter::begin`] runs the preparing checks (target writable,
//! parent present, staged file created) before a session exists, so a
//! session is observable from [`Stage::Writing`] onward. Any later failure
//! moves it to [`Stage::Failed`]. A failed or abandoned session never touches
//! the target.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::constants::Artifact;
use crate::dir::Dir;
use crate::encoding::Encoding;
use crate::{Error, NormalizedPath, Result};

/// Position of a [`WriteSession`] in the commit protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Writing,
    Flushing,
    Committing,
    Committed,
    Failed,
}

/// How the staged file replaces the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommitStrategy {
    /// A single rename over the existing target.
    AtomicReplace,
    /// Move the target aside, rename the staged file in, drop the backup.
    ///
    /// For filesystems whose rename refuses an existing destination. There is
    /// a window between the two renames in which the target path is absent;
    /// a crash there leaves the old content under the backup name. This
    /// strategy is not crash-atomic.
    BackupAndSwap,
}

impl CommitStrategy {
    /// The strategy the current platform supports.
    ///
    /// `std::fs::rename` replaces an existing destination on every platform
    /// std supports (Windows uses `MOVEFILE_REPLACE_EXISTING`), so this is
    /// always [`CommitStrategy::AtomicReplace`]. Filesystems that reject
    /// replacing renames have to opt into [`CommitStrategy::BackupAndSwap`]
    /// through configuration.
    pub fn detect() -> Self {
        Self::AtomicReplace
    }

    /// Substitute `staged` for `target`.
    fn commit(self, staged: &NormalizedPath, target: &NormalizedPath) -> Result<()> {
        match self {
            Self::AtomicReplace => rename(staged, target),
            Self::BackupAndSwap => {
                if !target.is_file() {
                    return rename(staged, target);
                }

                let backup = artifact_path(target, Artifact::Backup);
                remove_if_present(&backup)?;
                rename(target, &backup)?;

                if let Err(e) = rename(staged, target) {
                    warn!(target = %target, "Commit failed after moving target aside, restoring");
                    if let Err(restore) = rename(&backup, target) {
                        error!(
                            target = %target,
                            backup = %backup,
                            error = %restore,
                            "Could not restore target, previous content left in backup"
                        );
                    }
                    return Err(e);
                }

                if let Err(e) = fs::remove_file(backup.to_native()) {
                    warn!(backup = %backup, error = %e, "Could not remove backup after commit");
                }
                Ok(())
            }
        }
    }
}

impl Default for CommitStrategy {
    fn default() -> Self {
        Self::detect()
    }
}

/// Tunables for [`DurableWriter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct WriterConfig {
    pub strategy: CommitStrategy,
    /// Sync the containing directory after commit so the new entry survives
    /// a crash. Unix only; a no-op elsewhere.
    pub sync_parent_dir: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            strategy: CommitStrategy::detect(),
            sync_parent_dir: true,
        }
    }
}

/// Path of a transient artifact for `target`.
pub fn artifact_path(target: &NormalizedPath, artifact: Artifact) -> NormalizedPath {
    target.with_suffix(artifact.suffix())
}

/// Executes the commit protocol for whole-content writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DurableWriter {
    config: WriterConfig,
}

impl DurableWriter {
    pub fn new(config: WriterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> WriterConfig {
        self.config
    }

    /// Start a session for `target`, running the preparing stage.
    pub fn begin(&self, target: &NormalizedPath) -> Result<WriteSession> {
        WriteSession::begin(target, self.config)
    }

    /// Durably replace `target` with `content`.
    pub fn write(&self, target: &NormalizedPath, content: &[u8]) -> Result<()> {
        self.write_with(target, content, |_| Ok(()))
    }

    /// Durably replace `target` with `content`, then run `on_commit`.
    ///
    /// `on_commit` only runs once the content is in place.
    pub fn write_with<F>(&self, target: &NormalizedPath, content: &[u8], on_commit: F) -> Result<()>
    where
        F: FnOnce(&NormalizedPath) -> Result<()>,
    {
        let mut session = self.begin(target)?;
        session.write_all(content)?;
        session.flush()?;
        session.commit_with(on_commit)
    }

    /// Encode `text` and durably replace `target` with it.
    pub fn write_text(&self, target: &NormalizedPath, text: &str, encoding: Encoding) -> Result<()> {
        let mut session = self.begin(target)?;
        session.write_text(text, encoding)?;
        session.flush()?;
        session.commit()
    }

    /// Remove `target` along with any artifact of an earlier failed write.
    ///
    /// Missing files are ignored, so this is safe to repeat.
    pub fn remove(&self, target: &NormalizedPath) -> Result<()> {
        info!(path = %target, "Remove file");
        remove_if_present(target)?;
        for artifact in Artifact::ALL {
            remove_if_present(&artifact_path(target, artifact))?;
        }
        Ok(())
    }
}

/// One in-flight write.
///
/// Owns the staged file handle until it is flushed and closed. Dropping a
/// session that has not committed removes the staged file on a best-effort
/// basis; the target is never touched.
#[derive(Debug)]
pub struct WriteSession {
    target: NormalizedPath,
    staged: NormalizedPath,
    config: WriterConfig,
    handle: Option<BufWriter<fs::File>>,
    stage: Stage,
    written: u64,
}

impl WriteSession {
    fn begin(target: &NormalizedPath, config: WriterConfig) -> Result<Self> {
        ensure_writable(target)?;
        if let Some(parent) = target.parent() {
            Dir::new(parent).ensure_exists()?;
        }

        let staged = artifact_path(target, Artifact::Staged);
        // A leftover from an earlier failed write is replaced, never written
        // through, in case it is a link.
        remove_if_present(&staged)?;

        let native = staged.to_native();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&native)
            .map_err(|e| Error::classify(&native, e))?;

        debug!(target = %target, staged = %staged, "Staging write");
        Ok(Self {
            target: target.clone(),
            staged,
            config,
            handle: Some(BufWriter::new(file)),
            stage: Stage::Writing,
            written: 0,
        })
    }

    pub fn target(&self) -> &NormalizedPath {
        &self.target
    }

    pub fn staged_path(&self) -> &NormalizedPath {
        &self.staged
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Bytes written to the staged file so far.
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Append raw bytes to the staged content.
    pub fn write_all(&mut self, content: &[u8]) -> Result<()> {
        self.expect(Stage::Writing)?;
        let Some(handle) = self.handle.as_mut() else {
            return Err(self.out_of_order(Stage::Writing));
        };
        if let Err(e) = handle.write_all(content) {
            self.stage = Stage::Failed;
            return Err(Error::io(self.staged.to_native(), e));
        }
        self.written += content.len() as u64;
        Ok(())
    }

    /// Encode `text` and append it to the staged content.
    pub fn write_text(&mut self, text: &str, encoding: Encoding) -> Result<()> {
        let bytes = encoding.encode(text);
        self.write_all(&bytes)
    }

    /// Flush buffers, sync the staged file to stable storage, then close it.
    pub fn flush(&mut self) -> Result<()> {
        self.expect(Stage::Writing)?;
        self.stage = Stage::Flushing;
        let native = self.staged.to_native();

        let Some(handle) = self.handle.take() else {
            self.stage = Stage::Failed;
            return Err(self.out_of_order(Stage::Writing));
        };
        let file = match handle.into_inner() {
            Ok(file) => file,
            Err(e) => {
                self.stage = Stage::Failed;
                return Err(Error::io(native, e.into_error()));
            }
        };
        if let Err(e) = file.sync_all() {
            self.stage = Stage::Failed;
            return Err(Error::io(native, e));
        }
        drop(file);

        self.stage = Stage::Committing;
        Ok(())
    }

    /// Substitute the staged file for the target.
    pub fn commit(self) -> Result<()> {
        self.commit_with(|_| Ok(()))
    }

    /// Substitute the staged file for the target, then run `on_commit`.
    pub fn commit_with<F>(mut self, on_commit: F) -> Result<()>
    where
        F: FnOnce(&NormalizedPath) -> Result<()>,
    {
        self.expect(Stage::Committing)?;
        if let Err(e) = self.config.strategy.commit(&self.staged, &self.target) {
            self.stage = Stage::Failed;
            return Err(e);
        }
        self.stage = Stage::Committed;

        if self.config.sync_parent_dir {
            if let Some(parent) = self.target.parent() {
                if let Err(e) = sync_dir(&parent) {
                    warn!(dir = %parent, error = %e, "Could not sync directory after commit");
                }
            }
        }

        debug!(path = %self.target, bytes = self.written, "Wrote");
        on_commit(&self.target)
    }

    fn expect(&self, expected: Stage) -> Result<()> {
        if self.stage == expected {
            Ok(())
        } else {
            Err(self.out_of_order(expected))
        }
    }

    fn out_of_order(&self, expected: Stage) -> Error {
        Error::OutOfOrder {
            expected,
            found: self.stage,
        }
    }
}

impl Drop for WriteSession {
    fn drop(&mut self) {
        if self.stage == Stage::Committed {
            return;
        }
        // Close before removing, Windows refuses to delete open files
        drop(self.handle.take());
        if let Err(e) = fs::remove_file(self.staged.to_native()) {
            if e.kind() != ErrorKind::NotFound {
                warn!(staged = %self.staged, error = %e, "Could not remove abandoned staged file");
            }
        }
    }
}

/// Fail with [`Error::PermissionDenied`] if `target` can not be written.
///
/// An existing target must be writable itself; a missing one needs its
/// nearest existing ancestor to be writable.
pub fn ensure_writable(target: &NormalizedPath) -> Result<()> {
    let mut probe = Some(target.clone());
    while let Some(path) = probe {
        let native = path.to_native();
        match fs::metadata(&native) {
            Ok(meta) if is_read_only(&meta) => {
                return Err(Error::PermissionDenied { path: native });
            }
            Ok(_) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => probe = path.parent(),
            Err(e) => return Err(Error::classify(native, e)),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn is_read_only(meta: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o200 == 0
}

#[cfg(not(unix))]
fn is_read_only(meta: &fs::Metadata) -> bool {
    // The read-only attribute on Windows directories is not enforced
    !meta.is_dir() && meta.permissions().readonly()
}

fn rename(from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
    fs::rename(from.to_native(), to.to_native()).map_err(|e| Error::classify(to.to_native(), e))
}

fn remove_if_present(path: &NormalizedPath) -> Result<()> {
    let native = path.to_native();
    match fs::remove_file(&native) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::classify(native, e)),
    }
}

#[cfg(unix)]
fn sync_dir(dir: &NormalizedPath) -> std::io::Result<()> {
    fs::File::open(dir.to_native())?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &NormalizedPath) -> std::io::Result<()> {
    Ok(())
}
