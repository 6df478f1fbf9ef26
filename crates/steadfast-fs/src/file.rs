//! File handles with durable writes and optional conflict checking

use std::time::SystemTime;

use tracing::info;

use crate::checksum::Fingerprint;
use crate::dir::Dir;
use crate::encoding::Encoding;
use crate::guard::{self, OverwriteGuard, ReadRecord};
use crate::writer::{self, DurableWriter};
use crate::{Error, NormalizedPath, Result};

/// A file on disk.
///
/// Every write goes through [`DurableWriter`], so the file is always either
/// its old or its new content. With conflict checking on, reads are recorded
/// and a later write is refused with [`Error::Conflict`] if the file was changed
/// by someone else in between. Writing without reading first is allowed.
///
/// Reading a file that does not exist yields empty content.
#[derive(Debug, Clone)]
pub struct File {
    path: NormalizedPath,
    guard: OverwriteGuard,
    writer: DurableWriter,
    encoding: Encoding,
}

impl File {
    /// A file without conflict checking.
    pub fn new(path: impl Into<NormalizedPath>) -> Self {
        Self {
            path: path.into(),
            guard: OverwriteGuard::new(false),
            writer: DurableWriter::default(),
            encoding: Encoding::default(),
        }
    }

    /// A file that refuses to overwrite external changes.
    pub fn with_conflict_check(path: impl Into<NormalizedPath>) -> Self {
        let mut file = Self::new(path);
        file.guard.set_enabled(true);
        file
    }

    pub fn writer(mut self, writer: DurableWriter) -> Self {
        self.writer = writer;
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// The containing directory.
    pub fn dir(&self) -> Option<Dir> {
        self.path.parent().map(Dir::new)
    }

    pub fn check_overwrite(&self) -> bool {
        self.guard.is_enabled()
    }

    pub fn set_check_overwrite(&mut self, enabled: bool) {
        self.guard.set_enabled(enabled);
    }

    pub fn read_record(&self) -> Option<&ReadRecord> {
        self.guard.record()
    }

    /// Require the current content to have `fingerprint` at the next write.
    ///
    /// Turns conflict checking on.
    pub fn expect_fingerprint(&mut self, fingerprint: Fingerprint) {
        self.guard.expect(fingerprint);
    }

    /// True if the path exists and is a regular file.
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn is_writable(&self) -> bool {
        writer::ensure_writable(&self.path).is_ok()
    }

    pub fn mtime(&self) -> Result<SystemTime> {
        guard::modified(&self.path)?.ok_or_else(|| {
            Error::io(
                self.path.to_native(),
                std::io::Error::from(std::io::ErrorKind::NotFound),
            )
        })
    }

    pub fn read_bytes(&mut self) -> Result<Vec<u8>> {
        // Stat before reading so a concurrent change can only make the
        // record look older than the content, never newer.
        let Some(mtime) = guard::modified(&self.path)? else {
            return Ok(Vec::new());
        };
        let native = self.path.to_native();
        let content = match std::fs::read(&native) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(native, e)),
        };
        self.guard.observe(Some(mtime), &content);
        Ok(content)
    }

    pub fn read_text(&mut self) -> Result<String> {
        let bytes = self.read_bytes()?;
        self.encoding.decode(bytes).ok_or_else(|| Error::Decode {
            path: self.path.to_native(),
        })
    }

    /// Lines including their terminators.
    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        let text = self.read_text()?;
        Ok(text.split_inclusive('\n').map(str::to_string).collect())
    }

    pub fn write_bytes(&mut self, content: &[u8]) -> Result<()> {
        self.guard.check(&self.path)?;
        let guard = &mut self.guard;
        self.writer.write_with(&self.path, content, |path| {
            guard.refresh(path, content);
            Ok(())
        })
    }

    pub fn write(&mut self, text: &str) -> Result<()> {
        let bytes = self.encoding.encode(text);
        self.write_bytes(&bytes)
    }

    /// Write lines as given; terminators are not added.
    pub fn write_lines<L: AsRef<str>>(&mut self, lines: &[L]) -> Result<()> {
        let text: String = lines.iter().map(AsRef::as_ref).collect();
        self.write(&text)
    }

    /// Create the file empty if it does not exist yet.
    pub fn touch(&mut self) -> Result<()> {
        if self.exists() {
            return Ok(());
        }
        self.write_bytes(&[])
    }

    /// Remove the file and any artifact of an earlier failed write.
    ///
    /// Missing files are ignored.
    pub fn remove(&mut self) -> Result<()> {
        self.guard.clear();
        self.writer.remove(&self.path)
    }

    /// Remove the file, then any parent directories left empty.
    pub fn cleanup(&mut self) -> Result<bool> {
        self.remove()?;
        match self.dir() {
            Some(dir) => dir.cleanup(),
            None => Ok(true),
        }
    }

    /// Durably copy the current content to `dest`, replacing it.
    ///
    /// The copy is a write through `dest`, so a destination that checks for
    /// conflicts refuses to clobber external changes and tracks the copied
    /// content afterwards.
    pub fn copy_to(&self, dest: &mut File) -> Result<()> {
        info!(from = %self.path, to = %dest.path, "Copy");
        let native = self.path.to_native();
        let content = std::fs::read(&native).map_err(|e| Error::io(native, e))?;
        dest.write_bytes(&content)
    }

    /// Copy into `dir` under the same file name.
    ///
    /// The returned handle inherits this file's settings, including
    /// conflict checking, and already tracks the copied content.
    pub fn copy_into(&self, dir: &Dir) -> Result<File> {
        let name = self.path.file_name().unwrap_or_default();
        let mut dest = dir.file(name)?.writer(self.writer).encoding(self.encoding);
        dest.set_check_overwrite(self.check_overwrite());
        self.copy_to(&mut dest)?;
        Ok(dest)
    }

    /// Move the file to `dest`, creating missing parents.
    ///
    /// Settings and the read record carry over to the returned handle.
    pub fn rename_to(self, dest: impl Into<NormalizedPath>) -> Result<File> {
        let dest = dest.into();
        info!(from = %self.path, to = %dest, "Rename");
        if let Some(parent) = dest.parent() {
            Dir::new(parent).ensure_exists()?;
        }
        std::fs::rename(self.path.to_native(), dest.to_native())
            .map_err(|e| Error::classify(dest.to_native(), e))?;
        Ok(File { path: dest, ..self })
    }
}

impl PartialEq for File {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl std::fmt::Display for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}
