//! Directory collaborator
//!
//! The write protocol only needs [`Dir::ensure_exists`] and
//! [`Dir::remove_if_empty`]; the rest is convenience for callers that manage
//! files beneath a directory.

use std::fs;
use std::io::ErrorKind;

use tracing::info;

use crate::constants::Artifact;
use crate::file::File;
use crate::{Error, NormalizedPath, Result};

/// A directory on disk addressed by a normalized path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Dir {
    path: NormalizedPath,
}

impl Dir {
    pub fn new(path: impl Into<NormalizedPath>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    /// True if the path exists and is a directory.
    pub fn exists(&self) -> bool {
        self.path.is_dir()
    }

    /// Create this directory and any missing parents.
    ///
    /// A directory that already exists, including one created concurrently by
    /// someone else, counts as success.
    pub fn ensure_exists(&self) -> Result<()> {
        let native = self.path.to_native();
        match fs::create_dir_all(&native) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && native.is_dir() => Ok(()),
            Err(e) => Err(Error::classify(native, e)),
        }
    }

    /// Remove this directory. Fails if it is not empty.
    pub fn remove(&self) -> Result<()> {
        info!(path = %self.path, "Remove dir");
        let native = self.path.to_native();
        fs::remove_dir(&native).map_err(|e| Error::io(native, e))
    }

    /// Remove this directory if it exists and is empty.
    ///
    /// Returns `false` when the directory is still there afterwards.
    pub fn remove_if_empty(&self) -> Result<bool> {
        if !self.exists() {
            return Ok(true);
        }
        let native = self.path.to_native();
        let is_empty = fs::read_dir(&native)
            .map_err(|e| Error::io(&native, e))?
            .next()
            .is_none();
        if !is_empty {
            return Ok(false);
        }
        match fs::remove_dir(&native) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
            Err(e) => Err(Error::io(native, e)),
        }
    }

    /// Remove this directory and then any parents left empty.
    ///
    /// Ignores a directory that does not exist. Stops silently at the first
    /// non-empty directory; returns `false` if that was this one.
    pub fn cleanup(&self) -> Result<bool> {
        if !self.remove_if_empty()? {
            return Ok(false);
        }
        let mut current = self.path.parent();
        while let Some(parent) = current {
            match Dir::new(parent.clone()).remove_if_empty() {
                Ok(true) => current = parent.parent(),
                // Parents we can not remove end the walk, they do not fail it
                Ok(false) | Err(_) => break,
            }
        }
        Ok(true)
    }

    /// Sorted names of the entries in this directory.
    ///
    /// Hidden entries and in-flight write artifacts are skipped. A missing
    /// directory lists as empty. Names that are not valid Unicode are
    /// converted lossily.
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let native = self.path.to_native();
        let mut names = Vec::new();
        for entry in fs::read_dir(&native).map_err(|e| Error::io(&native, e))? {
            let entry = entry.map_err(|e| Error::io(&native, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || Artifact::is_reserved(&name) {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    /// A file below this directory.
    pub fn file(&self, relative: &str) -> Result<File> {
        Ok(File::new(self.below(relative)?))
    }

    /// A subdirectory below this directory.
    pub fn subdir(&self, relative: &str) -> Result<Dir> {
        Ok(Dir::new(self.below(relative)?))
    }

    fn below(&self, relative: &str) -> Result<NormalizedPath> {
        let path = self.path.join(relative);
        if !path.is_child_of(&self.path) {
            return Err(Error::PathEscape {
                path: path.to_native(),
                base: self.path.to_native(),
            });
        }
        Ok(path)
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path)
    }
}
