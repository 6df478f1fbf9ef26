//! Normalized absolute paths
//!
//! All separator, drive, URI and home-directory quirks are resolved once when a
//! [`NormalizedPath`] is constructed. Everything downstream works on the
//! normalized string and converts to a platform path only at I/O boundaries.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// An absolute path normalized to use forward slashes internally.
///
/// Redundant separators, `.` and `..` components are folded lexically when the
/// value is created. Relative input is resolved against the current working
/// directory.
///
/// The representation is UTF-8. Path components that are not valid Unicode
/// are converted lossily (invalid sequences become U+FFFD), so such a path
/// no longer names the original file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes, strips Windows verbatim
    /// prefixes and makes the path absolute.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let simplified = dunce::simplified(path.as_ref());
        let raw = simplified.to_string_lossy().replace('\\', "/");

        let absolute = if root_len(&raw) > 0 {
            raw
        } else {
            match std::env::current_dir() {
                Ok(cwd) => {
                    let cwd = dunce::simplified(&cwd).to_string_lossy().replace('\\', "/");
                    format!("{cwd}/{raw}")
                }
                // No working directory to anchor against; keep the input relative.
                Err(_) => raw,
            }
        };

        Self {
            inner: clean(&absolute),
        }
    }

    /// Parse user input that may be a `file:` URI or start with `~`.
    pub fn parse(input: &str) -> Result<Self> {
        if input.starts_with("file:") {
            Self::from_uri(input)
        } else if input == "~" || input.starts_with("~/") {
            match dirs::home_dir() {
                Some(home) => Ok(Self::new(home).join(input[1..].trim_start_matches('/'))),
                None => Ok(Self::new(input)),
            }
        } else {
            Ok(Self::new(input))
        }
    }

    /// Parse a `file:` URI.
    ///
    /// Accepts `file:///`, `file://localhost/` and the non-compliant `file:/`
    /// form. URIs naming another host are rejected.
    pub fn from_uri(uri: &str) -> Result<Self> {
        let path = if let Some(rest) = uri.strip_prefix("file://localhost/") {
            format!("/{rest}")
        } else if let Some(rest) = uri.strip_prefix("file:///") {
            format!("/{rest}")
        } else if uri.starts_with("file://") {
            return Err(Error::InvalidUri {
                uri: uri.to_string(),
                reason: "non-local file URIs are not supported".into(),
            });
        } else if let Some(rest) = uri.strip_prefix("file:/") {
            format!("/{rest}")
        } else {
            return Err(Error::InvalidUri {
                uri: uri.to_string(),
                reason: "not a file URI".into(),
            });
        };

        // file:///C:/x names a drive path on Windows
        let bytes = path.as_bytes();
        let is_drive = cfg!(windows)
            && bytes.len() >= 3
            && bytes[0] == b'/'
            && bytes[1].is_ascii_alphabetic()
            && bytes[2] == b':';
        let path = if is_drive { path[1..].to_string() } else { path };

        Ok(Self::new(path))
    }

    /// The `file://` URI for this path.
    pub fn to_uri(&self) -> String {
        if self.inner.starts_with('/') {
            format!("file://{}", self.inner)
        } else {
            format!("file:///{}", self.inner)
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let joined = if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self {
            inner: clean(&joined),
        }
    }

    /// Append `suffix` to the final component, e.g. `notes.txt` to
    /// `notes.txt.bak`.
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            inner: format!("{}{}", self.inner, suffix),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let root = root_len(&self.inner);
        if self.inner.len() <= root {
            return None;
        }
        let idx = self.inner.rfind('/')?;
        let end = if idx < root { root } else { idx };
        Some(Self {
            inner: self.inner[..end].to_string(),
        })
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        if self.inner.len() <= root_len(&self.inner) {
            return None;
        }
        self.inner.rsplit('/').next()
    }

    /// Path components below the root.
    pub fn components(&self) -> Vec<&str> {
        self.inner[root_len(&self.inner)..]
            .split('/')
            .filter(|c| !c.is_empty())
            .collect()
    }

    /// Whether this path lies strictly below `parent`.
    pub fn is_child_of(&self, parent: &NormalizedPath) -> bool {
        if parent.inner.ends_with('/') {
            self.inner.len() > parent.inner.len() && self.inner.starts_with(&parent.inner)
        } else {
            self.inner
                .strip_prefix(&parent.inner)
                .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'))
        }
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Check if this appears to be a network path.
    ///
    /// Detects UNC paths (//server/share) and warns but allows operation.
    pub fn is_network_path(&self) -> bool {
        self.inner.starts_with("//")
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }
}

/// Length of the root prefix: `//` for network paths, `X:/` for drive paths
/// on Windows, `/` otherwise. Zero for relative paths.
fn root_len(path: &str) -> usize {
    let bytes = path.as_bytes();
    if path.starts_with("//") && !path.starts_with("///") {
        2
    } else if path.starts_with('/') {
        1
    } else if cfg!(windows) && bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
    {
        if bytes.get(2) == Some(&b'/') { 3 } else { 2 }
    } else {
        0
    }
}

/// Lexically fold empty, `.` and `..` components.
fn clean(path: &str) -> String {
    let root = root_len(path);
    let (prefix, rest) = path.split_at(root);
    // "C:" without a slash still gets a root separator
    let prefix = if prefix.len() == 2 && prefix.ends_with(':') {
        format!("{prefix}/")
    } else {
        prefix.to_string()
    };

    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if prefix.is_empty() {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    format!("{}{}", prefix, parts.join("/"))
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&PathBuf> for NormalizedPath {
    fn from(p: &PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
