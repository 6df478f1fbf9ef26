//! One-shot durable I/O without conflict tracking

use std::io::ErrorKind;

use crate::writer::DurableWriter;
use crate::{Error, NormalizedPath, Result};

/// Write content durably with the default writer configuration.
///
/// Stages the content next to the target, syncs it, and renames it over the
/// target, so readers only ever see the old or the new content.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    DurableWriter::default().write(path, content)
}

/// Write UTF-8 text durably.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Read a file's bytes; a missing file reads as empty.
pub fn read_bytes(path: &NormalizedPath) -> Result<Vec<u8>> {
    let native_path = path.to_native();
    match std::fs::read(&native_path) {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(Error::io(native_path, e)),
    }
}

/// Read UTF-8 text; a missing file reads as empty.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    String::from_utf8(read_bytes(path)?).map_err(|_| Error::Decode {
        path: path.to_native(),
    })
}

/// Remove a file and any leftover write artifacts. Missing files are ignored.
pub fn remove(path: &NormalizedPath) -> Result<()> {
    DurableWriter::default().remove(path)
}
