//! Settings file for applications built on steadfast-fs
//!
//! ```toml
//! check-overwrite = true
//! encoding = "utf-8"
//!
//! [writer]
//! strategy = "atomic-replace"   # or "backup-and-swap"
//! sync-parent-dir = true
//! ```

use serde::{Deserialize, Serialize};

use crate::encoding::Encoding;
use crate::writer::{DurableWriter, WriterConfig};
use crate::{ConfigStore, File, NormalizedPath, Result};

/// Environment variable naming a settings file.
pub const CONFIG_ENV: &str = "STEADFAST_CONFIG";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Settings {
    /// Whether files opened through [`Settings::open`] check for conflicts.
    pub check_overwrite: bool,
    pub encoding: Encoding,
    pub writer: WriterConfig,
}

impl Settings {
    /// Load settings from `path`; a missing file yields the defaults.
    pub fn load(path: &NormalizedPath) -> Result<Self> {
        ConfigStore::new().load_or_default(path)
    }

    pub fn durable_writer(&self) -> DurableWriter {
        DurableWriter::new(self.writer)
    }

    /// A file handle configured by these settings.
    pub fn open(&self, path: impl Into<NormalizedPath>) -> File {
        let mut file = File::new(path)
            .writer(self.durable_writer())
            .encoding(self.encoding);
        file.set_check_overwrite(self.check_overwrite);
        file
    }
}
