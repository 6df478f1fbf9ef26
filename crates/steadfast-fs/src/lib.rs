//! Durable, conflict-aware file writes
//!
//! Writes are staged in a sibling file, synced to stable storage and renamed
//! over the target, so a crash leaves either the old or the new content.
//! Files opened with conflict checking refuse to overwrite changes made on
//! disk since they were last read.

pub mod checksum;
pub mod config;
pub mod constants;
pub mod dir;
pub mod encoding;
pub mod error;
pub mod file;
pub mod guard;
pub mod io;
pub mod path;
pub mod settings;
pub mod writer;

pub use checksum::Fingerprint;
pub use config::ConfigStore;
pub use constants::Artifact;
pub use dir::Dir;
pub use encoding::Encoding;
pub use error::{Error, Result};
pub use file::File;
pub use guard::{OverwriteGuard, ReadRecord};
pub use path::NormalizedPath;
pub use settings::Settings;
pub use writer::{CommitStrategy, DurableWriter, Stage, WriteSession, WriterConfig};
