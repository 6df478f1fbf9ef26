//! Reserved names for the artifacts a write leaves behind transiently.

/// Transient files created next to a target while it is being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Artifact {
    /// Staged content, renamed over the target on commit
    Staged,
    /// Previous target, held aside by the backup-and-swap commit
    Backup,
}

impl Artifact {
    pub const ALL: [Self; 2] = [Self::Staged, Self::Backup];

    /// Suffix appended to the target path.
    pub fn suffix(&self) -> &'static str {
        match self {
            Self::Staged => ".~steadfast-new~",
            Self::Backup => ".~steadfast-bak~",
        }
    }

    /// Whether a file name carries one of the reserved suffixes.
    pub fn is_reserved(name: &str) -> bool {
        Self::ALL.iter().any(|a| name.ends_with(a.suffix()))
    }
}

impl AsRef<str> for Artifact {
    fn as_ref(&self) -> &str {
        self.suffix()
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}
