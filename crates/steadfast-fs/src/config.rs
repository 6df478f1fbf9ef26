//! Format-agnostic configuration loading and saving

use crate::{Error, File, NormalizedPath, Result, writer::DurableWriter};
use serde::{Serialize, de::DeserializeOwned};

/// Serialization formats recognised by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Format {
    Toml,
    Json,
    Yaml,
}

impl Format {
    fn detect(path: &NormalizedPath) -> Result<Self> {
        let extension = path.extension().unwrap_or("");
        match extension.to_lowercase().as_str() {
            "toml" => Ok(Self::Toml),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(Error::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
            Self::Yaml => "YAML",
        }
    }

    fn parse<T: DeserializeOwned>(self, path: &NormalizedPath, content: &str) -> Result<T> {
        let parsed = match self {
            Self::Toml => toml::from_str(content).map_err(|e| e.to_string()),
            Self::Json => serde_json::from_str(content).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::from_str(content).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| Error::ConfigParse {
            path: path.to_native(),
            format: self.name().into(),
            message,
        })
    }

    fn render<T: Serialize>(self, path: &NormalizedPath, value: &T) -> Result<String> {
        let rendered = match self {
            Self::Toml => toml::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
            Self::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        };
        rendered.map_err(|message| Error::ConfigSerialize {
            path: path.to_native(),
            format: self.name().into(),
            message,
        })
    }
}

/// Format-agnostic configuration store.
///
/// Automatically detects format from file extension and handles
/// serialization/deserialization transparently. Saves go through the
/// durable writer.
#[derive(Debug, Default)]
pub struct ConfigStore {
    writer: DurableWriter,
}

impl ConfigStore {
    /// Create a new ConfigStore with the default writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new ConfigStore with a custom writer.
    pub fn with_writer(writer: DurableWriter) -> Self {
        Self { writer }
    }

    /// Load configuration from a file.
    ///
    /// Format is detected from file extension:
    /// - `.toml` -> TOML
    /// - `.json` -> JSON
    /// - `.yaml`, `.yml` -> YAML
    pub fn load<T: DeserializeOwned>(&self, path: &NormalizedPath) -> Result<T> {
        let format = Format::detect(path)?;
        let content = crate::io::read_text(path)?;
        format.parse(path, &content)
    }

    /// Load configuration, or the default value if the file does not exist.
    pub fn load_or_default<T: DeserializeOwned + Default>(&self, path: &NormalizedPath) -> Result<T> {
        if path.is_file() {
            self.load(path)
        } else {
            Ok(T::default())
        }
    }

    /// Save configuration to a file.
    ///
    /// Format is determined from file extension.
    pub fn save<T: Serialize>(&self, path: &NormalizedPath, value: &T) -> Result<()> {
        let content = Format::detect(path)?.render(path, value)?;
        self.writer.write(path, content.as_bytes())
    }

    /// Load through a tracked file, so a later [`ConfigStore::save_file`]
    /// notices edits made in between.
    pub fn load_file<T: DeserializeOwned>(&self, file: &mut File) -> Result<T> {
        let format = Format::detect(file.path())?;
        let content = file.read_text()?;
        format.parse(file.path(), &content)
    }

    /// Save through a tracked file, refusing to overwrite external changes
    /// when the file checks for conflicts.
    pub fn save_file<T: Serialize>(&self, file: &mut File, value: &T) -> Result<()> {
        let content = Format::detect(file.path())?.render(file.path(), value)?;
        file.write(&content)
    }
}
