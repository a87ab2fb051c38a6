//! File-backed configuration providers.
//!
//! A [`FileSource`] names one file. Whether a missing file is an error is the
//! caller's choice: a **required** file that does not exist aborts the build
//! with [`ConfigError::FileNotFound`]; an optional one contributes an empty
//! snapshot. Other I/O errors (permissions, etc.) are always propagated.
//!
//! The syntax comes from the extension (`.json`, `.properties`, anything else
//! is TOML) unless set explicitly with [`FileSource::format`].

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::Config;
use crate::error::ConfigError;
use crate::format;
use crate::source::ConfigProvider;
use crate::types::Format;

#[derive(Debug, Clone)]
pub struct FileSource {
    path: Option<PathBuf>,
    format: Format,
    required: bool,
}

impl FileSource {
    /// A file that must exist.
    pub fn required(path: impl AsRef<Path>) -> Self {
        Self::new(path, true)
    }

    /// A file that may be absent.
    pub fn optional(path: impl AsRef<Path>) -> Self {
        Self::new(path, false)
    }

    fn new(path: impl AsRef<Path>, required: bool) -> Self {
        let path = path.as_ref().to_path_buf();
        Self {
            format: Format::from_path(&path),
            path: Some(path),
            required,
        }
    }

    /// `file_name` in the platform config directory for `app_name`
    /// (XDG on Linux, `~/Library/Application Support` on macOS).
    ///
    /// Always optional. If the platform has no config directory the source is
    /// empty.
    pub fn platform(app_name: &str, file_name: &str) -> Self {
        let path = platform_config_dir(app_name).map(|dir| dir.join(file_name));
        Self {
            format: path.as_deref().map(Format::from_path).unwrap_or_default(),
            path,
            required: false,
        }
    }

    /// Override the format guessed from the extension.
    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl ConfigProvider for FileSource {
    fn load(&self) -> Result<Config, ConfigError> {
        let Some(path) = &self.path else {
            return Ok(Config::empty());
        };
        match read_config_file(path, self.required)? {
            Some(content) => {
                let origin = path.display().to_string();
                format::parse(&content, self.format, &origin).map(Config::from_table)
            }
            None => Ok(Config::empty()),
        }
    }

    fn describe(&self) -> String {
        match &self.path {
            Some(path) => format!("file {}", path.display()),
            None => "file (no platform config directory)".to_string(),
        }
    }
}

/// The platform config directory for `app_name`, if the OS has one.
pub fn platform_config_dir(app_name: &str) -> Option<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", app_name)?;
    Some(proj.config_dir().to_path_buf())
}

/// Read a config file. `Ok(None)` if it doesn't exist and isn't required.
fn read_config_file(path: &Path, required: bool) -> Result<Option<String>, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if required {
                Err(ConfigError::FileNotFound(path.to_path_buf()))
            } else {
                debug!(path = %path.display(), "optional config file not found, skipping");
                Ok(None)
            }
        }
        Err(e) => Err(ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}
