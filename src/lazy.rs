use std::fmt;
use std::sync::OnceLock;

use crate::error::ConfigError;
use crate::typed::TypedConfig;

/// A deferred typed lookup, created by [`TypedConfig::lazy`].
///
/// The lookup runs at most once, on the first [`get`](Lazy::get), even when
/// several threads race for it. The result (including absence) is cached.
pub struct Lazy<T> {
    source: TypedConfig,
    path: String,
    cell: OnceLock<Option<T>>,
}

impl<T: 'static> Lazy<T> {
    pub(crate) fn new(source: TypedConfig, path: &str) -> Self {
        Self {
            source,
            path: path.to_string(),
            cell: OnceLock::new(),
        }
    }

    pub fn get(&self) -> Option<&T> {
        self.cell
            .get_or_init(|| self.source.get(&self.path))
            .as_ref()
    }

    pub fn require(&self) -> Result<&T, ConfigError> {
        self.get().ok_or_else(|| ConfigError::MissingOrUnconvertible {
            path: self.path.clone(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn is_evaluated(&self) -> bool {
        self.cell.get().is_some()
    }
}

impl<T: fmt::Debug> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("path", &self.path)
            .field("value", &self.cell.get())
            .finish()
    }
}
