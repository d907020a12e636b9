//! Ergonomic error context helpers.
//!
//! Provides extension traits for adding context to `Result` types,
//! converting JSON and IO errors into context-rich
//! `ConsentError` variants.

use crate::base::consenterror::ConsentError;
use std::io;
use std::path::Path;

/// Extension trait for adding context to JSON decoding results.
pub trait JsonResultExt<T> {
    /// Attribute a decoding failure to the widget configuration.
    ///
    /// # Example
    /// ```ignore
    /// use consentnet::base::context::JsonResultExt;
    ///
    /// let config: ConsentConfig = serde_json::from_str(raw).config_context()?;
    /// // Error: "Invalid configuration: unknown variant `banner` ..."
    /// ```
    fn config_context(self) -> Result<T, ConsentError>;
}

impl<T> JsonResultExt<T> for Result<T, serde_json::Error> {
    fn config_context(self) -> Result<T, ConsentError> {
        self.map_err(|e| ConsentError::invalid_config(e.to_string()))
    }
}

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add the offending path to an IO error.
    fn path_context(self, path: &Path) -> Result<T, ConsentError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn path_context(self, path: &Path) -> Result<T, ConsentError> {
        self.map_err(|e| ConsentError::ConfigIo {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }
}
