//! Session token persisted between runs.

use std::io;
use std::path::{Path, PathBuf};

/// Plain-text file holding the last session token.
#[derive(Debug, Clone)]
pub struct TokenFile {
    path: PathBuf,
}

impl TokenFile {
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The stored token, or `None` when the file is missing or blank.
    ///
    /// # Errors
    ///
    /// Returns any I/O error other than a missing file.
    pub fn load(&self) -> io::Result<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Replace the stored token.
    ///
    /// # Errors
    ///
    /// Returns the I/O error of the write.
    pub fn save(&self, token: &str) -> io::Result<()> {
        std::fs::write(&self.path, token)?;
        tracing::debug!(path = %self.path.display(), "session token stored");
        Ok(())
    }
}
