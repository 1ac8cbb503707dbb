//! Loader error types

use thiserror::Error;

use super::ModulePath;

/// Loading or running a page module failed.
///
/// Never escapes the loader: every variant is logged and turned into a
/// [`super::LoadOutcome`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadError {
    #[error("Module not found: {0}")]
    NotFound(ModulePath),

    #[error("Failed to load module {path}: {reason}")]
    Load { path: ModulePath, reason: String },

    #[error("Module {path} entry point failed: {reason}")]
    Entry { path: ModulePath, reason: String },
}

impl LoadError {
    pub fn path(&self) -> &ModulePath {
        match self {
            LoadError::NotFound(path) => path,
            LoadError::Load { path, .. } => path,
            LoadError::Entry { path, .. } => path,
        }
    }
}
