use std::path::PathBuf;

use thiserror::Error;

/// Failure to set up a store file's backing path.
#[derive(Debug, Error)]
pub enum FileError {
    #[error("failed to create {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, FileError>;
