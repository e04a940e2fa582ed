//! The external format interface: two operations a concrete format module
//! must implement.

use std::path::{Path, PathBuf};

use strata_tree::{Branch, MapKind};
use thiserror::Error;

/// Failure to parse persisted content into a tree.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed {format} in {path}: {message}")]
    Malformed {
        format: &'static str,
        path: PathBuf,
        message: String,
    },
}

/// Failure to write the tree back to persisted content.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{format} cannot represent the tree: {message}")]
    Unrepresentable {
        format: &'static str,
        message: String,
    },
}

/// A persisted format.
///
/// # Invariants
///
/// - `decode` of an empty (zero-byte) file yields an empty branch, because
///   create-on-first-use leaves one behind.
/// - `decode` builds branches with the requested [`MapKind`] so the store's
///   ordering mode survives a reload.
/// - `encode` followed by `decode` reproduces the tree's branch/leaf shape.
///   Formats may keep out-of-band metadata (comments and the like); that is
///   entirely their own concern.
pub trait FormatCodec: Send + Sync {
    /// Short format name for diagnostics ("json", "toml", ...).
    fn format_name(&self) -> &'static str;

    /// Parse the file into a fresh tree snapshot.
    fn decode(&self, path: &Path, kind: MapKind) -> Result<Branch, DecodeError>;

    /// Serialize the tree over the file's current content.
    fn encode(&self, tree: &Branch, path: &Path) -> Result<(), EncodeError>;
}
