//! TOML persistence via the `toml` crate.

use std::fs;
use std::path::Path;

use serde::de::DeserializeSeed;
use strata_file::codec::{DecodeError, EncodeError, FormatCodec};
use strata_tree::{Branch, BranchSeed, MapKind};

/// TOML with the document's top-level table as the root branch.
///
/// TOML has no null; encoding a tree containing a null value fails with
/// [`EncodeError::Unrepresentable`].
#[derive(Clone, Copy, Debug, Default)]
pub struct TomlCodec;

impl FormatCodec for TomlCodec {
    fn format_name(&self) -> &'static str {
        "toml"
    }

    fn decode(&self, path: &Path, kind: MapKind) -> Result<Branch, DecodeError> {
        let text = fs::read_to_string(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Branch::new(kind));
        }
        BranchSeed::new(kind)
            .deserialize(toml::Deserializer::new(&text))
            .map_err(|err| DecodeError::Malformed {
                format: "toml",
                path: path.to_path_buf(),
                message: err.to_string(),
            })
    }

    fn encode(&self, tree: &Branch, path: &Path) -> Result<(), EncodeError> {
        let text = toml::to_string_pretty(tree).map_err(|err| EncodeError::Unrepresentable {
            format: "toml",
            message: err.to_string(),
        })?;
        fs::write(path, text).map_err(|source| EncodeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
