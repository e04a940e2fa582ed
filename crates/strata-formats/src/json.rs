//! JSON persistence via `serde_json`.

use std::fs;
use std::path::Path;

use serde::de::DeserializeSeed;
use strata_file::codec::{DecodeError, EncodeError, FormatCodec};
use strata_tree::{Branch, BranchSeed, MapKind};

/// Pretty-printed JSON with a top-level object as the root branch.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl FormatCodec for JsonCodec {
    fn format_name(&self) -> &'static str {
        "json"
    }

    fn decode(&self, path: &Path, kind: MapKind) -> Result<Branch, DecodeError> {
        let text = fs::read_to_string(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if text.trim().is_empty() {
            return Ok(Branch::new(kind));
        }
        let mut de = serde_json::Deserializer::from_str(&text);
        BranchSeed::new(kind)
            .deserialize(&mut de)
            .map_err(|err| DecodeError::Malformed {
                format: "json",
                path: path.to_path_buf(),
                message: err.to_string(),
            })
    }

    fn encode(&self, tree: &Branch, path: &Path) -> Result<(), EncodeError> {
        let text =
            serde_json::to_string_pretty(tree).map_err(|err| EncodeError::Unrepresentable {
                format: "json",
                message: err.to_string(),
            })?;
        fs::write(path, text).map_err(|source| EncodeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
