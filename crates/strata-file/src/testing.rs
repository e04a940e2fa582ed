//! Shared fixtures for the crate's tests: a minimal flat `key=value` codec
//! and store constructors over temporary files.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use strata_tree::{Branch, MapKind, Value};

use crate::codec::{DecodeError, EncodeError, FormatCodec};
use crate::lifecycle::{StoreFile, StoreOptions};

/// Flat `key=value` format: integers where they parse, strings otherwise.
/// A non-blank line without `=` is malformed.
pub(crate) struct LineCodec;

impl LineCodec {
    pub(crate) fn counting(decodes: Arc<AtomicUsize>) -> CountingCodec {
        CountingCodec { decodes }
    }
}

impl FormatCodec for LineCodec {
    fn format_name(&self) -> &'static str {
        "lines"
    }

    fn decode(&self, path: &Path, kind: MapKind) -> Result<Branch, DecodeError> {
        let text = fs::read_to_string(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut branch = Branch::new(kind);
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            let (key, value) = line.split_once('=').ok_or_else(|| DecodeError::Malformed {
                format: "lines",
                path: path.to_path_buf(),
                message: format!("line without '=': {line:?}"),
            })?;
            let value = match value.trim().parse::<i64>() {
                Ok(n) => Value::Int(n),
                Err(_) => Value::from(value.trim()),
            };
            branch.insert(key.trim().to_string(), Arc::new(value));
        }
        Ok(branch)
    }

    fn encode(&self, tree: &Branch, path: &Path) -> Result<(), EncodeError> {
        let mut out = String::new();
        for (key, value) in tree.iter() {
            out.push_str(key);
            out.push('=');
            out.push_str(&value.to_string());
            out.push('\n');
        }
        fs::write(path, out).map_err(|source| EncodeError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// [`LineCodec`] that counts decode calls, for reload-policy assertions.
pub(crate) struct CountingCodec {
    decodes: Arc<AtomicUsize>,
}

impl FormatCodec for CountingCodec {
    fn format_name(&self) -> &'static str {
        "lines"
    }

    fn decode(&self, path: &Path, kind: MapKind) -> Result<Branch, DecodeError> {
        self.decodes.fetch_add(1, Ordering::SeqCst);
        LineCodec.decode(path, kind)
    }

    fn encode(&self, tree: &Branch, path: &Path) -> Result<(), EncodeError> {
        LineCodec.encode(tree, path)
    }
}

pub(crate) fn store_at(path: &Path, options: StoreOptions) -> StoreFile {
    StoreFile::open(path, Arc::new(LineCodec), options).expect("open store")
}

pub(crate) fn corrupt(path: &Path) {
    fs::write(path, "<< not a key value line >>\n").expect("corrupt file");
}

pub(crate) fn read_back(path: &Path) -> String {
    fs::read_to_string(path).expect("read file")
}
