//! Key-path splitting and joining.
//!
//! A key path addresses a node in the tree as segments joined by the store's
//! separator string. Splitting is literal: the separator is matched verbatim,
//! never interpreted as a pattern, and empty segments are preserved so that
//! splitting and joining round-trip exactly.

/// Split a key path into segments on the literal separator.
///
/// An empty separator yields the whole path as a single segment.
pub fn split(path: &str, separator: &str) -> Vec<String> {
    if separator.is_empty() {
        return vec![path.to_string()];
    }
    path.split(separator).map(str::to_string).collect()
}

/// Join segments back into a key path with the separator.
pub fn join(segments: &[String], separator: &str) -> String {
    segments.join(separator)
}

/// Concatenate two segment slices into one owned path.
pub fn concat(first: &[String], second: &[String]) -> Vec<String> {
    let mut out = Vec::with_capacity(first.len() + second.len());
    out.extend_from_slice(first);
    out.extend_from_slice(second);
    out
}
