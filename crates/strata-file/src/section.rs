//! Path-prefix scoped views over a store file.

use std::collections::BTreeSet;
use std::sync::Arc;

use strata_serialize::SerializerRegistry;
use strata_tree::{path as key_path, Value};

use crate::lifecycle::StoreFile;
use crate::storage::DataStorage;

/// A view of one [`StoreFile`] rooted at a fixed path prefix.
///
/// Behaves like an independent store over that subtree: every path is
/// concatenated with the prefix before reaching the file, and all lifecycle
/// behavior (reload, error policy, persistence) is the owning file's.
#[derive(Clone, Debug)]
pub struct Section<'a> {
    file: &'a StoreFile,
    prefix: Vec<String>,
}

impl<'a> Section<'a> {
    pub(crate) fn new(file: &'a StoreFile, prefix: Vec<String>) -> Self {
        Self { file, prefix }
    }

    /// The prefix segments this view is rooted at.
    pub fn prefix(&self) -> &[String] {
        &self.prefix
    }

    /// The file this view reads and writes through.
    pub fn file(&self) -> &'a StoreFile {
        self.file
    }

    /// A further-nested view; prefixes concatenate.
    pub fn section(&self, path: &str) -> Section<'a> {
        let suffix = key_path::split(path, DataStorage::separator(self.file));
        Section {
            file: self.file,
            prefix: key_path::concat(&self.prefix, &suffix),
        }
    }

    fn scoped(&self, segments: &[String]) -> Vec<String> {
        key_path::concat(&self.prefix, segments)
    }
}

impl DataStorage for Section<'_> {
    fn separator(&self) -> &str {
        DataStorage::separator(self.file)
    }

    fn registry(&self) -> Arc<SerializerRegistry> {
        self.file.registry()
    }

    fn get_raw(&self, segments: &[String]) -> Option<Value> {
        self.file.get_raw(&self.scoped(segments))
    }

    fn set_raw(&self, segments: &[String], value: Value) {
        self.file.set_raw(&self.scoped(segments), value);
    }

    fn remove_raw(&self, segments: &[String]) {
        self.file.remove_raw(&self.scoped(segments));
    }

    fn contains_raw(&self, segments: &[String]) -> bool {
        self.file.contains_raw(&self.scoped(segments))
    }

    fn single_layer_keys_raw(&self, segments: &[String]) -> BTreeSet<String> {
        self.file.single_layer_keys_raw(&self.scoped(segments))
    }

    fn keys_raw(&self, segments: &[String]) -> BTreeSet<String> {
        self.file.keys_raw(&self.scoped(segments))
    }

    fn put_all_raw(&self, entries: Vec<(Vec<String>, Value)>) {
        let entries = entries
            .into_iter()
            .map(|(segments, value)| (self.scoped(&segments), value))
            .collect();
        self.file.put_all_raw(entries);
    }

    fn remove_all_raw(&self, paths: Vec<Vec<String>>) {
        let paths = paths
            .into_iter()
            .map(|segments| self.scoped(&segments))
            .collect();
        self.file.remove_all_raw(paths);
    }

    fn add_defaults_raw(&self, entries: Vec<(Vec<String>, Value)>) {
        let entries = entries
            .into_iter()
            .map(|(segments, value)| (self.scoped(&segments), value))
            .collect();
        self.file.add_defaults_raw(entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::StoreOptions;
    use crate::settings::ReloadPolicy;
    use crate::testing::store_at;

    fn store(dir: &tempfile::TempDir) -> StoreFile {
        store_at(
            &dir.path().join("store.lines"),
            StoreOptions {
                reload_policy: ReloadPolicy::Manual,
                ..StoreOptions::default()
            },
        )
    }

    #[test]
    fn writes_land_under_the_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        let server = file.section("server");
        server.set("port", 8080i64);

        assert_eq!(file.get("server.port"), Some(Value::Int(8080)));
        assert_eq!(server.get("port"), Some(Value::Int(8080)));
    }

    #[test]
    fn reads_are_scoped_to_the_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        file.set("server.port", 8080i64);
        file.set("client.port", 9090i64);

        let server = file.section("server");
        assert_eq!(server.get("port"), Some(Value::Int(8080)));
        assert!(!server.contains("client.port"));

        let keys: BTreeSet<String> = ["port".to_string()].into_iter().collect();
        assert_eq!(server.keys(), keys);
        assert_eq!(server.single_layer_keys(), keys);
        assert_eq!(server.leaf_count(), 1);
    }

    #[test]
    fn nested_sections_concatenate_prefixes() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        let inner = file.section("outer").section("inner");
        assert_eq!(inner.prefix(), ["outer", "inner"]);

        inner.set("leaf", 1i64);
        assert_eq!(file.get("outer.inner.leaf"), Some(Value::Int(1)));
    }

    #[test]
    fn typed_surface_works_through_a_section() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        let server = file.section("server");
        assert_eq!(server.get_or_set_default("timeout", 30i64), Ok(30));
        assert_eq!(file.find::<i64>("server.timeout"), Ok(Some(30)));

        server.remove("timeout");
        assert!(!file.contains("server"));
    }

    #[test]
    fn bulk_operations_stay_scoped() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        let section = file.section("scope");
        section.put_all([
            ("a".to_string(), Value::Int(1)),
            ("b".to_string(), Value::Int(2)),
        ]);
        assert_eq!(file.get("scope.a"), Some(Value::Int(1)));

        section.add_defaults([("a".to_string(), Value::Int(99))]);
        assert_eq!(file.get("scope.a"), Some(Value::Int(1)));

        section.remove_all(["a", "b"]);
        assert!(!file.contains("scope"));
    }
}
