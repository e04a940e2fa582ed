//! The typed access facade shared by whole files and sections.

use std::any::Any;
use std::collections::BTreeSet;
use std::sync::Arc;

use strata_coerce::{
    coerce, enum_from_value, enum_from_value_mapped, enum_list_filtered, enum_list_from_value,
    list_filtered, map_filtered, map_of, CoerceError, EnumValue, FromValue,
};
use strata_serialize::{SerializeError, SerializerRegistry};
use strata_tree::{path as key_path, Value};

/// Typed configuration access over one backing store (or a scoped view of
/// one).
///
/// Implementors supply the segment-slice core; everything else is provided
/// in terms of it. String-path overloads split on the store's separator and
/// delegate, so the two call styles are always equivalent. The facade holds
/// no state of its own.
pub trait DataStorage {
    // -- required core -----------------------------------------------------

    fn separator(&self) -> &str;

    /// Registry consulted by the serializable accessors.
    fn registry(&self) -> Arc<SerializerRegistry>;

    fn get_raw(&self, segments: &[String]) -> Option<Value>;
    fn set_raw(&self, segments: &[String], value: Value);
    fn remove_raw(&self, segments: &[String]);
    fn contains_raw(&self, segments: &[String]) -> bool;
    fn single_layer_keys_raw(&self, segments: &[String]) -> BTreeSet<String>;
    fn keys_raw(&self, segments: &[String]) -> BTreeSet<String>;
    fn put_all_raw(&self, entries: Vec<(Vec<String>, Value)>);
    fn remove_all_raw(&self, paths: Vec<Vec<String>>);
    fn add_defaults_raw(&self, entries: Vec<(Vec<String>, Value)>);

    // -- string-path surface -----------------------------------------------

    fn split(&self, path: &str) -> Vec<String> {
        key_path::split(path, self.separator())
    }

    /// Raw value at the path, untyped and uncoerced.
    fn get(&self, path: &str) -> Option<Value> {
        self.get_raw(&self.split(path))
    }

    /// Set the value at the path and persist.
    fn set(&self, path: &str, value: impl Into<Value>)
    where
        Self: Sized,
    {
        self.set_raw(&self.split(path), value.into());
    }

    /// Remove the path (subtree included) and persist.
    fn remove(&self, path: &str) {
        self.remove_raw(&self.split(path));
    }

    fn contains(&self, path: &str) -> bool {
        self.contains_raw(&self.split(path))
    }

    /// Every fully qualified leaf path in the store.
    fn keys(&self) -> BTreeSet<String> {
        self.keys_raw(&[])
    }

    /// Fully qualified leaf paths under the given branch, relative to it.
    fn keys_under(&self, path: &str) -> BTreeSet<String> {
        self.keys_raw(&self.split(path))
    }

    /// Direct child keys of the root branch.
    fn single_layer_keys(&self) -> BTreeSet<String> {
        self.single_layer_keys_raw(&[])
    }

    /// Direct child keys of the branch at the path.
    fn single_layer_keys_under(&self, path: &str) -> BTreeSet<String> {
        self.single_layer_keys_raw(&self.split(path))
    }

    /// Number of leaves in the store.
    fn leaf_count(&self) -> usize {
        self.keys_raw(&[]).len()
    }

    /// Number of leaves under the branch at the path.
    fn leaf_count_under(&self, path: &str) -> usize {
        self.keys_raw(&self.split(path)).len()
    }

    /// Insert many entries with one persist.
    fn put_all<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, Value)>,
        Self: Sized,
    {
        let entries = entries
            .into_iter()
            .map(|(path, value)| (self.split(&path), value))
            .collect();
        self.put_all_raw(entries);
    }

    /// Remove many paths with one persist.
    fn remove_all<'a, I>(&self, paths: I)
    where
        I: IntoIterator<Item = &'a str>,
        Self: Sized,
    {
        let paths = paths.into_iter().map(|path| self.split(path)).collect();
        self.remove_all_raw(paths);
    }

    /// Insert only the entries whose path is absent, persisting once if
    /// anything was added.
    fn add_defaults<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (String, Value)>,
        Self: Sized,
    {
        let entries = entries
            .into_iter()
            .map(|(path, value)| (self.split(&path), value))
            .collect();
        self.add_defaults_raw(entries);
    }

    // -- typed surface -----------------------------------------------------

    /// Typed lookup; `Ok(None)` when the path is absent.
    fn find<T: FromValue>(&self, path: &str) -> Result<Option<T>, CoerceError>
    where
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => coerce::<T>(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Typed lookup falling back to the supplied default when absent. The
    /// default also selects the coercion rule.
    fn get_or_default<T: FromValue>(&self, path: &str, default: T) -> Result<T, CoerceError>
    where
        Self: Sized,
    {
        Ok(self.find(path)?.unwrap_or(default))
    }

    /// Typed lookup that writes and returns the default when the path is
    /// absent; an existing value is never overwritten.
    fn get_or_set_default<T>(&self, path: &str, default: T) -> Result<T, CoerceError>
    where
        T: FromValue + Into<Value> + Clone,
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => coerce(&raw),
            None => {
                self.set_raw(&self.split(path), default.clone().into());
                Ok(default)
            }
        }
    }

    /// Write the value only if the path is absent.
    fn set_default(&self, path: &str, value: impl Into<Value>)
    where
        Self: Sized,
    {
        if !self.contains(path) {
            self.set(path, value);
        }
    }

    /// Typed list; absent path or non-sequence value yields the empty list,
    /// element coercion failures propagate.
    fn get_list<T: FromValue>(&self, path: &str) -> Result<Vec<T>, CoerceError>
    where
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => coerce::<Vec<T>>(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// Typed list with failing elements dropped.
    fn get_list_filtered<T: FromValue>(&self, path: &str) -> Vec<T>
    where
        Self: Sized,
    {
        self.get(path)
            .map(|raw| list_filtered(&raw))
            .unwrap_or_default()
    }

    /// Typed entries of the branch at the path, in branch order.
    fn get_map<T: FromValue>(&self, path: &str) -> Result<Vec<(String, T)>, CoerceError>
    where
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => map_of(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// Typed branch entries with failing values dropped.
    fn get_map_filtered<T: FromValue>(&self, path: &str) -> Vec<(String, T)>
    where
        Self: Sized,
    {
        self.get(path)
            .map(|raw| map_filtered(&raw))
            .unwrap_or_default()
    }

    /// Enum variant resolved by exact stored name.
    fn get_enum<E: EnumValue>(&self, path: &str) -> Result<Option<E>, CoerceError>
    where
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => enum_from_value(&raw).map(Some),
            None => Ok(None),
        }
    }

    /// Enum variant resolved after applying a case-mapping hook.
    fn get_enum_mapped<E, F>(&self, path: &str, mapper: F) -> Result<Option<E>, CoerceError>
    where
        E: EnumValue,
        F: Fn(&str) -> String,
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => enum_from_value_mapped(&raw, mapper).map(Some),
            None => Ok(None),
        }
    }

    /// List of enum variants; unresolvable elements propagate.
    fn get_enum_list<E: EnumValue>(&self, path: &str) -> Result<Vec<E>, CoerceError>
    where
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => enum_list_from_value(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// List of enum variants with unresolvable elements dropped.
    fn get_enum_list_filtered<E: EnumValue>(&self, path: &str) -> Vec<E>
    where
        Self: Sized,
    {
        self.get(path)
            .map(|raw| enum_list_filtered(&raw))
            .unwrap_or_default()
    }

    // -- serializable surface ----------------------------------------------

    /// Decode the value at the path through the registered serializer.
    fn get_serializable<T: 'static>(&self, path: &str) -> Result<Option<T>, SerializeError>
    where
        Self: Sized,
    {
        self.get_serializable_with(path, None)
    }

    /// Decode with caller-supplied auxiliary context.
    fn get_serializable_with<T: 'static>(
        &self,
        path: &str,
        aux: Option<&dyn Any>,
    ) -> Result<Option<T>, SerializeError>
    where
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => self.registry().deserialize_with(&raw, aux).map(Some),
            None => Ok(None),
        }
    }

    /// Encode the value through the registered serializer and store it.
    fn set_serializable<T: 'static>(&self, path: &str, value: &T) -> Result<(), SerializeError>
    where
        Self: Sized,
    {
        let raw = self.registry().serialize(value)?;
        self.set_raw(&self.split(path), raw);
        Ok(())
    }

    /// Decode the value at the path, writing and returning the default when
    /// absent.
    fn get_or_set_serializable<T>(&self, path: &str, default: T) -> Result<T, SerializeError>
    where
        T: 'static + Clone,
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => self.registry().deserialize(&raw),
            None => {
                self.set_serializable(path, &default)?;
                Ok(default)
            }
        }
    }

    /// Decode a stored list through the registered element serializer.
    fn get_serializable_list<T: 'static>(&self, path: &str) -> Result<Vec<T>, SerializeError>
    where
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => self.registry().deserialize_list(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// Decode a stored list, dropping elements that fail. A missing element
    /// serializer still errors.
    fn get_serializable_list_filtered<T: 'static>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, SerializeError>
    where
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => self.registry().deserialize_list_filtered(&raw),
            None => Ok(Vec::new()),
        }
    }

    /// Decode a stored branch's entries through the registered serializer.
    fn get_serializable_map<T: 'static>(
        &self,
        path: &str,
    ) -> Result<Vec<(String, T)>, SerializeError>
    where
        Self: Sized,
    {
        match self.get(path) {
            Some(raw) => self.registry().deserialize_map(&raw),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::{StoreFile, StoreOptions};
    use crate::settings::ReloadPolicy;
    use crate::testing::store_at;
    use strata_serialize::ValueSerializer;
    use strata_tree::{Branch, MapKind};

    // Manual reload keeps typed values in memory untouched by the flat
    // test codec's round-trip.
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
    fn find_and_get_or_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        file.set("server.port", 8080i64);
        assert_eq!(file.find::<i64>("server.port"), Ok(Some(8080)));
        assert_eq!(file.find::<i64>("server.missing"), Ok(None));
        assert_eq!(file.get_or_default("server.port", 0i64), Ok(8080));
        assert_eq!(file.get_or_default("server.missing", 7i64), Ok(7));
    }

    #[test]
    fn coercion_errors_reach_the_caller() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        file.set("name", "not a number");
        assert!(file.find::<i64>("name").is_err());
    }

    #[test]
    fn get_or_set_default_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        assert_eq!(file.get_or_set_default("timeout", 30i64), Ok(30));
        assert_eq!(file.get("timeout"), Some(Value::Int(30)));

        // An external write wins; the default never overwrites.
        file.set("timeout", 99i64);
        assert_eq!(file.get_or_set_default("timeout", 30i64), Ok(99));
        assert_eq!(file.get("timeout"), Some(Value::Int(99)));
    }

    #[test]
    fn set_default_only_fills_gaps() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        file.set("present", 1i64);
        file.set_default("present", 2i64);
        file.set_default("absent", 3i64);

        assert_eq!(file.get("present"), Some(Value::Int(1)));
        assert_eq!(file.get("absent"), Some(Value::Int(3)));
    }

    #[test]
    fn list_accessors_strict_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        file.set("mixed", Value::List(vec![Value::Int(1), Value::from("x"), Value::Int(3)]));
        assert!(file.get_list::<i64>("mixed").is_err());
        assert_eq!(file.get_list_filtered::<i64>("mixed"), vec![1, 3]);
        assert_eq!(file.get_list::<i64>("absent"), Ok(vec![]));
    }

    #[test]
    fn map_accessors_read_branches() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        file.set("limits.low", 1i64);
        file.set("limits.high", 10i64);

        let entries = file.get_map::<i64>("limits").unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries.contains(&("low".to_string(), 1)));
        assert!(entries.contains(&("high".to_string(), 10)));
        assert_eq!(file.get_map::<i64>("absent"), Ok(vec![]));
    }

    #[test]
    fn bulk_operations() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        file.put_all([
            ("a.b".to_string(), Value::Int(1)),
            ("a.c".to_string(), Value::Int(2)),
            ("d".to_string(), Value::Int(3)),
        ]);
        let expected: BTreeSet<String> =
            ["a.b", "a.c", "d"].iter().map(|s| s.to_string()).collect();
        assert_eq!(file.keys(), expected);

        file.add_defaults([
            ("a.b".to_string(), Value::Int(99)),
            ("e".to_string(), Value::Int(4)),
        ]);
        assert_eq!(file.get("a.b"), Some(Value::Int(1)));
        assert_eq!(file.get("e"), Some(Value::Int(4)));

        file.remove_all(["a.b", "a.c"]);
        assert!(!file.contains("a"));
        assert_eq!(file.leaf_count(), 2);
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Mode {
        Fast,
        Safe,
    }

    impl EnumValue for Mode {
        const NAME: &'static str = "Mode";

        fn from_variant_name(name: &str) -> Option<Self> {
            match name {
                "FAST" => Some(Mode::Fast),
                "SAFE" => Some(Mode::Safe),
                _ => None,
            }
        }

        fn variant_name(&self) -> &'static str {
            match self {
                Mode::Fast => "FAST",
                Mode::Safe => "SAFE",
            }
        }
    }

    #[test]
    fn enum_accessors() {
        let dir = tempfile::tempdir().unwrap();
        let file = store(&dir);

        file.set("mode", "SAFE");
        assert_eq!(file.get_enum::<Mode>("mode"), Ok(Some(Mode::Safe)));
        assert_eq!(file.get_enum::<Mode>("absent"), Ok(None));

        file.set("mode-lower", "fast");
        assert!(file.get_enum::<Mode>("mode-lower").is_err());
        assert_eq!(
            file.get_enum_mapped::<Mode, _>("mode-lower", |s| s.to_uppercase()),
            Ok(Some(Mode::Fast))
        );

        file.set("modes", Value::from(vec!["FAST", "bogus", "SAFE"]));
        assert!(file.get_enum_list::<Mode>("modes").is_err());
        assert_eq!(
            file.get_enum_list_filtered::<Mode>("modes"),
            vec![Mode::Fast, Mode::Safe]
        );
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Endpoint {
        host: String,
        port: i64,
    }

    struct EndpointSerializer;

    impl ValueSerializer<Endpoint> for EndpointSerializer {
        fn serialize(&self, value: &Endpoint) -> strata_serialize::Result<Value> {
            Ok(Value::Branch(Branch::from_entries(
                MapKind::Insertion,
                [
                    ("host".to_string(), Value::from(value.host.as_str())),
                    ("port".to_string(), Value::Int(value.port)),
                ],
            )))
        }

        fn deserialize(
            &self,
            raw: &Value,
            _aux: Option<&dyn Any>,
        ) -> strata_serialize::Result<Endpoint> {
            let branch = raw
                .as_branch()
                .ok_or_else(|| SerializeError::failed::<Endpoint>("expected a branch"))?;
            let host = branch
                .get("host")
                .and_then(|v| v.as_str().map(str::to_string))
                .ok_or_else(|| SerializeError::failed::<Endpoint>("missing host"))?;
            let port = match branch.get("port").map(|v| v.as_ref()) {
                Some(Value::Int(p)) => *p,
                _ => return Err(SerializeError::failed::<Endpoint>("missing port")),
            };
            Ok(Endpoint { host, port })
        }
    }

    fn store_with_registry(dir: &tempfile::TempDir) -> StoreFile {
        let registry = Arc::new(SerializerRegistry::new());
        registry.register::<Endpoint>(Arc::new(EndpointSerializer));
        store_at(
            &dir.path().join("store.lines"),
            StoreOptions {
                reload_policy: ReloadPolicy::Manual,
                registry,
                ..StoreOptions::default()
            },
        )
    }

    #[test]
    fn serializable_round_trip_through_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let file = store_with_registry(&dir);

        let endpoint = Endpoint {
            host: "localhost".to_string(),
            port: 9000,
        };
        file.set_serializable("upstream", &endpoint).unwrap();
        assert_eq!(
            file.get_serializable::<Endpoint>("upstream"),
            Ok(Some(endpoint))
        );
        assert_eq!(file.get_serializable::<Endpoint>("absent"), Ok(None));
    }

    #[test]
    fn get_or_set_serializable_behaves_like_typed_variant() {
        let dir = tempfile::tempdir().unwrap();
        let file = store_with_registry(&dir);

        let default = Endpoint {
            host: "fallback".to_string(),
            port: 1,
        };
        assert_eq!(
            file.get_or_set_serializable("upstream", default.clone()),
            Ok(default.clone())
        );
        // Now present; the default no longer applies.
        assert_eq!(
            file.get_or_set_serializable(
                "upstream",
                Endpoint {
                    host: "other".to_string(),
                    port: 2
                }
            ),
            Ok(default)
        );
    }

    #[test]
    fn missing_serializer_errors_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let file = store_at(
            &dir.path().join("store.lines"),
            StoreOptions {
                reload_policy: ReloadPolicy::Manual,
                registry: Arc::new(SerializerRegistry::new()),
                ..StoreOptions::default()
            },
        );

        file.set("upstream.host", "x");
        assert!(matches!(
            file.get_serializable::<Endpoint>("upstream"),
            Err(SerializeError::NoSerializer { .. })
        ));
    }

    #[test]
    fn serializable_list_accessors() {
        let dir = tempfile::tempdir().unwrap();
        let file = store_with_registry(&dir);

        let a = Endpoint {
            host: "a".to_string(),
            port: 1,
        };
        let b = Endpoint {
            host: "b".to_string(),
            port: 2,
        };
        let raw = file.registry().serialize_list(&[a.clone(), b.clone()]).unwrap();
        file.set("endpoints", raw);

        assert_eq!(
            file.get_serializable_list::<Endpoint>("endpoints"),
            Ok(vec![a.clone(), b.clone()])
        );

        file.set(
            "broken",
            Value::List(vec![
                file.registry().serialize(&a).unwrap(),
                Value::Int(42),
            ]),
        );
        assert!(file.get_serializable_list::<Endpoint>("broken").is_err());
        assert_eq!(
            file.get_serializable_list_filtered::<Endpoint>("broken"),
            Ok(vec![a])
        );
    }
}
