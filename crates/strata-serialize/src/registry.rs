//! The serializer registry: a concurrent `TypeId`-keyed strategy map.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use strata_tree::Value;

use crate::error::{Result, SerializeError};

/// Strategy for mapping one application type to and from stored values.
pub trait ValueSerializer<T>: Send + Sync {
    /// Encode a typed value into a storable [`Value`].
    fn serialize(&self, value: &T) -> Result<Value>;

    /// Decode a stored value back into the type. `aux` is caller-supplied
    /// context passed through untouched, for serializers that need it (e.g.
    /// a prototype instance).
    fn deserialize(&self, raw: &Value, aux: Option<&dyn Any>) -> Result<T>;
}

/// A concurrent mapping from target type to its [`ValueSerializer`].
///
/// Lookups share a read lock and never block each other; registration takes
/// the write lock briefly. Later registrations for the same type replace
/// earlier ones.
#[derive(Default)]
pub struct SerializerRegistry {
    entries: RwLock<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry instance, for applications that prefer
    /// register-once-use-everywhere over explicit wiring.
    pub fn shared_global() -> Arc<SerializerRegistry> {
        static GLOBAL: OnceLock<Arc<SerializerRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(SerializerRegistry::new())).clone()
    }

    /// Register a serializer for `T`, replacing any earlier registration.
    pub fn register<T: 'static>(&self, serializer: Arc<dyn ValueSerializer<T>>) {
        self.entries
            .write()
            .expect("registry lock poisoned")
            .insert(TypeId::of::<T>(), Arc::new(serializer));
    }

    /// Exact-type lookup of the serializer registered for `T`.
    pub fn find<T: 'static>(&self) -> Option<Arc<dyn ValueSerializer<T>>> {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn ValueSerializer<T>>>())
            .cloned()
    }

    /// Returns `true` if a serializer for `T` is registered.
    pub fn is_registered<T: 'static>(&self) -> bool {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .contains_key(&TypeId::of::<T>())
    }

    fn require<T: 'static>(&self) -> Result<Arc<dyn ValueSerializer<T>>> {
        self.find::<T>().ok_or(SerializeError::NoSerializer {
            type_name: type_name::<T>(),
        })
    }

    /// Encode a typed value through its registered serializer.
    pub fn serialize<T: 'static>(&self, value: &T) -> Result<Value> {
        self.require::<T>()?.serialize(value)
    }

    /// Decode a stored value into `T` through its registered serializer.
    pub fn deserialize<T: 'static>(&self, raw: &Value) -> Result<T> {
        self.deserialize_with(raw, None)
    }

    /// Decode with caller-supplied auxiliary context.
    pub fn deserialize_with<T: 'static>(&self, raw: &Value, aux: Option<&dyn Any>) -> Result<T> {
        self.require::<T>()?.deserialize(raw, aux)
    }

    /// Encode a slice of typed values into a stored list.
    pub fn serialize_list<T: 'static>(&self, values: &[T]) -> Result<Value> {
        let serializer = self.require::<T>()?;
        let items = values
            .iter()
            .map(|v| serializer.serialize(v))
            .collect::<Result<Vec<_>>>()?;
        Ok(Value::List(items))
    }

    /// Decode every element of a stored list. Element failures propagate;
    /// a non-sequence value yields the empty list.
    pub fn deserialize_list<T: 'static>(&self, raw: &Value) -> Result<Vec<T>> {
        let serializer = self.require::<T>()?;
        match raw.as_list() {
            Some(items) => items
                .iter()
                .map(|v| serializer.deserialize(v, None))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Like [`deserialize_list`](Self::deserialize_list), but elements whose
    /// decode fails are dropped. A missing serializer still errors.
    pub fn deserialize_list_filtered<T: 'static>(&self, raw: &Value) -> Result<Vec<T>> {
        let serializer = self.require::<T>()?;
        Ok(raw
            .as_list()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| serializer.deserialize(v, None).ok())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Decode a stored branch's children into typed entries in branch order.
    /// Entry failures propagate; a non-branch value yields no entries.
    pub fn deserialize_map<T: 'static>(&self, raw: &Value) -> Result<Vec<(String, T)>> {
        let serializer = self.require::<T>()?;
        match raw.as_branch() {
            Some(branch) => branch
                .iter()
                .map(|(k, v)| Ok((k.to_string(), serializer.deserialize(v, None)?)))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    /// Like [`deserialize_map`](Self::deserialize_map), but entries whose
    /// decode fails are dropped.
    pub fn deserialize_map_filtered<T: 'static>(&self, raw: &Value) -> Result<Vec<(String, T)>> {
        let serializer = self.require::<T>()?;
        Ok(raw
            .as_branch()
            .map(|branch| {
                branch
                    .iter()
                    .filter_map(|(k, v)| {
                        serializer
                            .deserialize(v, None)
                            .ok()
                            .map(|t| (k.to_string(), t))
                    })
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.entries.read().expect("registry lock poisoned").len();
        f.debug_struct("SerializerRegistry")
            .field("registered", &len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_tree::{Branch, MapKind};

    #[derive(Debug, Clone, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    struct PointSerializer;

    impl ValueSerializer<Point> for PointSerializer {
        fn serialize(&self, value: &Point) -> Result<Value> {
            Ok(Value::Branch(Branch::from_entries(
                MapKind::Insertion,
                [
                    ("x".to_string(), Value::Int(value.x)),
                    ("y".to_string(), Value::Int(value.y)),
                ],
            )))
        }

        fn deserialize(&self, raw: &Value, aux: Option<&dyn Any>) -> Result<Point> {
            let branch = raw
                .as_branch()
                .ok_or_else(|| SerializeError::failed::<Point>("expected a branch"))?;
            let field = |name: &str| -> Result<i64> {
                match branch.get(name).map(|v| v.as_ref()) {
                    Some(Value::Int(i)) => Ok(*i),
                    _ => Err(SerializeError::failed::<Point>(format!("missing {name}"))),
                }
            };
            let offset = aux
                .and_then(|a| a.downcast_ref::<i64>())
                .copied()
                .unwrap_or(0);
            Ok(Point {
                x: field("x")? + offset,
                y: field("y")? + offset,
            })
        }
    }

    fn registry() -> SerializerRegistry {
        let registry = SerializerRegistry::new();
        registry.register::<Point>(Arc::new(PointSerializer));
        registry
    }

    #[test]
    fn serialize_deserialize_round_trip() {
        let registry = registry();
        let point = Point { x: 3, y: 4 };
        let raw = registry.serialize(&point).unwrap();
        assert_eq!(registry.deserialize::<Point>(&raw), Ok(point));
    }

    #[test]
    fn missing_serializer_is_a_loud_error() {
        let registry = SerializerRegistry::new();
        let err = registry.serialize(&Point { x: 0, y: 0 }).unwrap_err();
        assert!(matches!(err, SerializeError::NoSerializer { .. }));
        assert!(registry.find::<Point>().is_none());
        assert!(!registry.is_registered::<Point>());
    }

    #[test]
    fn aux_data_reaches_the_serializer() {
        let registry = registry();
        let raw = registry.serialize(&Point { x: 1, y: 2 }).unwrap();
        let offset: i64 = 10;
        let got = registry
            .deserialize_with::<Point>(&raw, Some(&offset))
            .unwrap();
        assert_eq!(got, Point { x: 11, y: 12 });
    }

    #[test]
    fn later_registration_replaces_earlier() {
        struct Negating;
        impl ValueSerializer<Point> for Negating {
            fn serialize(&self, value: &Point) -> Result<Value> {
                Ok(Value::Int(-(value.x + value.y)))
            }
            fn deserialize(&self, _raw: &Value, _aux: Option<&dyn Any>) -> Result<Point> {
                Ok(Point { x: 0, y: 0 })
            }
        }

        let registry = registry();
        registry.register::<Point>(Arc::new(Negating));
        let raw = registry.serialize(&Point { x: 2, y: 3 }).unwrap();
        assert_eq!(raw, Value::Int(-5));
    }

    #[test]
    fn list_bulk_strict_and_filtered() {
        let registry = registry();
        let good = registry.serialize(&Point { x: 1, y: 1 }).unwrap();
        let raw = Value::List(vec![good.clone(), Value::Int(7), good]);

        assert!(registry.deserialize_list::<Point>(&raw).is_err());
        let filtered = registry.deserialize_list_filtered::<Point>(&raw).unwrap();
        assert_eq!(filtered.len(), 2);

        // Non-sequence input yields the empty list, not an error.
        assert_eq!(registry.deserialize_list::<Point>(&Value::Int(1)), Ok(vec![]));
    }

    #[test]
    fn map_bulk_strict_and_filtered() {
        let registry = registry();
        let good = registry.serialize(&Point { x: 5, y: 6 }).unwrap();
        let raw = Value::Branch(Branch::from_entries(
            MapKind::Insertion,
            [
                ("ok".to_string(), good),
                ("broken".to_string(), Value::from("nope")),
            ],
        ));

        assert!(registry.deserialize_map::<Point>(&raw).is_err());
        let filtered = registry.deserialize_map_filtered::<Point>(&raw).unwrap();
        assert_eq!(filtered, vec![("ok".to_string(), Point { x: 5, y: 6 })]);
    }

    #[test]
    fn shared_global_returns_one_instance() {
        let a = SerializerRegistry::shared_global();
        let b = SerializerRegistry::shared_global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
