//! The configuration value model: scalars, lists, and branches.

use std::fmt;
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Ordering mode of a branch's children, fixed when the owning store is
/// constructed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MapKind {
    /// Children keep the order in which they were inserted.
    Insertion,
    /// No insertion-order guarantee; children are kept sorted by key.
    #[default]
    Unordered,
}

/// A string-keyed mapping of child values.
///
/// Children are held behind `Arc` so that copy-on-write rebuilds of ancestor
/// branches share untouched subtrees instead of deep-cloning them. Both
/// ordering modes use the same entry-list representation; only the insert
/// position differs.
#[derive(Clone, Debug, PartialEq)]
pub struct Branch {
    kind: MapKind,
    entries: Vec<(String, Arc<Value>)>,
}

impl Branch {
    /// Create an empty branch with the given ordering mode.
    pub fn new(kind: MapKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
        }
    }

    /// Build a branch from key/value pairs, applying the mode's insert rule
    /// per entry (later duplicates replace earlier ones).
    pub fn from_entries<I, V>(kind: MapKind, entries: I) -> Self
    where
        I: IntoIterator<Item = (String, V)>,
        V: Into<Value>,
    {
        let mut branch = Self::new(kind);
        for (key, value) in entries {
            branch.insert(key, Arc::new(value.into()));
        }
        branch
    }

    /// The ordering mode this branch was created with.
    pub fn kind(&self) -> MapKind {
        self.kind
    }

    /// Number of direct children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the branch has no children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &str) -> Result<usize, usize> {
        match self.kind {
            MapKind::Unordered => self
                .entries
                .binary_search_by(|(k, _)| k.as_str().cmp(key)),
            MapKind::Insertion => self
                .entries
                .iter()
                .position(|(k, _)| k == key)
                .ok_or(self.entries.len()),
        }
    }

    /// Look up a direct child by key.
    pub fn get(&self, key: &str) -> Option<&Arc<Value>> {
        self.position(key).ok().map(|i| &self.entries[i].1)
    }

    /// Returns `true` if a direct child with this key exists.
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    /// Insert or replace a child. Replacement keeps the child's position;
    /// new keys go to the mode-defined position (append or sorted slot).
    /// Returns the previous value if the key existed.
    pub fn insert(&mut self, key: String, value: Arc<Value>) -> Option<Arc<Value>> {
        match self.position(&key) {
            Ok(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            Err(i) => {
                self.entries.insert(i, (key, value));
                None
            }
        }
    }

    /// Remove a child by key, returning it if present.
    pub fn remove(&mut self, key: &str) -> Option<Arc<Value>> {
        self.position(key).ok().map(|i| self.entries.remove(i).1)
    }

    /// Iterate over direct children in branch order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<Value>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterate over direct child keys in branch order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }
}

/// A node in the configuration tree: a scalar, a list, or a nested branch.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    List(Vec<Value>),
    Branch(Branch),
}

impl Value {
    /// Short name of the value's shape, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Branch(_) => "branch",
        }
    }

    /// Returns `true` if this value is a branch.
    pub fn is_branch(&self) -> bool {
        matches!(self, Value::Branch(_))
    }

    pub fn as_branch(&self) -> Option<&Branch> {
        match self {
            Value::Branch(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::String(s) => f.write_str(s),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Branch(branch) => {
                f.write_str("{")?;
                for (i, (key, value)) in branch.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i8> for Value {
    fn from(v: i8) -> Self {
        Value::Int(v.into())
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int(v.into())
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v.into())
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Value::Int(v.into())
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Value::Int(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Int(v.into())
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Branch> for Value {
    fn from(v: Branch) -> Self {
        Value::Branch(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::Float(v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Branch(branch) => branch.serialize(serializer),
        }
    }
}

impl Serialize for Branch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value.as_ref())?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_mode_keeps_insert_order() {
        let mut branch = Branch::new(MapKind::Insertion);
        branch.insert("zebra".into(), Arc::new(Value::Int(1)));
        branch.insert("apple".into(), Arc::new(Value::Int(2)));
        branch.insert("mango".into(), Arc::new(Value::Int(3)));

        let keys: Vec<&str> = branch.keys().collect();
        assert_eq!(keys, vec!["zebra", "apple", "mango"]);
    }

    #[test]
    fn unordered_mode_sorts_by_key() {
        let mut branch = Branch::new(MapKind::Unordered);
        branch.insert("zebra".into(), Arc::new(Value::Int(1)));
        branch.insert("apple".into(), Arc::new(Value::Int(2)));
        branch.insert("mango".into(), Arc::new(Value::Int(3)));

        let keys: Vec<&str> = branch.keys().collect();
        assert_eq!(keys, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn replace_keeps_position() {
        let mut branch = Branch::new(MapKind::Insertion);
        branch.insert("first".into(), Arc::new(Value::Int(1)));
        branch.insert("second".into(), Arc::new(Value::Int(2)));

        let old = branch.insert("first".into(), Arc::new(Value::Int(9)));
        assert_eq!(old.as_deref(), Some(&Value::Int(1)));

        let keys: Vec<&str> = branch.keys().collect();
        assert_eq!(keys, vec!["first", "second"]);
        assert_eq!(branch.get("first").unwrap().as_ref(), &Value::Int(9));
    }

    #[test]
    fn remove_returns_previous_value() {
        let mut branch = Branch::new(MapKind::Unordered);
        branch.insert("key".into(), Arc::new(Value::Bool(true)));
        assert_eq!(branch.remove("key").as_deref(), Some(&Value::Bool(true)));
        assert!(branch.remove("key").is_none());
        assert!(branch.is_empty());
    }

    #[test]
    fn display_renders_scalars_and_collections() {
        assert_eq!(Value::Int(42).to_string(), "42");
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::String("hi".into()).to_string(), "hi");
        let list = Value::from(vec![1i64, 2, 3]);
        assert_eq!(list.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn serialize_branch_to_json() {
        let branch = Branch::from_entries(
            MapKind::Insertion,
            [
                ("b".to_string(), Value::Int(1)),
                ("a".to_string(), Value::String("x".into())),
            ],
        );
        let json = serde_json::to_string(&branch).unwrap();
        assert_eq!(json, r#"{"b":1,"a":"x"}"#);
    }
}
