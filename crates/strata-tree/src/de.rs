//! Seeded deserialization into [`Value`] and [`Branch`].
//!
//! A plain `Deserialize` impl cannot know which [`MapKind`] the owning store
//! uses, so decoding goes through [`DeserializeSeed`] types that carry the
//! mode down the tree. With `MapKind::Insertion` the branches come out in
//! document encounter order.

use std::fmt;
use std::sync::Arc;

use serde::de::{DeserializeSeed, Deserializer, Error, MapAccess, SeqAccess, Visitor};

use crate::value::{Branch, MapKind, Value};

/// Seed that decodes any value, building nested branches with the given mode.
#[derive(Clone, Copy, Debug)]
pub struct ValueSeed {
    kind: MapKind,
}

impl ValueSeed {
    pub fn new(kind: MapKind) -> Self {
        Self { kind }
    }
}

impl<'de> DeserializeSeed<'de> for ValueSeed {
    type Value = Value;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor { kind: self.kind })
    }
}

/// Seed that decodes a document root, which must be a map.
#[derive(Clone, Copy, Debug)]
pub struct BranchSeed {
    kind: MapKind,
}

impl BranchSeed {
    pub fn new(kind: MapKind) -> Self {
        Self { kind }
    }
}

impl<'de> DeserializeSeed<'de> for BranchSeed {
    type Value = Branch;

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Branch, D::Error> {
        deserializer.deserialize_map(BranchVisitor { kind: self.kind })
    }
}

struct ValueVisitor {
    kind: MapKind,
}

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a configuration value")
    }

    fn visit_bool<E: Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: Error>(self, v: u64) -> Result<Value, E> {
        // Values past i64::MAX fall back to the float representation.
        Ok(i64::try_from(v)
            .map(Value::Int)
            .unwrap_or(Value::Float(v as f64)))
    }

    fn visit_f64<E: Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::Float(v))
    }

    fn visit_str<E: Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        ValueSeed { kind: self.kind }.deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element_seed(ValueSeed { kind: self.kind })? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Value, A::Error> {
        BranchVisitor { kind: self.kind }
            .visit_map(map)
            .map(Value::Branch)
    }
}

struct BranchVisitor {
    kind: MapKind,
}

impl<'de> Visitor<'de> for BranchVisitor {
    type Value = Branch;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a map of configuration values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Branch, A::Error> {
        let mut branch = Branch::new(self.kind);
        while let Some(key) = map.next_key::<String>()? {
            let value = map.next_value_seed(ValueSeed { kind: self.kind })?;
            branch.insert(key, Arc::new(value));
        }
        Ok(branch)
    }
}
