//! Ordered resource trees
//!
//! A [`Tree`] is the flat attribute view of a resource: named fields in
//! declaration order whose values are primitives, lists or nested blocks.
//! Absent fields mean "unset". The `put_*` helpers skip zero values so a
//! flattened tree never contains a field the user did not set.

use crate::path::{AttrPath, Segment};
use serde::de::{self, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<Value>),
    Block(Tree),
}

impl Value {
    /// Name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Block(_) => "block",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_block(&self) -> Option<&Tree> {
        match self {
            Self::Block(tree) => Some(tree),
            _ => None,
        }
    }

    /// Convert to JSON, keeping block field order
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Int(n) => serde_json::Value::from(*n),
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Block(tree) => tree.to_json(),
        }
    }

    /// Look up a nested value
    fn lookup_segments(&self, segments: &[Segment]) -> Option<&Self> {
        let Some((first, rest)) = segments.split_first() else {
            return Some(self);
        };
        let next = match (self, first) {
            (Self::Block(tree), Segment::Key(key)) => tree.get(key)?,
            (Self::List(items), Segment::Index(index)) => items.get(*index)?,
            _ => return None,
        };
        next.lookup_segments(rest)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Tree> for Value {
    fn from(tree: Tree) -> Self {
        Self::Block(tree)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// Ordered set of named fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tree {
    fields: Vec<(String, Value)>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Set a field. An existing field keeps its position.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((key, value)),
        }
    }

    /// Builder form of [`Tree::set`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let position = self.fields.iter().position(|(k, _)| k == key)?;
        Some(self.fields.remove(position).1)
    }

    /// Fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }

    /// Resolve a dotted path such as `containers.0.image`
    pub fn lookup(&self, path: &AttrPath) -> Option<&Value> {
        let (first, rest) = path.segments().split_first()?;
        let Segment::Key(key) = first else {
            return None;
        };
        self.get(key)?.lookup_segments(rest)
    }

    // Zero-eliding writers used by flatten implementations

    /// Write a string unless it is empty
    pub fn put_str(&mut self, key: &str, value: &str) {
        if !value.is_empty() {
            self.set(key, value);
        }
    }

    /// Write an integer when present
    pub fn put_int(&mut self, key: &str, value: Option<i64>) {
        if let Some(n) = value {
            self.set(key, n);
        }
    }

    /// Write an integer unless it is zero
    pub fn put_nonzero(&mut self, key: &str, value: i64) {
        if value != 0 {
            self.set(key, value);
        }
    }

    /// Write a boolean when present
    pub fn put_opt_bool(&mut self, key: &str, value: Option<bool>) {
        if let Some(b) = value {
            self.set(key, b);
        }
    }

    /// Write a boolean only when true
    pub fn put_flag(&mut self, key: &str, value: bool) {
        if value {
            self.set(key, true);
        }
    }

    /// Write a list unless it is empty
    pub fn put_list(&mut self, key: &str, items: Vec<Value>) {
        if !items.is_empty() {
            self.set(key, Value::List(items));
        }
    }

    /// Write a list of strings unless it is empty
    pub fn put_strings(&mut self, key: &str, items: &[String]) {
        self.put_list(key, items.iter().map(|s| Value::from(s.as_str())).collect());
    }

    /// Write a list of integers unless it is empty
    pub fn put_ints(&mut self, key: &str, items: &[i64]) {
        self.put_list(key, items.iter().map(|n| Value::Int(*n)).collect());
    }

    /// Write a string map as a block unless it is empty
    pub fn put_string_map(&mut self, key: &str, map: &BTreeMap<String, String>) {
        if !map.is_empty() {
            let block = map.iter().fold(Self::new(), |tree, (k, v)| {
                tree.with(k.as_str(), v.as_str())
            });
            self.set(key, block);
        }
    }

    /// Write a block unconditionally. Empty blocks are meaningful for
    /// shapes whose presence alone selects them.
    pub fn put_block(&mut self, key: &str, block: Self) {
        self.set(key, Value::Block(block));
    }

    /// Write a block unless it is absent or empty
    pub fn put_opt_block(&mut self, key: &str, block: Option<Self>) {
        if let Some(block) = block.filter(|b| !b.is_empty()) {
            self.set(key, Value::Block(block));
        }
    }

    /// Convert to a JSON object, keeping field order
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(map)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(n) => serializer.serialize_i64(*n),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Block(tree) => tree.serialize(serializer),
        }
    }
}

impl Serialize for Tree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a bool, integer, string, list or object")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::Int(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        i64::try_from(v)
            .map(Value::Int)
            .map_err(|_| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Err(E::invalid_type(de::Unexpected::Float(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::List(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Value, A::Error> {
        TreeVisitor.visit_map(map).map(Value::Block)
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

struct TreeVisitor;

impl<'de> Visitor<'de> for TreeVisitor {
    type Value = Tree;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an object of attributes")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Tree, A::Error> {
        let mut tree = Tree::new();
        // null means unset
        while let Some((key, value)) = map.next_entry::<String, Option<Value>>()? {
            if let Some(value) = value {
                tree.set(key, value);
            }
        }
        Ok(tree)
    }
}

impl<'de> Deserialize<'de> for Tree {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(TreeVisitor)
    }
}
