//! Flatten/expand traits and a typed field reader
//!
//! `flatten` maps an external value into a [`Tree`], leaving out optional
//! fields at their zero value. `expand` is the inverse: absent fields come
//! back as zero values and defaults are applied only here. For managed
//! fields `expand(flatten(x)) == x`.

use crate::error::{Error, Result};
use crate::path::AttrPath;
use crate::tree::{Tree, Value};
use std::collections::BTreeMap;

/// External value to attribute tree
pub trait Flatten {
    fn flatten(&self) -> Tree;
}

/// Attribute tree to external value
pub trait Expand: Sized {
    fn expand(fields: &Fields<'_>) -> Result<Self>;

    /// Expand a top-level tree
    fn from_tree(tree: &Tree) -> Result<Self> {
        Self::expand(&Fields::new(tree))
    }
}

/// Typed, path-aware reader over one block of a tree.
///
/// Every error names the full attribute path of the offending field.
#[derive(Debug, Clone)]
pub struct Fields<'a> {
    tree: &'a Tree,
    path: AttrPath,
}

impl<'a> Fields<'a> {
    pub fn new(tree: &'a Tree) -> Self {
        Self {
            tree,
            path: AttrPath::root(),
        }
    }

    /// Reader for a block nested at `path`
    pub fn at(tree: &'a Tree, path: AttrPath) -> Self {
        Self { tree, path }
    }

    pub fn path(&self) -> &AttrPath {
        &self.path
    }

    pub fn tree(&self) -> &'a Tree {
        self.tree
    }

    /// Whether `key` is set
    pub fn has(&self, key: &str) -> bool {
        self.tree.contains_key(key)
    }

    /// Full path of `key`, for error messages
    pub fn path_of(&self, key: &str) -> String {
        self.path.child(key).to_string()
    }

    fn mismatch(&self, key: &str, expected: &'static str, found: &Value) -> Error {
        Error::TypeMismatch {
            path: self.path_of(key),
            expected,
            found: found.kind(),
        }
    }

    pub fn opt_string(&self, key: &str) -> Result<Option<String>> {
        match self.tree.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(self.mismatch(key, "string", other)),
        }
    }

    /// String value, empty when unset
    pub fn string(&self, key: &str) -> Result<String> {
        Ok(self.opt_string(key)?.unwrap_or_default())
    }

    /// String value, `default` when unset
    pub fn string_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self
            .opt_string(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Non-empty string value
    pub fn required_string(&self, key: &str) -> Result<String> {
        match self.opt_string(key)? {
            Some(s) if !s.is_empty() => Ok(s),
            _ => Err(Error::MissingField {
                path: self.path_of(key),
            }),
        }
    }

    /// String value restricted to `allowed`, `default` when unset
    pub fn one_of(&self, key: &str, allowed: &[&str], default: &str) -> Result<String> {
        let value = self.string_or(key, default)?;
        if allowed.contains(&value.as_str()) {
            Ok(value)
        } else {
            Err(Error::InvalidValue {
                path: self.path_of(key),
                value,
                allowed: allowed.iter().map(ToString::to_string).collect(),
            })
        }
    }

    pub fn opt_int(&self, key: &str) -> Result<Option<i64>> {
        match self.tree.get(key) {
            None => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(self.mismatch(key, "int", other)),
        }
    }

    /// Integer value, `default` when unset
    pub fn int_or(&self, key: &str, default: i64) -> Result<i64> {
        Ok(self.opt_int(key)?.unwrap_or(default))
    }

    /// Integer value converted to a narrower type
    pub fn opt_int_as<T: TryFrom<i64>>(&self, key: &str) -> Result<Option<T>> {
        self.opt_int(key)?
            .map(|n| {
                T::try_from(n).map_err(|_| Error::OutOfRange {
                    path: self.path_of(key),
                    value: n,
                })
            })
            .transpose()
    }

    pub fn opt_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.tree.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(self.mismatch(key, "bool", other)),
        }
    }

    /// Boolean value, false when unset
    pub fn bool(&self, key: &str) -> Result<bool> {
        Ok(self.opt_bool(key)?.unwrap_or(false))
    }

    fn list(&self, key: &str) -> Result<&'a [Value]> {
        match self.tree.get(key) {
            None => Ok(&[]),
            Some(Value::List(items)) => Ok(items),
            Some(other) => Err(self.mismatch(key, "list", other)),
        }
    }

    /// Nested block reader, if set
    pub fn block(&self, key: &str) -> Result<Option<Fields<'a>>> {
        match self.tree.get(key) {
            None => Ok(None),
            Some(Value::Block(tree)) => Ok(Some(Fields::at(tree, self.path.child(key)))),
            Some(other) => Err(self.mismatch(key, "block", other)),
        }
    }

    /// Readers for each block in a list, in order
    pub fn blocks(&self, key: &str) -> Result<Vec<Fields<'a>>> {
        let base = self.path.child(key);
        self.list(key)?
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Block(tree) => Ok(Fields::at(tree, base.index(i))),
                other => Err(Error::TypeMismatch {
                    path: base.index(i).to_string(),
                    expected: "block",
                    found: other.kind(),
                }),
            })
            .collect()
    }

    /// Expand each block in a list
    pub fn expand_all<T: Expand>(&self, key: &str) -> Result<Vec<T>> {
        self.blocks(key)?.iter().map(T::expand).collect()
    }

    /// Expand a nested block, if set
    pub fn expand_block<T: Expand>(&self, key: &str) -> Result<Option<T>> {
        self.block(key)?.as_ref().map(T::expand).transpose()
    }

    pub fn strings(&self, key: &str) -> Result<Vec<String>> {
        let base = self.path.child(key);
        self.list(key)?
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::String(s) => Ok(s.clone()),
                other => Err(Error::TypeMismatch {
                    path: base.index(i).to_string(),
                    expected: "string",
                    found: other.kind(),
                }),
            })
            .collect()
    }

    pub fn ints(&self, key: &str) -> Result<Vec<i64>> {
        let base = self.path.child(key);
        self.list(key)?
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Int(n) => Ok(*n),
                other => Err(Error::TypeMismatch {
                    path: base.index(i).to_string(),
                    expected: "int",
                    found: other.kind(),
                }),
            })
            .collect()
    }

    /// Block of string values read as a map
    pub fn string_map(&self, key: &str) -> Result<BTreeMap<String, String>> {
        let Some(block) = self.block(key)? else {
            return Ok(BTreeMap::new());
        };
        block
            .tree
            .keys()
            .map(|k| block.string(k).map(|v| (k.to_string(), v)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Port {
        name: String,
        number: u16,
    }

    impl Flatten for Port {
        fn flatten(&self) -> Tree {
            let mut tree = Tree::new();
            tree.put_str("name", &self.name);
            tree.set("number", i64::from(self.number));
            tree
        }
    }

    impl Expand for Port {
        fn expand(fields: &Fields<'_>) -> Result<Self> {
            Ok(Self {
                name: fields.string("name")?,
                number: fields
                    .opt_int_as("number")?
                    .ok_or_else(|| Error::MissingField {
                        path: fields.path_of("number"),
                    })?,
            })
        }
    }

    #[test]
    fn test_round_trip() {
        let port = Port {
            name: String::new(),
            number: 8080,
        };
        let tree = port.flatten();
        assert!(!tree.contains_key("name"));
        assert_eq!(Port::from_tree(&tree).unwrap(), port);
    }

    #[test]
    fn test_errors_carry_full_path() {
        let tree = Tree::new().with(
            "ports",
            vec![
                Value::Block(Tree::new().with("number", 80)),
                Value::Block(Tree::new().with("number", "http")),
            ],
        );
        let err = Fields::new(&tree).expand_all::<Port>("ports").unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                path: "ports.1.number".to_string(),
                expected: "int",
                found: "string",
            }
        );
    }

    #[test]
    fn test_out_of_range() {
        let tree = Tree::new().with("number", 70_000);
        let err = Port::from_tree(&tree).unwrap_err();
        assert_eq!(
            err,
            Error::OutOfRange {
                path: "number".to_string(),
                value: 70_000,
            }
        );
    }

    #[test]
    fn test_defaults_and_validation() {
        let tree = Tree::new().with("action", "explode");
        let fields = Fields::new(&tree);

        assert_eq!(fields.string_or("billing", "hourly").unwrap(), "hourly");
        assert_eq!(fields.int_or("wait", 90).unwrap(), 90);
        assert!(!fields.bool("flag").unwrap());
        assert!(fields.strings("missing").unwrap().is_empty());
        assert!(matches!(
            fields.required_string("name"),
            Err(Error::MissingField { .. })
        ));

        let err = fields
            .one_of("action", &["add", "reboot", "reload"], "add")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
    }

    #[test]
    fn test_string_map() {
        let tree = Tree::new().with("labels", Tree::new().with("b", "2").with("a", "1"));
        let map = Fields::new(&tree).string_map("labels").unwrap();
        assert_eq!(map.get("a").map(String::as_str), Some("1"));
        assert_eq!(map.len(), 2);
    }
}
