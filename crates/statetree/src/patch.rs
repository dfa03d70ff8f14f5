//! Patch compilation
//!
//! Turns "which fields changed" into an ordered list of JSON-patch
//! operations. The compiler never diffs values itself: it asks an
//! [`AttributeStore`] whether each described field changed and emits one
//! operation per changed field, in descriptor order, then list index order.
//!
//! ## Example
//!
//! ```ignore
//! use statetree::{FieldDescriptor, compile, to_json};
//!
//! let descriptors = [
//!     FieldDescriptor::scalar("active_deadline_seconds", "/activeDeadlineSeconds", to_json),
//!     FieldDescriptor::each("containers", "/containers", to_json).field("image", "/image"),
//! ];
//! let ops = compile(&data, &"spec.0".parse()?, "/spec", &descriptors)?;
//! ```

use crate::error::{Error, Result};
use crate::path::AttrPath;
use crate::store::AttributeStore;
use crate::tree::Value;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single JSON-patch operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add {
        path: String,
        value: serde_json::Value,
    },
    Replace {
        path: String,
        value: serde_json::Value,
    },
    Remove {
        path: String,
    },
}

impl PatchOperation {
    pub fn path(&self) -> &str {
        match self {
            Self::Add { path, .. } | Self::Replace { path, .. } | Self::Remove { path } => path,
        }
    }

    /// Lowercase operation name as written on the wire
    pub fn op(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Replace { .. } => "replace",
            Self::Remove { .. } => "remove",
        }
    }
}

impl fmt::Display for PatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add { path, value } | Self::Replace { path, value } => {
                write!(f, "{} {} = {}", self.op(), path, value)
            }
            Self::Remove { path } => write!(f, "remove {path}"),
        }
    }
}

/// Ordered patch, serialized as a JSON array.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchOperations(Vec<PatchOperation>);

impl PatchOperations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: PatchOperation) {
        self.0.push(op);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PatchOperation> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<PatchOperation> {
        self.0
    }
}

impl<'a> IntoIterator for &'a PatchOperations {
    type Item = &'a PatchOperation;
    type IntoIter = std::slice::Iter<'a, PatchOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Operation emitted for a changed field that still has a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpKind {
    Add,
    #[default]
    Replace,
}

/// Converts an attribute value into its remote JSON form.
pub type Transform = fn(&AttrPath, &Value) -> Result<serde_json::Value>;

/// Identity transform
pub fn to_json(_path: &AttrPath, value: &Value) -> Result<serde_json::Value> {
    Ok(value.to_json())
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Scalar,
    Each {
        item_attr: AttrPath,
        item_pointer: String,
    },
}

/// Describes one patchable field: where it lives in the attribute tree,
/// where it lives in the remote document and how to convert it.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    attr: AttrPath,
    pointer: String,
    shape: Shape,
    op: OpKind,
    transform: Transform,
    remove_when_unset: bool,
    /// First attribute path that failed to parse; reported by [`compile`]
    invalid: Option<Error>,
}

impl FieldDescriptor {
    /// A single-valued field.
    ///
    /// `attr` is a dotted path relative to the compile prefix. A malformed
    /// path makes [`compile`] fail with [`Error::InvalidPath`].
    pub fn scalar(attr: &str, pointer: &str, transform: Transform) -> Self {
        Self::build(attr, pointer, Shape::Scalar, transform)
    }

    /// A list field emitting one operation per element at `{pointer}/{index}`.
    pub fn each(attr: &str, pointer: &str, transform: Transform) -> Self {
        Self::build(
            attr,
            pointer,
            Shape::Each {
                item_attr: AttrPath::root(),
                item_pointer: String::new(),
            },
            transform,
        )
    }

    fn build(attr: &str, pointer: &str, shape: Shape, transform: Transform) -> Self {
        let mut descriptor = Self {
            attr: AttrPath::root(),
            pointer: pointer.to_string(),
            shape,
            op: OpKind::Replace,
            transform,
            remove_when_unset: false,
            invalid: None,
        };
        descriptor.attr = descriptor.parse(attr);
        descriptor
    }

    fn parse(&mut self, attr: &str) -> AttrPath {
        match attr.parse() {
            Ok(path) => path,
            Err(err) => {
                self.invalid.get_or_insert(err);
                AttrPath::root()
            }
        }
    }

    fn validate(&self) -> Result<()> {
        match &self.invalid {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Target a field inside each list element, e.g. `image` at `/image`
    #[must_use]
    pub fn field(mut self, attr: &str, pointer: &str) -> Self {
        if matches!(self.shape, Shape::Each { .. }) {
            let parsed = self.parse(attr);
            if let Shape::Each {
                item_attr,
                item_pointer,
            } = &mut self.shape
            {
                *item_attr = parsed;
                *item_pointer = pointer.to_string();
            }
        }
        self
    }

    /// Emit `op` instead of replace
    #[must_use]
    pub fn with_op(mut self, op: OpKind) -> Self {
        self.op = op;
        self
    }

    /// Emit a remove when the changed field no longer has a value
    #[must_use]
    pub fn remove_when_unset(mut self) -> Self {
        self.remove_when_unset = true;
        self
    }

    fn emit(
        &self,
        ops: &mut PatchOperations,
        data: &dyn AttributeStore,
        attr: &AttrPath,
        pointer: String,
    ) -> Result<()> {
        match data.get(attr) {
            Some(value) => {
                let value = (self.transform)(attr, value)?;
                ops.push(match self.op {
                    OpKind::Add => PatchOperation::Add {
                        path: pointer,
                        value,
                    },
                    OpKind::Replace => PatchOperation::Replace {
                        path: pointer,
                        value,
                    },
                });
            }
            None if self.remove_when_unset => ops.push(PatchOperation::Remove { path: pointer }),
            None => {}
        }
        Ok(())
    }
}

/// Compile the operations for every changed field.
///
/// `attr_prefix` locates the described fields in `data`; `pointer_prefix`
/// is prepended to every emitted path. List descriptors only address
/// elements present in the planned list, so shrinking a list emits nothing
/// for the dropped tail. A descriptor built from a malformed path fails the
/// whole compile before any operation is emitted.
pub fn compile(
    data: &dyn AttributeStore,
    attr_prefix: &AttrPath,
    pointer_prefix: &str,
    descriptors: &[FieldDescriptor],
) -> Result<PatchOperations> {
    descriptors.iter().try_for_each(FieldDescriptor::validate)?;

    let mut ops = PatchOperations::new();

    for descriptor in descriptors {
        let attr = attr_prefix.join(&descriptor.attr);
        if !data.has_change(&attr) {
            continue;
        }
        let pointer = format!("{pointer_prefix}{}", descriptor.pointer);

        match &descriptor.shape {
            Shape::Scalar => descriptor.emit(&mut ops, data, &attr, pointer)?,
            Shape::Each {
                item_attr,
                item_pointer,
            } => {
                let Some(value) = data.get(&attr) else {
                    continue;
                };
                let items = value.as_list().ok_or_else(|| Error::TypeMismatch {
                    path: attr.to_string(),
                    expected: "list",
                    found: value.kind(),
                })?;

                for index in 0..items.len() {
                    let element = attr.index(index).join(item_attr);
                    if data.has_change(&element) {
                        let path = format!("{pointer}/{index}{item_pointer}");
                        descriptor.emit(&mut ops, data, &element, path)?;
                    }
                }
            }
        }
    }

    Ok(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::ResourceData;
    use crate::tree::Tree;
    use serde_json::json;

    fn container(name: &str, image: &str) -> Value {
        Value::Block(Tree::new().with("name", name).with("image", image))
    }

    fn spec(deadline: Option<i64>, containers: Vec<Value>) -> Tree {
        let mut tree = Tree::new();
        tree.put_int("deadline", deadline);
        tree.put_list("containers", containers);
        Tree::new().with("spec", vec![Value::Block(tree)])
    }

    fn descriptors() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::scalar("deadline", "/activeDeadlineSeconds", to_json),
            FieldDescriptor::each("containers", "/containers", to_json).field("image", "/image"),
        ]
    }

    fn prefix() -> AttrPath {
        "spec.0".parse().unwrap()
    }

    #[test]
    fn test_no_change_no_ops() {
        let tree = spec(Some(30), vec![container("web", "nginx:1")]);
        let data = ResourceData::new("pod", tree.clone(), tree);
        let ops = compile(&data, &prefix(), "/spec", &descriptors()).unwrap();
        assert!(ops.is_empty());
    }

    #[test]
    fn test_ops_follow_descriptor_order() {
        let prior = spec(Some(30), vec![container("web", "nginx:1")]);
        let planned = spec(Some(60), vec![container("web", "nginx:2")]);
        let data = ResourceData::new("pod", prior, planned);

        let ops = compile(&data, &prefix(), "/spec", &descriptors()).unwrap();
        assert_eq!(
            ops.into_inner(),
            vec![
                PatchOperation::Replace {
                    path: "/spec/activeDeadlineSeconds".to_string(),
                    value: json!(60),
                },
                PatchOperation::Replace {
                    path: "/spec/containers/0/image".to_string(),
                    value: json!("nginx:2"),
                },
            ]
        );

        // Reversing the descriptors reverses the output
        let mut reversed = descriptors();
        reversed.reverse();
        let data = ResourceData::new(
            "pod",
            spec(Some(30), vec![container("web", "nginx:1")]),
            spec(Some(60), vec![container("web", "nginx:2")]),
        );
        let ops = compile(&data, &prefix(), "/spec", &reversed).unwrap();
        let paths: Vec<&str> = ops.iter().map(PatchOperation::path).collect();
        assert_eq!(
            paths,
            vec!["/spec/containers/0/image", "/spec/activeDeadlineSeconds"]
        );
    }

    #[test]
    fn test_list_emits_only_changed_existing_elements() {
        let prior = spec(
            None,
            vec![
                container("a", "img:1"),
                container("b", "img:1"),
                container("c", "img:1"),
            ],
        );
        let planned = spec(None, vec![container("a", "img:1"), container("b", "img:2")]);
        let data = ResourceData::new("pod", prior, planned);

        let ops = compile(&data, &prefix(), "", &descriptors()).unwrap();
        assert_eq!(
            ops.into_inner(),
            vec![PatchOperation::Replace {
                path: "/containers/1/image".to_string(),
                value: json!("img:2"),
            }]
        );
    }

    #[test]
    fn test_unset_field_skipped_unless_removal_requested() {
        let data = ResourceData::new("pod", spec(Some(30), vec![]), spec(None, vec![]));

        let ops = compile(&data, &prefix(), "", &descriptors()).unwrap();
        assert!(ops.is_empty());

        let removing = [
            FieldDescriptor::scalar("deadline", "/activeDeadlineSeconds", to_json)
                .remove_when_unset(),
        ];
        let ops = compile(&data, &prefix(), "", &removing).unwrap();
        assert_eq!(
            ops.into_inner(),
            vec![PatchOperation::Remove {
                path: "/activeDeadlineSeconds".to_string()
            }]
        );
    }

    #[test]
    fn test_add_op_and_wire_format() {
        let data = ResourceData::creating(spec(Some(5), vec![]));
        let adding = [
            FieldDescriptor::scalar("deadline", "/activeDeadlineSeconds", to_json)
                .with_op(OpKind::Add),
        ];
        let ops = compile(&data, &prefix(), "", &adding).unwrap();

        let wire = serde_json::to_value(&ops).unwrap();
        assert_eq!(
            wire,
            json!([{"op": "add", "path": "/activeDeadlineSeconds", "value": 5}])
        );
        assert_eq!(
            ops.iter().next().unwrap().to_string(),
            "add /activeDeadlineSeconds = 5"
        );
    }

    #[test]
    fn test_non_list_value_is_type_mismatch() {
        let prior = Tree::new();
        let planned = Tree::new().with("containers", "oops");
        let data = ResourceData::new("pod", prior, planned);
        let descriptors = [FieldDescriptor::each("containers", "/containers", to_json)];

        let err = compile(&data, &AttrPath::root(), "", &descriptors).unwrap_err();
        assert_eq!(
            err,
            Error::TypeMismatch {
                path: "containers".to_string(),
                expected: "list",
                found: "string",
            }
        );
    }

    #[test]
    fn test_malformed_attr_path_fails_compile() {
        let prior = Tree::new().with(
            "spec",
            vec![Value::Block(Tree::new().with("hostname", "a"))],
        );
        let planned = Tree::new().with(
            "spec",
            vec![Value::Block(Tree::new().with("hostname", "b"))],
        );
        let data = ResourceData::new("pod", prior, planned);

        let scalar = [FieldDescriptor::scalar(
            "deadline..seconds",
            "/activeDeadlineSeconds",
            to_json,
        )];
        let err = compile(&data, &prefix(), "/spec", &scalar).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidPath { ref path, .. } if path == "deadline..seconds"
        ));

        let nested = [FieldDescriptor::each("containers", "/containers", to_json)
            .field(".image", "/image")];
        let err = compile(&data, &prefix(), "/spec", &nested).unwrap_err();
        assert!(matches!(err, Error::InvalidPath { ref path, .. } if path == ".image"));
    }

    #[test]
    fn test_transform_errors_propagate() {
        fn positive(path: &AttrPath, value: &Value) -> Result<serde_json::Value> {
            match value.as_int() {
                Some(n) if n > 0 => Ok(json!(n)),
                Some(n) => Err(Error::OutOfRange {
                    path: path.to_string(),
                    value: n,
                }),
                None => Err(Error::TypeMismatch {
                    path: path.to_string(),
                    expected: "int",
                    found: value.kind(),
                }),
            }
        }

        let data = ResourceData::creating(spec(Some(-1), vec![]));
        let descriptors = [FieldDescriptor::scalar("deadline", "/d", positive)];
        let err = compile(&data, &prefix(), "", &descriptors).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { value: -1, .. }));
    }
}
