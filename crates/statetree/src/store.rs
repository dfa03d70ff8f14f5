//! Attribute stores with change detection

use crate::path::AttrPath;
use crate::tree::{Tree, Value};

/// Read access to a resource's planned attributes plus per-path change flags.
///
/// The patch compiler only asks these two questions; how changes are
/// detected is up to the implementation.
pub trait AttributeStore {
    /// Planned value at `path`, if set
    fn get(&self, path: &AttrPath) -> Option<&Value>;

    /// Whether the value at `path` differs from the prior state
    fn has_change(&self, path: &AttrPath) -> bool;
}

/// Prior and planned trees of one resource.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceData {
    id: String,
    prior: Tree,
    planned: Tree,
}

impl ResourceData {
    pub fn new(id: impl Into<String>, prior: Tree, planned: Tree) -> Self {
        Self {
            id: id.into(),
            prior,
            planned,
        }
    }

    /// A resource being created: nothing prior, everything planned
    pub fn creating(planned: Tree) -> Self {
        Self::new("", Tree::new(), planned)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn prior(&self) -> &Tree {
        &self.prior
    }

    pub fn planned(&self) -> &Tree {
        &self.planned
    }

    /// Old and new value at `path`
    pub fn get_change(&self, path: &AttrPath) -> (Option<&Value>, Option<&Value>) {
        (self.prior.lookup(path), self.planned.lookup(path))
    }
}

impl AttributeStore for ResourceData {
    fn get(&self, path: &AttrPath) -> Option<&Value> {
        self.planned.lookup(path)
    }

    fn has_change(&self, path: &AttrPath) -> bool {
        let (old, new) = self.get_change(path);
        old != new
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> AttrPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_has_change_compares_subtrees() {
        let prior = Tree::new()
            .with("replicas", 1)
            .with("labels", Tree::new().with("app", "web"));
        let planned = Tree::new()
            .with("replicas", 2)
            .with("labels", Tree::new().with("app", "web"));
        let data = ResourceData::new("r1", prior, planned);

        assert!(data.has_change(&path("replicas")));
        assert!(!data.has_change(&path("labels")));
        assert!(!data.has_change(&path("labels.app")));
        assert_eq!(data.get(&path("replicas")), Some(&Value::Int(2)));
    }

    #[test]
    fn test_unset_to_set_is_a_change() {
        let data = ResourceData::creating(Tree::new().with("hostname", "db"));
        assert!(data.has_change(&path("hostname")));
        assert!(!data.has_change(&path("subdomain")));
        assert_eq!(data.id(), "");
    }
}
