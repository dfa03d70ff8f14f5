//! Read path: remote pod spec to the user-visible tree

use crate::filter::{InternalEntityRule, LookupError, SecretLookup};
use crate::types::PodSpec;
use statetree::{Flatten, Tree};
use std::collections::BTreeSet;

/// Flatten a pod spec as the user sees it, with injected volumes hidden.
///
/// Secrets are only listed when the spec has volumes. Mounts of hidden
/// volumes are dropped from every container along with the volumes.
pub fn read_pod_spec(
    spec: &PodSpec,
    lookup: &dyn SecretLookup,
    namespace: &str,
) -> Result<Tree, LookupError> {
    read_pod_spec_with(&InternalEntityRule::default(), spec, lookup, namespace)
}

/// [`read_pod_spec`] under a custom rule
pub fn read_pod_spec_with(
    rule: &InternalEntityRule,
    spec: &PodSpec,
    lookup: &dyn SecretLookup,
    namespace: &str,
) -> Result<Tree, LookupError> {
    if spec.volumes.is_empty() {
        return Ok(spec.flatten());
    }

    let mut visible = spec.clone();
    visible.volumes = rule.classify(&spec.volumes, lookup, namespace)?;

    let kept: BTreeSet<&str> = visible.volumes.iter().map(|v| v.name.as_str()).collect();
    let hidden: BTreeSet<&str> = spec
        .volumes
        .iter()
        .map(|v| v.name.as_str())
        .filter(|name| !kept.contains(name))
        .collect();

    if !hidden.is_empty() {
        for container in &mut visible.containers {
            container
                .volume_mounts
                .retain(|mount| !hidden.contains(mount.name.as_str()));
        }
    }

    Ok(visible.flatten())
}
