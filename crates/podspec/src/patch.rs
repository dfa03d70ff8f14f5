//! Patch descriptors for in-place pod spec updates
//!
//! Only two pod spec fields can change without recreating the pod: the
//! active deadline and container images.

use statetree::{AttrPath, AttributeStore, FieldDescriptor, PatchOperations, Result, compile, to_json};

/// Patchable pod spec fields, in emission order
pub fn pod_spec_descriptors() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::scalar("active_deadline_seconds", "/activeDeadlineSeconds", to_json),
        FieldDescriptor::each("containers", "/containers", to_json).field("image", "/image"),
    ]
}

/// Compile the patch for a pod spec living at `attr_prefix` in `data`.
///
/// Emitted paths are prefixed with `pointer_prefix`, typically `/spec`.
pub fn patch_pod_spec(
    data: &dyn AttributeStore,
    attr_prefix: &AttrPath,
    pointer_prefix: &str,
) -> Result<PatchOperations> {
    compile(data, attr_prefix, pointer_prefix, &pod_spec_descriptors())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Container, PodSpec};
    use serde_json::json;
    use statetree::{Flatten, PatchOperation, ResourceData, Tree};

    fn pod(deadline: Option<i64>, images: &[&str]) -> Tree {
        let spec = PodSpec {
            active_deadline_seconds: deadline,
            containers: images
                .iter()
                .enumerate()
                .map(|(i, image)| Container {
                    name: format!("c{i}"),
                    image: (*image).to_string(),
                    ..Container::default()
                })
                .collect(),
            ..PodSpec::default()
        };
        Tree::new().with("spec", vec![spec.flatten()])
    }

    fn prefix() -> AttrPath {
        "spec.0".parse().unwrap()
    }

    #[test]
    fn test_deadline_then_images() {
        let data = ResourceData::new(
            "default/web",
            pod(Some(30), &["nginx:1", "envoy:1"]),
            pod(Some(90), &["nginx:2", "envoy:2"]),
        );

        let ops = patch_pod_spec(&data, &prefix(), "/spec").unwrap();
        assert_eq!(
            serde_json::to_value(&ops).unwrap(),
            json!([
                {"op": "replace", "path": "/spec/activeDeadlineSeconds", "value": 90},
                {"op": "replace", "path": "/spec/containers/0/image", "value": "nginx:2"},
                {"op": "replace", "path": "/spec/containers/1/image", "value": "envoy:2"},
            ])
        );
    }

    #[test]
    fn test_unchanged_spec_is_empty_patch() {
        let tree = pod(Some(30), &["nginx:1"]);
        let data = ResourceData::new("default/web", tree.clone(), tree);
        assert!(patch_pod_spec(&data, &prefix(), "/spec").unwrap().is_empty());
    }

    #[test]
    fn test_removed_container_emits_nothing_for_it() {
        let data = ResourceData::new(
            "default/web",
            pod(None, &["nginx:1", "envoy:1"]),
            pod(None, &["nginx:2"]),
        );

        let ops = patch_pod_spec(&data, &prefix(), "/spec").unwrap();
        assert_eq!(
            ops.into_inner(),
            vec![PatchOperation::Replace {
                path: "/spec/containers/0/image".to_string(),
                value: json!("nginx:2"),
            }]
        );
    }
}
