use anyhow::{Context as _, Result};
use converge::{WaitJob, wait_all};
use podspec::{Pod, PodSpec, SecretList, read_pod_spec};
use statetree::{Expand, Tree};

use crate::Context;
use crate::cli::{ExpandArgs, ReadPodArgs};
use crate::commands::{load_config, read_json};

pub fn read(ctx: &Context, args: &ReadPodArgs) -> Result<()> {
    let config = load_config(ctx)?;
    let secrets: SecretList = read_json(&args.secrets)?;
    let pods = args
        .pods
        .iter()
        .map(|path| read_json::<Pod>(path))
        .collect::<Result<Vec<_>>>()?;

    let namespace = args.namespace.as_deref();
    let trees = read_pods(
        &pods,
        &secrets,
        namespace,
        &config.pod.namespace,
        usize::from(args.jobs),
    )?;

    let output = if trees.len() == 1 {
        trees[0].to_json()
    } else {
        serde_json::Value::Array(trees.iter().map(Tree::to_json).collect())
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Flatten every pod, listing secrets in its namespace.
///
/// The namespace is `namespace` when given, else the pod's own, else
/// `default_namespace`. Pods are read with at most `jobs` in flight.
pub fn read_pods(
    pods: &[Pod],
    secrets: &SecretList,
    namespace: Option<&str>,
    default_namespace: &str,
    jobs: usize,
) -> Result<Vec<Tree>> {
    let reads: Vec<WaitJob<'_, Result<Tree>>> = pods
        .iter()
        .map(|pod| {
            let ns = namespace
                .or_else(|| Some(pod.metadata.namespace.as_str()).filter(|ns| !ns.is_empty()))
                .unwrap_or(default_namespace);
            let job: WaitJob<'_, Result<Tree>> = Box::new(move || {
                log::debug!("Reading pod {} in {ns}", pod.metadata.name);
                read_pod_spec(&pod.spec, secrets, ns)
                    .with_context(|| format!("Failed to read pod {}", pod.metadata.name))
            });
            job
        })
        .collect();

    wait_all(jobs, reads)
        .context("Failed to start worker pool")?
        .into_iter()
        .collect()
}

pub fn expand(args: &ExpandArgs) -> Result<()> {
    let tree: Tree = read_json(&args.tree)?;
    let spec = PodSpec::from_tree(&tree).context("Invalid pod spec tree")?;
    println!("{}", serde_json::to_string_pretty(&spec)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use podspec::Secret;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn pod(name: &str, namespace: &str) -> Pod {
        serde_json::from_value(json!({
            "metadata": {"name": name, "namespace": namespace},
            "spec": {
                "containers": [{
                    "name": "web",
                    "image": "nginx:1",
                    "volumeMounts": [
                        {"name": "default-token-abc", "mountPath": "/var/run/secrets"}
                    ]
                }],
                "volumes": [
                    {"name": "default-token-abc", "secret": {"secretName": "default-token-abc"}}
                ]
            }
        }))
        .unwrap()
    }

    fn secrets(namespace: &str) -> SecretList {
        SecretList {
            items: vec![
                Secret::new("default-token-abc")
                    .in_namespace(namespace)
                    .annotated(podspec::filter::SERVICE_ACCOUNT_ANNOTATION, "default"),
            ],
        }
    }

    #[test]
    fn test_read_pods_hides_token_volume() {
        let pods = vec![pod("a", "apps"), pod("b", "apps")];
        let trees = read_pods(&pods, &secrets("apps"), None, "default", 2).unwrap();

        assert_eq!(trees.len(), 2);
        for tree in &trees {
            assert!(!tree.contains_key("volumes"));
            assert_eq!(tree.to_json()["containers"][0]["image"], json!("nginx:1"));
        }
    }

    #[test]
    fn test_namespace_override_changes_lookup() {
        let pods = vec![pod("a", "apps")];
        let trees = read_pods(&pods, &secrets("apps"), Some("other"), "default", 1).unwrap();

        // Secret lives in another namespace, so the volume stays visible
        assert!(trees[0].contains_key("volumes"));
    }

    #[test]
    fn test_expand_reads_tree_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tree.json");
        fs::write(
            &path,
            json!({"containers": [{"name": "web", "image": "nginx:1"}]}).to_string(),
        )
        .unwrap();

        let tree: Tree = read_json(&path).unwrap();
        let spec = PodSpec::from_tree(&tree).unwrap();
        assert_eq!(spec.containers[0].image, "nginx:1");
        assert!(expand(&ExpandArgs { tree: path }).is_ok());
    }
}
