//! Hiding platform-injected volumes
//!
//! The cluster mounts a service-account token into every pod unless told
//! otherwise. Those volumes were never declared by the user, so showing them
//! on read would turn every plan into a spurious diff. A volume is hidden
//! only when both hold:
//!
//! 1. its name carries the injected prefix and its source is a secret, and
//! 2. the referenced secret is annotated as belonging to the default
//!    service account.
//!
//! Everything else passes through, in its original order.

use crate::types::{ObjectMeta, Volume};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Boxed error returned by secret lookups
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Name prefix of injected service-account token volumes
pub const SERVICE_ACCOUNT_TOKEN_PREFIX: &str = "default-token-";

/// Annotation naming the service account a token secret belongs to
pub const SERVICE_ACCOUNT_ANNOTATION: &str = "kubernetes.io/service-account.name";

/// Service account whose tokens are injected
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

/// A secret as listed from the cluster.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Secret {
    pub metadata: ObjectMeta,
    #[serde(rename = "type", skip_serializing_if = "String::is_empty")]
    pub secret_type: String,
}

impl Secret {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta {
                name: name.into(),
                ..ObjectMeta::default()
            },
            secret_type: String::new(),
        }
    }

    #[must_use]
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.metadata.namespace = namespace.into();
        self
    }

    #[must_use]
    pub fn annotated(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }
}

/// Response shape of a secret list call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecretList {
    pub items: Vec<Secret>,
}

/// Lists the secrets of a namespace.
pub trait SecretLookup {
    fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, BoxError>;
}

/// In-memory secrets. A secret without a namespace matches any namespace.
impl SecretLookup for Vec<Secret> {
    fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, BoxError> {
        Ok(self
            .iter()
            .filter(|s| s.metadata.namespace.is_empty() || s.metadata.namespace == namespace)
            .cloned()
            .collect())
    }
}

impl SecretLookup for SecretList {
    fn list_secrets(&self, namespace: &str) -> Result<Vec<Secret>, BoxError> {
        self.items.list_secrets(namespace)
    }
}

/// Classification failed because the secrets could not be listed.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("failed to list secrets in namespace '{namespace}': {source}")]
    ListSecrets { namespace: String, source: BoxError },
}

/// What makes a volume platform-injected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalEntityRule {
    pub name_prefix: String,
    pub annotation_key: String,
    pub annotation_value: String,
}

impl Default for InternalEntityRule {
    /// The service-account token rule
    fn default() -> Self {
        Self {
            name_prefix: SERVICE_ACCOUNT_TOKEN_PREFIX.to_string(),
            annotation_key: SERVICE_ACCOUNT_ANNOTATION.to_string(),
            annotation_value: DEFAULT_SERVICE_ACCOUNT.to_string(),
        }
    }
}

impl InternalEntityRule {
    /// Secret referenced by a candidate volume, `None` for non-candidates
    pub fn candidate<'a>(&self, volume: &'a Volume) -> Option<&'a str> {
        if !volume.name.starts_with(&self.name_prefix) {
            return None;
        }
        volume
            .source
            .as_secret()
            .map(|secret| secret.secret_name.as_str())
    }

    fn marks_internal(&self, secret: &Secret) -> bool {
        secret
            .metadata
            .annotations
            .get(&self.annotation_key)
            .is_some_and(|value| *value == self.annotation_value)
    }

    /// Whether this volume is confirmed as platform-injected
    pub fn is_internal(&self, volume: &Volume, secrets: &[Secret]) -> bool {
        self.candidate(volume).is_some_and(|secret_name| {
            secrets
                .iter()
                .any(|s| s.name() == secret_name && self.marks_internal(s))
        })
    }

    /// Volumes declared by the user, in input order
    ///
    /// Each volume is judged on its own, so a user volume sharing a name
    /// with an injected one is kept.
    pub fn pick(&self, volumes: &[Volume], secrets: &[Secret]) -> Vec<Volume> {
        volumes
            .iter()
            .filter(|volume| {
                let internal = self.is_internal(volume, secrets);
                if internal {
                    debug!("Hiding platform-injected volume {}", volume.name);
                }
                !internal
            })
            .cloned()
            .collect()
    }

    /// List the namespace's secrets and pick the user volumes.
    ///
    /// A failed lookup fails the whole classification.
    pub fn classify(
        &self,
        volumes: &[Volume],
        lookup: &dyn SecretLookup,
        namespace: &str,
    ) -> Result<Vec<Volume>, LookupError> {
        let secrets = lookup
            .list_secrets(namespace)
            .map_err(|source| LookupError::ListSecrets {
                namespace: namespace.to_string(),
                source,
            })?;
        Ok(self.pick(volumes, &secrets))
    }
}

/// User volumes under the service-account token rule
pub fn pick_user_volumes(volumes: &[Volume], secrets: &[Secret]) -> Vec<Volume> {
    InternalEntityRule::default().pick(volumes, secrets)
}

/// [`pick_user_volumes`] against a live secret lookup
pub fn classify(
    volumes: &[Volume],
    lookup: &dyn SecretLookup,
    namespace: &str,
) -> Result<Vec<Volume>, LookupError> {
    InternalEntityRule::default().classify(volumes, lookup, namespace)
}
