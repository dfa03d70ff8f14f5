//! Routing scope passed through to every container-service call

use serde::{Deserialize, Serialize};

/// Organization, space, account and region a call is scoped to.
///
/// Handlers never interpret it; it travels unchanged to the remote API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetHeader {
    pub org_guid: String,
    pub space_guid: String,
    pub account_guid: String,
    pub region: String,
}

impl TargetHeader {
    pub fn new(
        org_guid: impl Into<String>,
        space_guid: impl Into<String>,
        account_guid: impl Into<String>,
    ) -> Self {
        Self {
            org_guid: org_guid.into(),
            space_guid: space_guid.into(),
            account_guid: account_guid.into(),
            region: String::new(),
        }
    }

    #[must_use]
    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }
}
