//! Client session: capability handles built once from credentials.
//!
//! A capability that cannot be configured does not fail the session. Its
//! error is kept and returned by every accessor call, so resources that
//! never touch that capability keep working.

use crate::api::{
    Clusters, ContainerClients, InfrastructureClients, NetworkStorage, ProductOrders, Subnets,
    Webhooks, Workers,
};
use crate::config::SessionConfig;
use crate::error::{ApiError, ApiResult, ProviderError, SessionError};
use crate::retry::RetryPolicy;
use log::{debug, info};
use std::sync::Arc;

/// Builds capability bundles for a configuration.
///
/// This is where a transport plugs in.
pub trait Connector {
    /// Container service clients. [`ApiError::ServiceEndpoint`] means the
    /// service is not offered in the configured region.
    fn container(&self, config: &SessionConfig) -> ApiResult<ContainerClients>;

    /// Infrastructure clients
    fn infrastructure(&self, config: &SessionConfig) -> ApiResult<InfrastructureClients>;
}

/// Capability handles with their configuration errors
#[derive(Clone)]
pub struct ClientSession {
    container: Result<ContainerClients, SessionError>,
    infrastructure: Result<InfrastructureClients, SessionError>,
    retry: RetryPolicy,
}

impl ClientSession {
    /// Build a session.
    ///
    /// Missing credentials and a missing regional endpoint become sticky
    /// capability errors. Any other connector failure fails construction.
    pub fn new(config: &SessionConfig, connector: &dyn Connector) -> Result<Self, ProviderError> {
        let container = if config.has_bluemix_credentials() {
            match connector.container(config) {
                Ok(clients) => Ok(clients),
                Err(ApiError::ServiceEndpoint(reason)) => {
                    info!(
                        "Container service unavailable in region '{}': {reason}",
                        config.region
                    );
                    Err(SessionError::ServiceUnavailableInRegion(config.region.clone()))
                }
                Err(source) => {
                    return Err(ProviderError::Configure {
                        service: "container service",
                        source,
                    });
                }
            }
        } else {
            debug!("No API key configured, container capabilities disabled");
            Err(SessionError::EmptyBluemixCredentials)
        };

        let infrastructure = if config.has_softlayer_credentials() {
            let clients =
                connector
                    .infrastructure(config)
                    .map_err(|source| ProviderError::Configure {
                        service: "infrastructure",
                        source,
                    })?;
            Ok(clients)
        } else {
            debug!("No infrastructure credentials configured, ordering disabled");
            Err(SessionError::EmptySoftLayerCredentials)
        };

        Ok(Self {
            container,
            infrastructure,
            retry: RetryPolicy::from_config(config),
        })
    }

    /// Retry policy for mutating calls
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn container(&self) -> Result<&ContainerClients, SessionError> {
        self.container.as_ref().map_err(Clone::clone)
    }

    fn infrastructure(&self) -> Result<&InfrastructureClients, SessionError> {
        self.infrastructure.as_ref().map_err(Clone::clone)
    }

    pub fn clusters(&self) -> Result<Arc<dyn Clusters>, SessionError> {
        self.container().map(|c| Arc::clone(&c.clusters))
    }

    pub fn workers(&self) -> Result<Arc<dyn Workers>, SessionError> {
        self.container().map(|c| Arc::clone(&c.workers))
    }

    pub fn subnets(&self) -> Result<Arc<dyn Subnets>, SessionError> {
        self.container().map(|c| Arc::clone(&c.subnets))
    }

    pub fn webhooks(&self) -> Result<Arc<dyn Webhooks>, SessionError> {
        self.container().map(|c| Arc::clone(&c.webhooks))
    }

    pub fn orders(&self) -> Result<Arc<dyn ProductOrders>, SessionError> {
        self.infrastructure().map(|i| Arc::clone(&i.orders))
    }

    pub fn network_storage(&self) -> Result<Arc<dyn NetworkStorage>, SessionError> {
        self.infrastructure().map(|i| Arc::clone(&i.network_storage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeCloud, FakeConnector};

    fn config() -> SessionConfig {
        SessionConfig {
            bluemix_api_key: "key".to_string(),
            softlayer_username: "ops".to_string(),
            softlayer_api_key: "sl-key".to_string(),
            region: "eu-de".to_string(),
            ..SessionConfig::default()
        }
    }

    #[test]
    fn test_all_capabilities_configured() {
        let connector = FakeConnector::new(FakeCloud::shared());
        let session = ClientSession::new(&config(), &connector).unwrap();

        assert!(session.clusters().is_ok());
        assert!(session.workers().is_ok());
        assert!(session.orders().is_ok());
        assert!(session.network_storage().is_ok());
    }

    #[test]
    fn test_missing_api_key_is_sticky() {
        let connector = FakeConnector::new(FakeCloud::shared());
        let session = ClientSession::new(
            &SessionConfig {
                bluemix_api_key: String::new(),
                ..config()
            },
            &connector,
        )
        .unwrap();

        for _ in 0..2 {
            assert_eq!(
                session.clusters().err(),
                Some(SessionError::EmptyBluemixCredentials)
            );
            assert_eq!(
                session.webhooks().err(),
                Some(SessionError::EmptyBluemixCredentials)
            );
        }
        assert!(session.orders().is_ok());
        assert_eq!(connector.container_calls(), 0);
    }

    #[test]
    fn test_missing_softlayer_credentials() {
        let connector = FakeConnector::new(FakeCloud::shared());
        let session = ClientSession::new(
            &SessionConfig {
                softlayer_api_key: String::new(),
                ..config()
            },
            &connector,
        )
        .unwrap();

        assert_eq!(
            session.network_storage().err(),
            Some(SessionError::EmptySoftLayerCredentials)
        );
        assert!(session.clusters().is_ok());
    }

    #[test]
    fn test_missing_endpoint_is_region_error() {
        let connector = FakeConnector::new(FakeCloud::shared())
            .failing_container(ApiError::ServiceEndpoint("no endpoint".to_string()));
        let session = ClientSession::new(&config(), &connector).unwrap();

        let err = session.subnets().err().unwrap();
        assert_eq!(
            err,
            SessionError::ServiceUnavailableInRegion("eu-de".to_string())
        );
        assert!(err.to_string().contains("'eu-de'"));
        assert_eq!(connector.container_calls(), 1);
        assert!(session.workers().is_err());
        assert_eq!(connector.container_calls(), 1);
    }

    #[test]
    fn test_other_connector_error_fails_session() {
        let connector = FakeConnector::new(FakeCloud::shared())
            .failing_container(ApiError::Transport("tls handshake".to_string()));
        let result = ClientSession::new(&config(), &connector);
        assert!(matches!(
            result,
            Err(ProviderError::Configure {
                service: "container service",
                ..
            })
        ));
    }
}
