//! In-cluster service registry (§6): queried by well-known namespace+name
//! for the control-plane service's LoadBalancer ingress, which the
//! Discovery Publisher resolves into the published service URL.

use crate::error::Result;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct ServicePort {
    pub name: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct LoadBalancerIngress {
    pub hostname: String,
}

#[derive(Debug, Clone)]
pub struct ServiceStatus {
    pub ports: Vec<ServicePort>,
    pub ingress: Vec<LoadBalancerIngress>,
}

#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    /// Look up a service by well-known namespace+name. `Ok(None)` means
    /// the service object itself does not exist yet; an existing service
    /// with no populated ingress is returned as `Some` with an empty
    /// `ingress` vec, which callers treat as "not yet populated" too.
    async fn get_service(&self, namespace: &str, name: &str) -> Result<Option<ServiceStatus>>;
}

/// Resolve the service URL the Discovery Publisher publishes: select the
/// first LoadBalancer ingress hostname paired with `port_name`'s port.
/// `NotFound` if the ingress is not yet populated (§4.B).
pub async fn resolve_service_url(
    registry: &dyn ServiceRegistry,
    namespace: &str,
    name: &str,
    port_name: &str,
) -> Result<String> {
    use crate::error::CoreError;

    let service = registry
        .get_service(namespace, name)
        .await?
        .ok_or_else(|| CoreError::NotFound(format!("service {namespace}/{name}")))?;

    let port = service
        .ports
        .iter()
        .find(|p| p.name == port_name)
        .ok_or_else(|| {
            CoreError::NotFound(format!("port {port_name} on service {namespace}/{name}"))
        })?;

    let ingress = service
        .ingress
        .first()
        .ok_or_else(|| CoreError::NotFound(format!("ingress for service {namespace}/{name}")))?;

    Ok(format!("https://{}:{}", ingress.hostname, port.port))
}

pub mod mock {
    use super::*;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct MockServiceRegistry {
        service: RwLock<Option<ServiceStatus>>,
    }

    impl MockServiceRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn set(&self, status: Option<ServiceStatus>) {
            *self.service.write().await = status;
        }
    }

    #[async_trait]
    impl ServiceRegistry for MockServiceRegistry {
        async fn get_service(&self, _namespace: &str, _name: &str) -> Result<Option<ServiceStatus>> {
            Ok(self.service.read().await.clone())
        }
    }
}
