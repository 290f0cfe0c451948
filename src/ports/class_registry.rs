use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A registered route class and the controller implementing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteClass {
    pub name: String,
    pub controller: String,
    #[serde(default)]
    pub is_default: bool,
}

/// Error type for class registration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ClassRegistryError {
    #[error("class '{0}' not found")]
    NotFound(String),

    #[error("class '{0}' already exists")]
    AlreadyExists(String),

    #[error("transport error: {0}")]
    Transport(String),
}

pub type ClassRegistryResult<T> = Result<T, ClassRegistryError>;

/// ClassRegistry defines the port for registering route classes.
#[async_trait]
pub trait ClassRegistry: Send + Sync + 'static {
    async fn get_class(&self, name: &str) -> ClassRegistryResult<RouteClass>;

    async fn create_class(&self, class: RouteClass) -> ClassRegistryResult<RouteClass>;

    /// Make sure `name` exists, creating it for `controller` if missing.
    ///
    /// Idempotent: an existing class, or losing a creation race, is success.
    async fn ensure_class(&self, name: &str, controller: &str) -> ClassRegistryResult<()> {
        match self.get_class(name).await {
            Ok(_) => Ok(()),
            Err(ClassRegistryError::NotFound(_)) => {
                let class = RouteClass {
                    name: name.to_string(),
                    controller: controller.to_string(),
                    is_default: true,
                };
                match self.create_class(class).await {
                    Ok(_) | Err(ClassRegistryError::AlreadyExists(_)) => {
                        tracing::info!(class = name, controller, "route class ensured");
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            }
            Err(e) => Err(e),
        }
    }
}
