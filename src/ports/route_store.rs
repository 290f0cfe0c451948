use async_trait::async_trait;
use thiserror::Error;

use crate::core::route::Route;

/// Errors reported by a route store. The core propagates them unchanged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// No route with this namespace/name exists
    #[error("route {namespace}/{name} not found")]
    NotFound { namespace: String, name: String },

    /// A route with this namespace/name already exists, or the update raced
    #[error("route {namespace}/{name} conflicts with an existing resource")]
    Conflict { namespace: String, name: String },

    /// The store could not be reached
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for route store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// RouteStore defines the port (interface) for persisting routes in a
/// remote control plane. Persistence is all-or-nothing per call.
#[async_trait]
pub trait RouteStore: Send + Sync + 'static {
    /// Create a new route; fails with `Conflict` if it already exists
    async fn create(&self, route: &Route) -> StoreResult<Route>;

    /// Replace an existing route; fails with `NotFound` if it does not exist
    async fn update(&self, route: &Route) -> StoreResult<Route>;

    /// Delete a route by namespace and name
    async fn delete(&self, namespace: &str, name: &str) -> StoreResult<()>;

    /// Fetch a single route
    async fn get(&self, namespace: &str, name: &str) -> StoreResult<Route>;

    /// List every route in a namespace, ordered by name
    async fn list(&self, namespace: &str) -> StoreResult<Vec<Route>>;
}
