//! Submit routes to a [`RouteStore`] after they pass validation.
use std::sync::Arc;

use tracing::Instrument;

use crate::{
    core::{
        route::Route,
        validator::{RouteValidator, ValidationError},
    },
    ports::route_store::{RouteStore, StoreError},
    tracing_setup::route_span,
};

#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ProvisionError {
    #[error("route failed validation: {0}")]
    Validation(#[from] ValidationError),

    #[error("route store rejected the route: {0}")]
    Store(#[from] StoreError),
}

pub type ProvisionResult<T> = Result<T, ProvisionError>;

/// Validates a route and hands it to the store.
///
/// Errors are returned as-is. There is no retry and nothing is rolled back.
pub struct Provisioner {
    store: Arc<dyn RouteStore>,
}

impl Provisioner {
    pub fn new(store: Arc<dyn RouteStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RouteStore> {
        &self.store
    }

    pub async fn provision(&self, route: &Route) -> ProvisionResult<Route> {
        let span = route_span(&route.namespace, &route.name);
        async {
            if let Err(e) = RouteValidator::validate(route) {
                tracing::warn!(error = %e, "refusing to submit invalid route");
                return Err(ProvisionError::Validation(e));
            }

            let created = self.store.create(route).await?;
            tracing::info!("route provisioned");
            Ok(created)
        }
        .instrument(span)
        .await
    }
}
