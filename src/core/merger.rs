//! Combine several routes into one.
//!
//! Precedence is positional: identity and class come from the first input,
//! rules and TLS bindings are concatenated in input order, and policy
//! directives are last-writer-wins. The merged route is not validated here.
use crate::core::route::Route;

/// Suffix appended to the first input's name.
pub const MERGED_NAME_SUFFIX: &str = "-merged";

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum MergeError {
    #[error("cannot merge an empty list of routes")]
    EmptyInput,
}

pub struct RouteMerger;

impl RouteMerger {
    pub fn merge(routes: &[Route]) -> Result<Route, MergeError> {
        let Some(first) = routes.first() else {
            return Err(MergeError::EmptyInput);
        };

        let mut merged = Route::new(
            format!("{}{MERGED_NAME_SUFFIX}", first.name),
            &first.namespace,
        );
        merged.class_ref = first.class_ref.clone();

        for route in routes {
            if route.class_ref.is_some() && route.class_ref != merged.class_ref {
                tracing::debug!(
                    route = %route.name,
                    ignored = ?route.class_ref,
                    kept = ?merged.class_ref,
                    "class reference of later input ignored"
                );
            }

            merged.rules.extend(route.rules.iter().cloned());
            merged.tls.extend(route.tls.iter().cloned());
            if merged.default_backend.is_none() {
                merged.default_backend = route.default_backend.clone();
            }
            for (key, value) in &route.policies {
                merged.policies.insert(key.clone(), value.clone());
            }
        }

        tracing::info!(
            route = %merged.name,
            inputs = routes.len(),
            rules = merged.rules.len(),
            "merged routes"
        );
        Ok(merged.canonicalized())
    }
}
