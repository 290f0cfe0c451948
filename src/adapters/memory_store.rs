//! In-memory implementations of the collaborator ports.
//!
//! Used by the CLI `provision` command and by tests. Both adapters are backed
//! by `scc::HashMap` so they can be shared across tasks without extra locking.
use async_trait::async_trait;
use scc::HashMap;

use crate::{
    core::route::Route,
    ports::{
        class_registry::{ClassRegistry, ClassRegistryError, ClassRegistryResult, RouteClass},
        route_store::{RouteStore, StoreError, StoreResult},
    },
};

type RouteKey = (String, String);

fn key(namespace: &str, name: &str) -> RouteKey {
    (namespace.to_string(), name.to_string())
}

/// Route store holding routes keyed by namespace and name.
#[derive(Default)]
pub struct InMemoryRouteStore {
    routes: HashMap<RouteKey, Route>,
}

impl InMemoryRouteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[async_trait]
impl RouteStore for InMemoryRouteStore {
    async fn create(&self, route: &Route) -> StoreResult<Route> {
        let route_key = key(&route.namespace, &route.name);
        if self
            .routes
            .insert_async(route_key, route.clone())
            .await
            .is_err()
        {
            return Err(StoreError::Conflict {
                namespace: route.namespace.clone(),
                name: route.name.clone(),
            });
        }
        tracing::debug!(route = %route.name, namespace = %route.namespace, "route created");
        Ok(route.clone())
    }

    async fn update(&self, route: &Route) -> StoreResult<Route> {
        match self
            .routes
            .get_async(&key(&route.namespace, &route.name))
            .await
        {
            Some(mut entry) => {
                *entry.get_mut() = route.clone();
                tracing::debug!(route = %route.name, namespace = %route.namespace, "route updated");
                Ok(route.clone())
            }
            None => Err(StoreError::NotFound {
                namespace: route.namespace.clone(),
                name: route.name.clone(),
            }),
        }
    }

    async fn delete(&self, namespace: &str, name: &str) -> StoreResult<()> {
        match self.routes.remove_async(&key(namespace, name)).await {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            }),
        }
    }

    async fn get(&self, namespace: &str, name: &str) -> StoreResult<Route> {
        self.routes
            .get_async(&key(namespace, name))
            .await
            .map(|entry| entry.get().clone())
            .ok_or_else(|| StoreError::NotFound {
                namespace: namespace.to_string(),
                name: name.to_string(),
            })
    }

    async fn list(&self, namespace: &str) -> StoreResult<Vec<Route>> {
        let mut routes = Vec::new();
        self.routes
            .retain_async(|(ns, _), route| {
                if ns == namespace {
                    routes.push(route.clone());
                }
                true
            })
            .await;
        routes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(routes)
    }
}

/// Class registry holding classes by name.
#[derive(Default)]
pub struct InMemoryClassRegistry {
    classes: HashMap<String, RouteClass>,
}

impl InMemoryClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

#[async_trait]
impl ClassRegistry for InMemoryClassRegistry {
    async fn get_class(&self, name: &str) -> ClassRegistryResult<RouteClass> {
        self.classes
            .get_async(name)
            .await
            .map(|entry| entry.get().clone())
            .ok_or_else(|| ClassRegistryError::NotFound(name.to_string()))
    }

    async fn create_class(&self, class: RouteClass) -> ClassRegistryResult<RouteClass> {
        let name = class.name.clone();
        self.classes
            .insert_async(name.clone(), class.clone())
            .await
            .map_err(|_| ClassRegistryError::AlreadyExists(name))?;
        Ok(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::route::{RouteRule, WeightedBackend};

    fn route(namespace: &str, name: &str) -> Route {
        let mut route = Route::new(name, namespace);
        route.class_ref = Some("nginx".to_string());
        route.rules.push(RouteRule::new(
            format!("{name}.example.com"),
            "/",
            WeightedBackend::full(name, 8080),
        ));
        route
    }

    #[tokio::test]
    async fn create_get_update_delete() {
        let store = InMemoryRouteStore::new();
        let original = route("shop", "web");

        store.create(&original).await.unwrap();
        assert_eq!(store.get("shop", "web").await.unwrap(), original);

        let mut changed = original.clone();
        changed.policies.insert("limit-rps".to_string(), "10".to_string());
        store.update(&changed).await.unwrap();
        assert_eq!(
            store.get("shop", "web").await.unwrap().policy("limit-rps"),
            Some("10")
        );

        store.delete("shop", "web").await.unwrap();
        assert!(matches!(
            store.get("shop", "web").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn duplicate_create_conflicts() {
        let store = InMemoryRouteStore::new();
        store.create(&route("shop", "web")).await.unwrap();
        assert!(matches!(
            store.create(&route("shop", "web")).await,
            Err(StoreError::Conflict { .. })
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn update_and_delete_missing_route() {
        let store = InMemoryRouteStore::new();
        assert!(matches!(
            store.update(&route("shop", "web")).await,
            Err(StoreError::NotFound { .. })
        ));
        assert!(matches!(
            store.delete("shop", "web").await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_is_scoped_and_sorted() {
        let store = InMemoryRouteStore::new();
        store.create(&route("shop", "web")).await.unwrap();
        store.create(&route("shop", "api")).await.unwrap();
        store.create(&route("admin", "dashboard")).await.unwrap();

        let names: Vec<_> = store
            .list("shop")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["api", "web"]);
    }

    #[tokio::test]
    async fn ensure_class_is_idempotent() {
        let registry = InMemoryClassRegistry::new();
        registry
            .ensure_class("nginx", "k8s.io/ingress-nginx")
            .await
            .unwrap();
        registry
            .ensure_class("nginx", "k8s.io/ingress-nginx")
            .await
            .unwrap();

        assert_eq!(registry.len(), 1);
        let class = registry.get_class("nginx").await.unwrap();
        assert_eq!(class.controller, "k8s.io/ingress-nginx");
        assert!(class.is_default);
    }

    #[tokio::test]
    async fn create_class_twice_reports_existing() {
        let registry = InMemoryClassRegistry::new();
        let class = RouteClass {
            name: "edge".to_string(),
            controller: "example.com/edge".to_string(),
            is_default: false,
        };
        registry.create_class(class.clone()).await.unwrap();
        assert_eq!(
            registry.create_class(class).await,
            Err(ClassRegistryError::AlreadyExists("edge".to_string()))
        );
    }
}
