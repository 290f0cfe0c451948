// Merging compiled routes and provisioning them through the in-memory adapters
#[cfg(test)]
mod test {
    use std::{collections::BTreeMap, sync::Arc};

    use routeforge::{
        ClassRegistry, InMemoryClassRegistry, InMemoryRouteStore, Provisioner, RouteMerger,
        RouteStore, RouteValidator,
        config::models::{PresetConfig, RouteConfig, RouteDocument, RouteSpec},
        core::{ProvisionError, ValidationError, route::PathMatchMode},
    };

    fn record(name: &str, host: &str, presets: Vec<PresetConfig>) -> RouteSpec {
        RouteSpec {
            route: RouteConfig {
                name: name.to_string(),
                namespace: "shop".to_string(),
                host: host.to_string(),
                path: "/".to_string(),
                service_name: name.to_string(),
                service_port: 8080,
                tls_secret: None,
                policies: BTreeMap::from([("proxy-read-timeout".to_string(), name.to_string())]),
            },
            presets,
        }
    }

    fn document() -> RouteDocument {
        RouteDocument {
            routes: vec![
                record(
                    "web",
                    "shop.example.com",
                    vec![PresetConfig::Tls {
                        secret: "shop-tls".to_string(),
                    }],
                ),
                record(
                    "api",
                    "api.example.com",
                    vec![PresetConfig::PathRewrite {
                        target: "/".to_string(),
                    }],
                ),
            ],
            ..RouteDocument::default()
        }
    }

    #[test]
    fn test_merge_compiled_document() {
        let routes = document().compile().unwrap();
        let merged = RouteMerger::merge(&routes).unwrap();

        assert_eq!(merged.name, "web-merged");
        assert_eq!(merged.rules.len(), 2);
        assert_eq!(merged.tls.len(), 1);
        assert_eq!(merged.rules[1].path_match_mode, PathMatchMode::PatternMatch);
        // Later inputs win for shared directives.
        assert_eq!(merged.policy("proxy-read-timeout"), Some("api"));
        assert_eq!(RouteValidator::validate(&merged), Ok(()));
    }

    #[test]
    fn test_merge_of_single_route_keeps_its_content() {
        let routes = document().compile().unwrap();
        let merged = RouteMerger::merge(&routes[..1]).unwrap();

        assert_eq!(merged.rules, routes[0].rules);
        assert_eq!(merged.policies, routes[0].policies);
        assert_eq!(merged.tls, routes[0].tls);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_provision_document() {
        let document = document();
        let registry = InMemoryClassRegistry::new();
        registry
            .ensure_class(&document.settings.legacy_class, &document.settings.controller)
            .await
            .unwrap();

        let store = Arc::new(InMemoryRouteStore::new());
        let provisioner = Provisioner::new(store.clone());
        for route in document.compile().unwrap() {
            provisioner.provision(&route).await.unwrap();
        }

        let names: Vec<_> = store
            .list("shop")
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(names, vec!["api", "web"]);
        assert!(registry.get_class("nginx").await.is_ok());
    }

    #[tokio::test]
    async fn test_provision_rejects_invalid_route() {
        let mut route = document().compile().unwrap().remove(0);
        route.rules[0].backends[0].port = 0;

        let store = Arc::new(InMemoryRouteStore::new());
        let result = Provisioner::new(store.clone()).provision(&route).await;
        assert_eq!(
            result,
            Err(ProvisionError::Validation(ValidationError::InvalidBackend {
                path: "/".to_string()
            }))
        );
        assert!(store.list("shop").await.unwrap().is_empty());
    }
}
