// End-to-end: build a TLS + HSTS route, validate it and check the translation order
#[cfg(test)]
mod test {
    use std::collections::BTreeMap;

    use routeforge::{
        RouteBuilder, RouteValidator, Translator,
        config::models::RouteConfig,
        core::directive::{self, PrimitiveFamily},
    };

    fn storefront() -> RouteConfig {
        RouteConfig {
            name: "storefront".to_string(),
            namespace: "shop".to_string(),
            host: "shop.example.com".to_string(),
            path: "/".to_string(),
            service_name: "web".to_string(),
            service_port: 8080,
            tls_secret: None,
            policies: BTreeMap::new(),
        }
    }

    #[test]
    fn test_tls_and_hsts_route() {
        let route = RouteBuilder::default()
            .basic_route(&storefront())
            .with_tls("shop-tls")
            .unwrap()
            .with_hsts(31_536_000, true)
            .unwrap();

        assert_eq!(route.tls.len(), 1);
        assert_eq!(route.tls[0].hosts, vec!["shop.example.com"]);
        assert_eq!(route.tls[0].secret_ref, "shop-tls");
        assert_eq!(RouteValidator::validate(&route), Ok(()));

        let entries = Translator::translate(&route);
        assert_eq!(entries.len(), route.policies.len());

        let position = |key: &str| {
            entries
                .iter()
                .position(|e| e.directive_key == key)
                .unwrap_or_else(|| panic!("missing entry for {key}"))
        };
        let redirects = [
            position(directive::SSL_REDIRECT),
            position(directive::FORCE_SSL_REDIRECT),
        ];
        let hsts = [
            position(directive::HSTS),
            position(directive::HSTS_MAX_AGE),
            position(directive::HSTS_INCLUDE_SUBDOMAINS),
        ];
        for redirect in redirects {
            for header in hsts {
                assert!(redirect < header);
            }
        }

        assert_eq!(entries[0].family, PrimitiveFamily::RedirectRule);
        let max_age = &entries[position(directive::HSTS_MAX_AGE)];
        assert_eq!(max_age.family, PrimitiveFamily::HeaderModifier);
        assert_eq!(max_age.rendered_params, "31536000s");
    }

    #[test]
    fn test_translation_is_deterministic() {
        let route = RouteBuilder::default()
            .basic_route(&storefront())
            .with_tls("shop-tls")
            .unwrap()
            .with_websocket_support()
            .with_path_rewrite("/")
            .unwrap();

        let first = Translator::translate(&route);
        let second = Translator::translate(&route.clone());
        assert_eq!(first, second);

        let ranks: Vec<u8> = first.iter().map(|e| e.family.priority()).collect();
        let mut sorted = ranks.clone();
        sorted.sort();
        assert_eq!(ranks, sorted);
    }

    #[test]
    fn test_translation_serializes_to_json() {
        let route = RouteBuilder::default()
            .basic_route(&storefront())
            .with_tls("shop-tls")
            .unwrap();

        let json = serde_json::to_value(Translator::translate(&route)).unwrap();
        let first = &json[0];
        assert_eq!(first["family"], "RedirectRule");
        assert!(first["directiveKey"].is_string());
        assert!(first["renderedParams"].is_string());
    }
}
