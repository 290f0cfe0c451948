//! Configuration data structures for route documents.
//!
//! A document is a list of route records plus compiler settings. These types map
//! directly to YAML (also JSON / TOML) files and carry serde defaults so that a
//! minimal record only names the route, host and backend service.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::{
    builder::{AuthKind, BuilderSettings, ConfigResult, CorsPolicy, RateLimit, RouteBuilder},
    route::{DEFAULT_PATH, Route, WeightedBackend},
};

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_legacy_class() -> String {
    "nginx".to_string()
}

fn default_controller() -> String {
    "k8s.io/ingress-nginx".to_string()
}

fn default_deprecated_classes() -> Vec<String> {
    vec![default_legacy_class()]
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Flat description of a single host/path route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteConfig {
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_path")]
    pub path: String,
    pub service_name: String,
    pub service_port: u32,
    /// Secret holding the certificate; when set the route gets a TLS binding.
    #[serde(default)]
    pub tls_secret: Option<String>,
    /// Extra directives copied verbatim onto the route.
    #[serde(default)]
    pub policies: BTreeMap<String, String>,
}

/// A named capability applied on top of the base route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresetConfig {
    Tls {
        secret: String,
    },
    PathRewrite {
        target: String,
    },
    Canary {
        service_name: String,
        port: u32,
        weight: i64,
    },
    CanaryHeader {
        header: String,
        value: String,
    },
    Auth {
        kind: String,
        #[serde(default)]
        params: BTreeMap<String, String>,
    },
    Affinity {
        cookie_name: String,
        max_age_secs: i64,
    },
    RateLimit(RateLimit),
    Cors(CorsPolicy),
    Headers {
        headers: BTreeMap<String, String>,
    },
    Hsts {
        max_age_secs: i64,
        #[serde(default)]
        include_subdomains: bool,
    },
    IpAllowList {
        cidrs: Vec<String>,
    },
    Websocket,
    ProxyTimeouts {
        #[serde(default)]
        read_secs: Option<u64>,
        #[serde(default)]
        send_secs: Option<u64>,
        #[serde(default)]
        connect_secs: Option<u64>,
    },
    BodySize {
        size: String,
    },
    ServerSnippet {
        snippet: String,
    },
    Directive {
        key: String,
        value: String,
    },
}

impl PresetConfig {
    /// Apply this preset to `route`, returning the new route.
    pub fn apply(&self, route: &Route) -> ConfigResult<Route> {
        match self {
            PresetConfig::Tls { secret } => route.with_tls(secret),
            PresetConfig::PathRewrite { target } => route.with_path_rewrite(target),
            PresetConfig::Canary {
                service_name,
                port,
                weight,
            } => route.with_canary(&WeightedBackend::full(service_name, *port), *weight),
            PresetConfig::CanaryHeader { header, value } => route.with_canary_header(header, value),
            PresetConfig::Auth { kind, params } => {
                route.with_auth(kind.parse::<AuthKind>()?, params)
            }
            PresetConfig::Affinity {
                cookie_name,
                max_age_secs,
            } => route.with_affinity(cookie_name, *max_age_secs),
            PresetConfig::RateLimit(limit) => route.with_rate_limit(*limit),
            PresetConfig::Cors(cors) => route.with_cors(cors),
            PresetConfig::Headers { headers } => route.with_headers(headers),
            PresetConfig::Hsts {
                max_age_secs,
                include_subdomains,
            } => route.with_hsts(*max_age_secs, *include_subdomains),
            PresetConfig::IpAllowList { cidrs } => route.with_ip_allow_list(cidrs),
            PresetConfig::Websocket => Ok(route.with_websocket_support()),
            PresetConfig::ProxyTimeouts {
                read_secs,
                send_secs,
                connect_secs,
            } => route.with_proxy_timeouts(*read_secs, *send_secs, *connect_secs),
            PresetConfig::BodySize { size } => route.with_body_size(size),
            PresetConfig::ServerSnippet { snippet } => route.with_server_snippet(snippet),
            PresetConfig::Directive { key, value } => route.with_directive(key, value.clone()),
        }
    }
}

/// One route record in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    #[serde(flatten)]
    pub route: RouteConfig,
    #[serde(default)]
    pub presets: Vec<PresetConfig>,
}

impl RouteSpec {
    /// Build the base route and apply presets in document order.
    pub fn compile(&self, builder: &RouteBuilder) -> ConfigResult<Route> {
        self.presets
            .iter()
            .try_fold(builder.from_config(&self.route)?, |route, preset| {
                preset.apply(&route)
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive, e.g. `info` or `routeforge=debug`.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Settings that apply to every route in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Class assigned to routes built from records.
    pub legacy_class: String,
    /// Controller registered for the class when provisioning.
    pub controller: String,
    /// Class names reported as deprecated by the advisory pass.
    pub deprecated_classes: Vec<String>,
    pub logging: LoggingSettings,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            legacy_class: default_legacy_class(),
            controller: default_controller(),
            deprecated_classes: default_deprecated_classes(),
            logging: LoggingSettings::default(),
        }
    }
}

impl CompilerSettings {
    pub fn builder_settings(&self) -> BuilderSettings {
        BuilderSettings {
            legacy_class: self.legacy_class.clone(),
        }
    }

    pub fn route_builder(&self) -> RouteBuilder {
        RouteBuilder::new(self.builder_settings())
    }
}

/// Top-level route document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDocument {
    #[serde(default)]
    pub settings: CompilerSettings,
    #[serde(default)]
    pub routes: Vec<RouteSpec>,
}

impl RouteDocument {
    /// Compile every record, stopping at the first configuration error.
    pub fn compile(&self) -> ConfigResult<Vec<Route>> {
        let builder = self.settings.route_builder();
        self.routes.iter().map(|spec| spec.compile(&builder)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{builder::ConfigError, directive};

    fn spec(presets: Vec<PresetConfig>) -> RouteSpec {
        RouteSpec {
            route: RouteConfig {
                name: "storefront".to_string(),
                namespace: "shop".to_string(),
                host: "shop.example.com".to_string(),
                path: "/".to_string(),
                service_name: "web".to_string(),
                service_port: 8080,
                tls_secret: None,
                policies: BTreeMap::new(),
            },
            presets,
        }
    }

    #[test]
    fn presets_apply_in_order() {
        let route = spec(vec![
            PresetConfig::Tls {
                secret: "shop-tls".to_string(),
            },
            PresetConfig::Hsts {
                max_age_secs: 31_536_000,
                include_subdomains: true,
            },
            PresetConfig::Websocket,
        ])
        .compile(&RouteBuilder::default())
        .unwrap();

        assert_eq!(route.tls.len(), 1);
        assert_eq!(route.policy(directive::HSTS_MAX_AGE), Some("31536000"));
        assert_eq!(route.policy(directive::PROXY_HTTP_VERSION), Some("1.1"));
    }

    #[test]
    fn first_failing_preset_aborts_compile() {
        let err = spec(vec![
            PresetConfig::Canary {
                service_name: "web-canary".to_string(),
                port: 8080,
                weight: 150,
            },
            PresetConfig::Websocket,
        ])
        .compile(&RouteBuilder::default())
        .unwrap_err();
        assert_eq!(err, ConfigError::WeightOutOfRange { weight: 150 });
    }

    #[test]
    fn unknown_auth_kind_is_a_config_error() {
        let err = spec(vec![PresetConfig::Auth {
            kind: "digest".to_string(),
            params: BTreeMap::new(),
        }])
        .compile(&RouteBuilder::default())
        .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownAuthKind { .. }));
    }

    #[test]
    fn settings_defaults() {
        let settings = CompilerSettings::default();
        assert_eq!(settings.legacy_class, "nginx");
        assert_eq!(settings.controller, "k8s.io/ingress-nginx");
        assert_eq!(settings.deprecated_classes, vec!["nginx"]);
        assert_eq!(settings.logging.level, "info");
        assert!(!settings.logging.json);
    }

    #[test]
    fn legacy_class_flows_into_routes() {
        let document = RouteDocument {
            settings: CompilerSettings {
                legacy_class: "edge".to_string(),
                ..CompilerSettings::default()
            },
            routes: vec![spec(Vec::new())],
        };
        let routes = document.compile().unwrap();
        assert_eq!(routes[0].class_ref.as_deref(), Some("edge"));
    }

    #[test]
    fn presets_deserialize_from_tagged_json() {
        let json = r#"[
            {"type": "path_rewrite", "target": "/"},
            {"type": "rate_limit", "rps": 10},
            {"type": "cors", "allow_origin": "https://app.example.com"},
            {"type": "websocket"}
        ]"#;
        let presets: Vec<PresetConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(
            presets[1],
            PresetConfig::RateLimit(RateLimit {
                rps: Some(10),
                ..RateLimit::default()
            })
        );
        assert_eq!(presets[3], PresetConfig::Websocket);
    }
}
