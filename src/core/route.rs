//! In-memory route entity graph.
//!
//! A [`Route`] is a plain value: construction never fails and no invariant is
//! enforced here. Partially built routes are legal while the builder composes
//! presets; [`crate::core::validator::RouteValidator`] is the only gate.
use std::{cmp::Ordering, collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

/// Default path used when a configuration leaves the path empty.
pub const DEFAULT_PATH: &str = "/";

/// How a rule's `path` is matched against request paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathMatchMode {
    Exact,
    #[default]
    PrefixMatch,
    /// The path is a regular expression with capture groups.
    PatternMatch,
}

impl fmt::Display for PathMatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMatchMode::Exact => write!(f, "exact"),
            PathMatchMode::PrefixMatch => write!(f, "prefix"),
            PathMatchMode::PatternMatch => write!(f, "pattern"),
        }
    }
}

/// A destination service and port with a relative traffic share.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeightedBackend {
    pub service_name: String,
    pub port: u32,
    /// `None` marks the remainder backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u32>,
}

impl WeightedBackend {
    pub fn new(service_name: impl Into<String>, port: u32, weight: Option<u32>) -> Self {
        Self {
            service_name: service_name.into(),
            port,
            weight,
        }
    }

    /// Backend carrying the whole traffic share.
    pub fn full(service_name: impl Into<String>, port: u32) -> Self {
        Self::new(service_name, port, Some(100))
    }

    /// Canonical ordering: descending weight, then service name, then port.
    /// Remainder backends sort after every weighted one.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        match (self.weight, other.weight) {
            (Some(a), Some(b)) => b.cmp(&a),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
        .then_with(|| self.service_name.cmp(&other.service_name))
        .then_with(|| self.port.cmp(&other.port))
    }
}

impl fmt::Display for WeightedBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.service_name, self.port)?;
        match self.weight {
            Some(w) => write!(f, " ({w}%)"),
            None => write!(f, " (remainder)"),
        }
    }
}

/// One host/path rule with its weighted backend set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRule {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_path")]
    pub path: String,
    #[serde(default)]
    pub path_match_mode: PathMatchMode,
    #[serde(default)]
    pub backends: Vec<WeightedBackend>,
}

fn default_path() -> String {
    DEFAULT_PATH.to_string()
}

impl RouteRule {
    pub fn new(host: impl Into<String>, path: impl Into<String>, backend: WeightedBackend) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            path_match_mode: PathMatchMode::PrefixMatch,
            backends: vec![backend],
        }
    }
}

/// TLS termination binding for a set of hostnames.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TlsBinding {
    pub hosts: Vec<String>,
    pub secret_ref: String,
}

/// A tenant traffic-routing intent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(default)]
    pub rules: Vec<RouteRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_backend: Option<WeightedBackend>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tls: Vec<TlsBinding>,
    #[serde(default)]
    pub policies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_ref: Option<String>,
}

impl Route {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    /// The first host/path rule, which presets operate on.
    pub fn primary_rule(&self) -> Option<&RouteRule> {
        self.rules.first()
    }

    pub(crate) fn primary_rule_mut(&mut self) -> Option<&mut RouteRule> {
        self.rules.first_mut()
    }

    /// Host of the primary rule; empty for default-backend routes.
    pub fn host(&self) -> &str {
        self.primary_rule().map_or("", |r| r.host.as_str())
    }

    pub fn path(&self) -> &str {
        self.primary_rule().map_or(DEFAULT_PATH, |r| r.path.as_str())
    }

    pub fn path_match_mode(&self) -> PathMatchMode {
        self.primary_rule()
            .map(|r| r.path_match_mode)
            .unwrap_or_default()
    }

    pub fn backends(&self) -> &[WeightedBackend] {
        self.primary_rule().map_or(&[], |r| r.backends.as_slice())
    }

    pub fn policy(&self, key: &str) -> Option<&str> {
        self.policies.get(key).map(String::as_str)
    }

    /// Copy of this route with every rule's backends in canonical order.
    pub fn canonicalized(&self) -> Route {
        let mut route = self.clone();
        for rule in &mut route.rules {
            rule.backends.sort_by(WeightedBackend::canonical_cmp);
        }
        route
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Route: {}/{}", self.namespace, self.name)?;
        if let Some(class) = &self.class_ref {
            writeln!(f, "  Class: {class}")?;
        }
        for rule in &self.rules {
            writeln!(f, "  Host: {}", rule.host)?;
            let backends = rule
                .backends
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            writeln!(
                f,
                "    Path: {} [{}] -> {}",
                rule.path, rule.path_match_mode, backends
            )?;
        }
        if let Some(backend) = &self.default_backend {
            writeln!(f, "  Default backend: {backend}")?;
        }
        for tls in &self.tls {
            writeln!(
                f,
                "  TLS: [{}] (secret: {})",
                tls.hosts.join(", "),
                tls.secret_ref
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_order_is_weight_desc_then_name() {
        let mut backends = vec![
            WeightedBackend::new("b", 80, Some(10)),
            WeightedBackend::new("rest", 80, None),
            WeightedBackend::new("a", 80, Some(10)),
            WeightedBackend::new("z", 80, Some(80)),
        ];
        backends.sort_by(WeightedBackend::canonical_cmp);

        let names: Vec<_> = backends.iter().map(|b| b.service_name.as_str()).collect();
        assert_eq!(names, vec!["z", "a", "b", "rest"]);
    }

    #[test]
    fn accessors_fall_back_without_rules() {
        let route = Route::new("fallback", "default");
        assert_eq!(route.host(), "");
        assert_eq!(route.path(), "/");
        assert_eq!(route.path_match_mode(), PathMatchMode::PrefixMatch);
        assert!(route.backends().is_empty());
    }

    #[test]
    fn display_summarizes_rules_and_tls() {
        let mut route = Route::new("storefront", "shop");
        route.class_ref = Some("nginx".to_string());
        route
            .rules
            .push(RouteRule::new("shop.example.com", "/", WeightedBackend::full("web", 8080)));
        route.tls.push(TlsBinding {
            hosts: vec!["shop.example.com".to_string()],
            secret_ref: "shop-tls".to_string(),
        });

        let summary = route.to_string();
        assert!(summary.starts_with("Route: shop/storefront\n"));
        assert!(summary.contains("  Class: nginx\n"));
        assert!(summary.contains("    Path: / [prefix] -> web:8080 (100%)\n"));
        assert!(summary.contains("  TLS: [shop.example.com] (secret: shop-tls)\n"));
    }

    #[test]
    fn serializes_with_spec_field_names() {
        let mut route = Route::new("api", "shop");
        route
            .rules
            .push(RouteRule::new("api.example.com", "/", WeightedBackend::full("api", 8080)));
        route.class_ref = Some("nginx".to_string());

        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["classRef"], "nginx");
        assert_eq!(json["rules"][0]["pathMatchMode"], "PrefixMatch");
        assert_eq!(json["rules"][0]["backends"][0]["serviceName"], "api");
    }
}
