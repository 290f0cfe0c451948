//! Route construction from flat configuration records and named presets.
//!
//! Every `with_*` preset borrows the input route and returns a new one, so a
//! base route can be reused across tenant variants without aliasing. Argument
//! problems surface as [`ConfigError`]; structural invariants are left to the
//! validator so intermediate routes may be incomplete.
use std::{collections::BTreeMap, fmt, str::FromStr};

use http::HeaderName;
use serde::{Deserialize, Serialize};

use crate::{
    config::models::RouteConfig,
    core::{
        directive,
        route::{DEFAULT_PATH, PathMatchMode, Route, RouteRule, TlsBinding, WeightedBackend},
    },
};

/// Suffix appended to a prefix path so that group 1 captures the separator
/// and group 2 the remainder.
pub const REWRITE_CAPTURE_SUFFIX: &str = "(/|$)(.*)";
/// Back-reference to the remainder capture group.
pub const REWRITE_REMAINDER_REF: &str = "$2";

const DEFAULT_AUTH_REALM: &str = "Authentication Required";
const WEBSOCKET_TIMEOUT_SECS: u64 = 3600;

/// Result type for builder operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Invalid arguments passed to a builder operation.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("TLS on route '{route}' requires a concrete host")]
    TlsRequiresHost { route: String },

    #[error("{operation} on route '{route}' requires a host/path rule with a backend")]
    NoRules {
        route: String,
        operation: &'static str,
    },

    #[error("canary weight {weight} is outside 0..=100")]
    WeightOutOfRange { weight: i64 },

    #[error("unknown auth kind '{kind}', expected 'basic' or 'external'")]
    UnknownAuthKind { kind: String },

    #[error("{operation} requires parameter '{parameter}'")]
    MissingParameter {
        operation: &'static str,
        parameter: &'static str,
    },

    #[error("invalid argument for {operation}: {message}")]
    InvalidArgument {
        operation: &'static str,
        message: String,
    },
}

impl ConfigError {
    fn invalid(operation: &'static str, message: impl Into<String>) -> Self {
        ConfigError::InvalidArgument {
            operation,
            message: message.into(),
        }
    }
}

/// Authentication preset kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    Basic,
    External,
}

impl FromStr for AuthKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(AuthKind::Basic),
            "external" => Ok(AuthKind::External),
            _ => Err(ConfigError::UnknownAuthKind {
                kind: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthKind::Basic => write!(f, "basic"),
            AuthKind::External => write!(f, "external"),
        }
    }
}

/// Auth preset parameters.
///
/// Basic: `secret` (required), `realm`.
/// External: `url` (required), `signin`, `response_headers`.
pub type AuthParams = BTreeMap<String, String>;

/// Request limits; at least one must be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimit {
    #[serde(default)]
    pub rps: Option<u32>,
    #[serde(default)]
    pub rpm: Option<u32>,
    #[serde(default)]
    pub connections: Option<u32>,
}

/// Cross-origin policy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorsPolicy {
    pub allow_origin: String,
    #[serde(default)]
    pub allow_methods: Vec<String>,
    #[serde(default)]
    pub allow_headers: Vec<String>,
}

/// Settings shared by every route a builder produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderSettings {
    /// Class assigned to routes built from configuration.
    pub legacy_class: String,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            legacy_class: "nginx".to_string(),
        }
    }
}

/// Produces base routes; presets are applied with the `Route::with_*` methods.
#[derive(Debug, Clone, Default)]
pub struct RouteBuilder {
    settings: BuilderSettings,
}

impl RouteBuilder {
    pub fn new(settings: BuilderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &BuilderSettings {
        &self.settings
    }

    /// Single prefix-match rule with one backend at weight 100.
    pub fn basic_route(&self, cfg: &RouteConfig) -> Route {
        let path = if cfg.path.is_empty() {
            DEFAULT_PATH
        } else {
            cfg.path.as_str()
        };

        let mut route = Route::new(&cfg.name, &cfg.namespace);
        route.class_ref = Some(self.settings.legacy_class.clone());
        route.rules.push(RouteRule::new(
            &cfg.host,
            path,
            WeightedBackend::full(&cfg.service_name, cfg.service_port),
        ));

        tracing::debug!(route = %route.name, namespace = %route.namespace, "built basic route");
        route
    }

    /// Basic route plus the record's policies and, when set, its TLS secret.
    pub fn from_config(&self, cfg: &RouteConfig) -> ConfigResult<Route> {
        let mut route = self.basic_route(cfg);
        route
            .policies
            .extend(cfg.policies.iter().map(|(k, v)| (k.clone(), v.clone())));

        match cfg.tls_secret.as_deref() {
            Some(secret) if !secret.is_empty() => route.with_tls(secret),
            _ => Ok(route),
        }
    }

    /// Hostless route that sends all traffic to one backend.
    pub fn default_backend_route(
        &self,
        name: &str,
        namespace: &str,
        service_name: &str,
        port: u32,
    ) -> Route {
        let mut route = Route::new(name, namespace);
        route.class_ref = Some(self.settings.legacy_class.clone());
        route.default_backend = Some(WeightedBackend::full(service_name, port));
        route
    }
}

impl Route {
    fn with_policies<'a>(&self, entries: impl IntoIterator<Item = (&'a str, String)>) -> Route {
        let mut route = self.clone();
        for (key, value) in entries {
            route.policies.insert(key.to_string(), value);
        }
        route
    }

    /// Record a single directive verbatim.
    pub fn with_directive(&self, key: &str, value: impl Into<String>) -> ConfigResult<Route> {
        if key.trim().is_empty() {
            return Err(ConfigError::invalid("with_directive", "directive key is empty"));
        }
        Ok(self.with_policies([(key, value.into())]))
    }

    /// Terminate TLS for the primary host and force HTTPS redirects.
    pub fn with_tls(&self, secret_ref: &str) -> ConfigResult<Route> {
        let host = self.host();
        if host.is_empty() {
            return Err(ConfigError::TlsRequiresHost {
                route: self.name.clone(),
            });
        }
        if secret_ref.trim().is_empty() {
            return Err(ConfigError::invalid("with_tls", "secret reference is empty"));
        }

        let mut route = self.with_policies([
            (directive::SSL_REDIRECT, "true".to_string()),
            (directive::FORCE_SSL_REDIRECT, "true".to_string()),
            (directive::SSL_PASSTHROUGH, "false".to_string()),
        ]);
        route.tls = vec![TlsBinding {
            hosts: vec![host.to_string()],
            secret_ref: secret_ref.to_string(),
        }];

        tracing::debug!(route = %route.name, host, "applied TLS preset");
        Ok(route)
    }

    /// Turn the primary path into a capture-group pattern and rewrite to
    /// `target_prefix` followed by the remainder group.
    ///
    /// `/api` becomes `/api(/|$)(.*)` and a target of `/` becomes `/$2`.
    /// Applying it to an already rewritten path returns the route unchanged.
    pub fn with_path_rewrite(&self, target_prefix: &str) -> ConfigResult<Route> {
        if !target_prefix.starts_with('/') {
            return Err(ConfigError::invalid(
                "with_path_rewrite",
                format!("rewrite target '{target_prefix}' must start with '/'"),
            ));
        }

        let Some(rule) = self.primary_rule() else {
            return Err(ConfigError::NoRules {
                route: self.name.clone(),
                operation: "with_path_rewrite",
            });
        };
        if rule.path.ends_with(REWRITE_CAPTURE_SUFFIX) {
            tracing::debug!(route = %self.name, path = %rule.path, "path already rewritten");
            return Ok(self.clone());
        }

        let mut route = self.with_policies([
            (
                directive::REWRITE_TARGET,
                format!("{target_prefix}{REWRITE_REMAINDER_REF}"),
            ),
            (directive::USE_REGEX, "true".to_string()),
        ]);
        if let Some(rule) = route.primary_rule_mut() {
            rule.path = format!("{}{REWRITE_CAPTURE_SUFFIX}", rule.path);
            rule.path_match_mode = PathMatchMode::PatternMatch;
        }
        Ok(route)
    }

    /// Split the primary rule between its current backend and `canary`.
    ///
    /// The primary keeps `100 - weight_percent` clamped to `0..=100`; the sum
    /// is not enforced afterwards.
    pub fn with_canary(
        &self,
        canary: &WeightedBackend,
        weight_percent: i64,
    ) -> ConfigResult<Route> {
        if !(0..=100).contains(&weight_percent) {
            return Err(ConfigError::WeightOutOfRange {
                weight: weight_percent,
            });
        }

        let primary = self
            .backends()
            .first()
            .ok_or_else(|| ConfigError::NoRules {
                route: self.name.clone(),
                operation: "with_canary",
            })?;
        let primary_weight = (100 - weight_percent).clamp(0, 100);

        let backends = vec![
            WeightedBackend {
                weight: Some(primary_weight as u32),
                ..primary.clone()
            },
            WeightedBackend {
                weight: Some(weight_percent as u32),
                ..canary.clone()
            },
        ];

        let mut route = self.with_policies([
            (directive::CANARY, "true".to_string()),
            (directive::CANARY_WEIGHT, weight_percent.to_string()),
        ]);
        if let Some(rule) = route.primary_rule_mut() {
            rule.backends = backends;
        }

        tracing::debug!(
            route = %route.name,
            canary = %canary.service_name,
            weight = weight_percent,
            "applied canary preset"
        );
        Ok(route)
    }

    /// Route requests carrying `header: value` to the canary.
    pub fn with_canary_header(&self, header: &str, value: &str) -> ConfigResult<Route> {
        validate_header_name("with_canary_header", header)?;
        Ok(self.with_policies([
            (directive::CANARY_BY_HEADER, header.to_string()),
            (directive::CANARY_BY_HEADER_VALUE, value.to_string()),
        ]))
    }

    pub fn with_auth(&self, kind: AuthKind, params: &AuthParams) -> ConfigResult<Route> {
        let param = |name: &str| {
            params
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };

        match kind {
            AuthKind::Basic => {
                let secret = param("secret").ok_or(ConfigError::MissingParameter {
                    operation: "with_auth(basic)",
                    parameter: "secret",
                })?;
                let realm = param("realm").unwrap_or(DEFAULT_AUTH_REALM);
                Ok(self.with_policies([
                    (directive::AUTH_TYPE, kind.to_string()),
                    (directive::AUTH_SECRET, secret.to_string()),
                    (directive::AUTH_REALM, realm.to_string()),
                ]))
            }
            AuthKind::External => {
                let url = param("url").ok_or(ConfigError::MissingParameter {
                    operation: "with_auth(external)",
                    parameter: "url",
                })?;
                validate_http_url("with_auth(external)", url)?;

                let mut entries = vec![(directive::AUTH_URL, url.to_string())];
                if let Some(signin) = param("signin") {
                    entries.push((directive::AUTH_SIGNIN, signin.to_string()));
                }
                if let Some(headers) = param("response_headers") {
                    entries.push((directive::AUTH_RESPONSE_HEADERS, headers.to_string()));
                }
                Ok(self.with_policies(entries))
            }
        }
    }

    /// Cookie-based session affinity.
    pub fn with_affinity(&self, cookie_name: &str, max_age_seconds: i64) -> ConfigResult<Route> {
        if cookie_name.trim().is_empty() {
            return Err(ConfigError::invalid("with_affinity", "cookie name is empty"));
        }
        if max_age_seconds <= 0 {
            return Err(ConfigError::invalid(
                "with_affinity",
                format!("max age must be greater than 0, got {max_age_seconds}"),
            ));
        }

        Ok(self.with_policies([
            (directive::AFFINITY, "cookie".to_string()),
            (directive::AFFINITY_MODE, "persistent".to_string()),
            (directive::SESSION_COOKIE_NAME, cookie_name.to_string()),
            (directive::SESSION_COOKIE_MAX_AGE, max_age_seconds.to_string()),
        ]))
    }

    pub fn with_rate_limit(&self, limit: RateLimit) -> ConfigResult<Route> {
        let entries: Vec<_> = [
            (directive::LIMIT_RPS, limit.rps),
            (directive::LIMIT_RPM, limit.rpm),
            (directive::LIMIT_CONNECTIONS, limit.connections),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v)))
        .collect();

        if entries.is_empty() {
            return Err(ConfigError::invalid(
                "with_rate_limit",
                "at least one of rps, rpm or connections must be set",
            ));
        }
        if let Some((key, _)) = entries.iter().find(|(_, v)| *v == 0) {
            return Err(ConfigError::invalid(
                "with_rate_limit",
                format!("{key} must be greater than 0"),
            ));
        }

        Ok(self.with_policies(entries.into_iter().map(|(k, v)| (k, v.to_string()))))
    }

    pub fn with_cors(&self, cors: &CorsPolicy) -> ConfigResult<Route> {
        if cors.allow_origin.trim().is_empty() {
            return Err(ConfigError::invalid("with_cors", "allowed origin is empty"));
        }

        let mut entries = vec![
            (directive::ENABLE_CORS, "true".to_string()),
            (directive::CORS_ALLOW_ORIGIN, cors.allow_origin.clone()),
        ];
        if !cors.allow_methods.is_empty() {
            entries.push((directive::CORS_ALLOW_METHODS, cors.allow_methods.join(", ")));
        }
        if !cors.allow_headers.is_empty() {
            for header in &cors.allow_headers {
                validate_header_name("with_cors", header)?;
            }
            entries.push((directive::CORS_ALLOW_HEADERS, cors.allow_headers.join(", ")));
        }
        Ok(self.with_policies(entries))
    }

    /// Response headers, recorded as a snippet of `more_set_headers` lines in
    /// header-name order.
    pub fn with_headers(&self, headers: &BTreeMap<String, String>) -> ConfigResult<Route> {
        if headers.is_empty() {
            return Err(ConfigError::invalid("with_headers", "no headers given"));
        }

        let mut snippet = String::new();
        for (name, value) in headers {
            validate_header_name("with_headers", name)?;
            if value.contains('"') || value.contains('\n') {
                return Err(ConfigError::invalid(
                    "with_headers",
                    format!("value for header '{name}' contains a quote or newline"),
                ));
            }
            snippet.push_str(&format!("more_set_headers \"{name}: {value}\";\n"));
        }
        Ok(self.with_policies([(directive::CONFIGURATION_SNIPPET, snippet)]))
    }

    /// HTTP Strict Transport Security.
    pub fn with_hsts(&self, max_age_seconds: i64, include_subdomains: bool) -> ConfigResult<Route> {
        if max_age_seconds < 0 {
            return Err(ConfigError::invalid(
                "with_hsts",
                format!("max age must not be negative, got {max_age_seconds}"),
            ));
        }

        let mut entries = vec![
            (directive::HSTS, "true".to_string()),
            (directive::HSTS_MAX_AGE, max_age_seconds.to_string()),
        ];
        if include_subdomains {
            entries.push((directive::HSTS_INCLUDE_SUBDOMAINS, "true".to_string()));
        }
        Ok(self.with_policies(entries))
    }

    /// Restrict source ranges. Entries are stored verbatim; CIDR syntax is not
    /// checked here.
    pub fn with_ip_allow_list<S: AsRef<str>>(&self, cidrs: &[S]) -> ConfigResult<Route> {
        let ranges: Vec<&str> = cidrs
            .iter()
            .map(|c| c.as_ref().trim())
            .filter(|c| !c.is_empty())
            .collect();
        if ranges.is_empty() {
            return Err(ConfigError::invalid(
                "with_ip_allow_list",
                "at least one CIDR range is required",
            ));
        }
        Ok(self.with_policies([(directive::WHITELIST_SOURCE_RANGE, ranges.join(", "))]))
    }

    /// HTTP/1.1 upstreams with long read/send timeouts.
    pub fn with_websocket_support(&self) -> Route {
        self.with_policies([
            (directive::PROXY_HTTP_VERSION, "1.1".to_string()),
            (directive::PROXY_READ_TIMEOUT, WEBSOCKET_TIMEOUT_SECS.to_string()),
            (directive::PROXY_SEND_TIMEOUT, WEBSOCKET_TIMEOUT_SECS.to_string()),
        ])
    }

    /// Upstream timeouts in seconds; `None` leaves the directive untouched.
    pub fn with_proxy_timeouts(
        &self,
        read: Option<u64>,
        send: Option<u64>,
        connect: Option<u64>,
    ) -> ConfigResult<Route> {
        let entries: Vec<_> = [
            (directive::PROXY_READ_TIMEOUT, read),
            (directive::PROXY_SEND_TIMEOUT, send),
            (directive::PROXY_CONNECT_TIMEOUT, connect),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.map(|v| (key, v.to_string())))
        .collect();

        if entries.is_empty() {
            return Err(ConfigError::invalid(
                "with_proxy_timeouts",
                "at least one timeout must be set",
            ));
        }
        Ok(self.with_policies(entries))
    }

    /// Maximum request body size, e.g. `25m`.
    pub fn with_body_size(&self, size: &str) -> ConfigResult<Route> {
        if parse_size(size).is_none() {
            return Err(ConfigError::invalid(
                "with_body_size",
                format!("'{size}' is not a byte size like 512k, 25m or 1g that fits in 64 bits"),
            ));
        }
        Ok(self.with_policies([(directive::PROXY_BODY_SIZE, size.trim().to_string())]))
    }

    /// Raw server snippet, passed through untranslated.
    pub fn with_server_snippet(&self, snippet: &str) -> ConfigResult<Route> {
        if snippet.trim().is_empty() {
            return Err(ConfigError::invalid("with_server_snippet", "snippet is empty"));
        }
        Ok(self.with_policies([(directive::SERVER_SNIPPET, snippet.to_string())]))
    }
}

fn validate_header_name(operation: &'static str, name: &str) -> ConfigResult<()> {
    HeaderName::from_bytes(name.as_bytes())
        .map(|_| ())
        .map_err(|e| ConfigError::invalid(operation, format!("invalid header name '{name}': {e}")))
}

fn validate_http_url(operation: &'static str, raw: &str) -> ConfigResult<()> {
    let parsed = url::Url::parse(raw)
        .map_err(|e| ConfigError::invalid(operation, format!("invalid URL '{raw}': {e}")))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ConfigError::invalid(
            operation,
            format!("URL scheme must be 'http' or 'https', got '{}'", parsed.scheme()),
        ));
    }
    if parsed.host().is_none() {
        return Err(ConfigError::invalid(operation, "URL must have a valid host"));
    }
    Ok(())
}

/// Parse an nginx size literal into bytes; `None` if it does not fit in a `u64`.
pub(crate) fn parse_size(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.chars().last()? {
        'k' | 'K' => (&raw[..raw.len() - 1], 1024),
        'm' | 'M' => (&raw[..raw.len() - 1], 1024 * 1024),
        'g' | 'G' => (&raw[..raw.len() - 1], 1024 * 1024 * 1024),
        _ => (raw, 1),
    };
    digits
        .parse::<u64>()
        .ok()
        .and_then(|n| n.checked_mul(multiplier))
}
