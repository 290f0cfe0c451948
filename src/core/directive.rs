//! Static directive table.
//!
//! Maps legacy policy directive keys (the `nginx.ingress.kubernetes.io/*`
//! annotation namespace, stored without its prefix) onto the structured
//! primitive family that replaces them. The table is versioned with the crate
//! and is not editable at runtime.
use std::{collections::BTreeMap, fmt};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Prefix used by the legacy annotation form of every directive key.
pub const LEGACY_ANNOTATION_PREFIX: &str = "nginx.ingress.kubernetes.io/";

/// Short key of the class-indicating directive.
pub const CLASS_DIRECTIVE: &str = "ingress.class";
/// Legacy annotation form of [`CLASS_DIRECTIVE`].
pub const LEGACY_CLASS_ANNOTATION: &str = "kubernetes.io/ingress.class";

/// Version of the shipped table.
pub const DIRECTIVE_TABLE_VERSION: &str = "2026.1";

// Directive keys referenced by the builder.
pub const SSL_REDIRECT: &str = "ssl-redirect";
pub const FORCE_SSL_REDIRECT: &str = "force-ssl-redirect";
pub const SSL_PASSTHROUGH: &str = "ssl-passthrough";
pub const PERMANENT_REDIRECT: &str = "permanent-redirect";
pub const PROXY_READ_TIMEOUT: &str = "proxy-read-timeout";
pub const PROXY_SEND_TIMEOUT: &str = "proxy-send-timeout";
pub const PROXY_CONNECT_TIMEOUT: &str = "proxy-connect-timeout";
pub const PROXY_BODY_SIZE: &str = "proxy-body-size";
pub const PROXY_HTTP_VERSION: &str = "proxy-http-version";
pub const CONFIGURATION_SNIPPET: &str = "configuration-snippet";
pub const SERVER_SNIPPET: &str = "server-snippet";
pub const HSTS: &str = "hsts";
pub const HSTS_MAX_AGE: &str = "hsts-max-age";
pub const HSTS_INCLUDE_SUBDOMAINS: &str = "hsts-include-subdomains";
pub const AUTH_TYPE: &str = "auth-type";
pub const AUTH_SECRET: &str = "auth-secret";
pub const AUTH_REALM: &str = "auth-realm";
pub const AUTH_URL: &str = "auth-url";
pub const AUTH_SIGNIN: &str = "auth-signin";
pub const AUTH_RESPONSE_HEADERS: &str = "auth-response-headers";
pub const ENABLE_CORS: &str = "enable-cors";
pub const CORS_ALLOW_ORIGIN: &str = "cors-allow-origin";
pub const CORS_ALLOW_METHODS: &str = "cors-allow-methods";
pub const CORS_ALLOW_HEADERS: &str = "cors-allow-headers";
pub const REWRITE_TARGET: &str = "rewrite-target";
pub const USE_REGEX: &str = "use-regex";
pub const CANARY: &str = "canary";
pub const CANARY_WEIGHT: &str = "canary-weight";
pub const CANARY_BY_HEADER: &str = "canary-by-header";
pub const CANARY_BY_HEADER_VALUE: &str = "canary-by-header-value";
pub const AFFINITY: &str = "affinity";
pub const AFFINITY_MODE: &str = "affinity-mode";
pub const SESSION_COOKIE_NAME: &str = "session-cookie-name";
pub const SESSION_COOKIE_MAX_AGE: &str = "session-cookie-max-age";
pub const LIMIT_RPS: &str = "limit-rps";
pub const LIMIT_RPM: &str = "limit-rpm";
pub const LIMIT_CONNECTIONS: &str = "limit-connections";
pub const WHITELIST_SOURCE_RANGE: &str = "whitelist-source-range";

/// Structured primitive family a directive translates into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimitiveFamily {
    RedirectRule,
    BackendTimeout,
    HeaderModifier,
    Authentication,
    Cors,
    PathRewrite,
    WeightedSplit,
    SessionPersistence,
    RateLimit,
    AccessControl,
    ClassSelector,
    ImplementationSpecificPolicy,
    Unrecognized,
}

impl PrimitiveFamily {
    /// Output priority: TLS/redirect, timeouts, header/auth, routing/weight,
    /// everything else, unrecognized.
    pub fn priority(self) -> u8 {
        match self {
            PrimitiveFamily::RedirectRule => 0,
            PrimitiveFamily::BackendTimeout => 1,
            PrimitiveFamily::HeaderModifier
            | PrimitiveFamily::Authentication
            | PrimitiveFamily::Cors => 2,
            PrimitiveFamily::PathRewrite
            | PrimitiveFamily::WeightedSplit
            | PrimitiveFamily::SessionPersistence => 3,
            PrimitiveFamily::RateLimit
            | PrimitiveFamily::AccessControl
            | PrimitiveFamily::ClassSelector
            | PrimitiveFamily::ImplementationSpecificPolicy => 4,
            PrimitiveFamily::Unrecognized => 5,
        }
    }
}

impl fmt::Display for PrimitiveFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How a directive value is parsed and rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamSchema {
    /// `true` / `false`.
    Flag,
    /// Whole seconds, rendered as a duration string.
    Duration,
    /// Non-negative integer.
    Count,
    /// Comma separated list.
    List,
    /// Opaque text.
    Text,
    /// nginx size literal such as `50m`.
    Size,
    /// `more_set_headers` snippet lines.
    HeaderSnippet,
    /// Replacement with `$N` capture-group back-references.
    RewriteTarget,
    /// Rendered from the route's weighted backend set.
    BackendWeights,
}

/// Target descriptor for one directive key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetPrimitive {
    pub family: PrimitiveFamily,
    pub schema: ParamSchema,
}

const fn target(family: PrimitiveFamily, schema: ParamSchema) -> TargetPrimitive {
    TargetPrimitive { family, schema }
}

static DIRECTIVE_TABLE: Lazy<BTreeMap<&'static str, TargetPrimitive>> = Lazy::new(|| {
    use ParamSchema::*;
    use PrimitiveFamily::*;

    BTreeMap::from([
        (SSL_REDIRECT, target(RedirectRule, Flag)),
        (FORCE_SSL_REDIRECT, target(RedirectRule, Flag)),
        (PERMANENT_REDIRECT, target(RedirectRule, Text)),
        (SSL_PASSTHROUGH, target(ImplementationSpecificPolicy, Flag)),
        (PROXY_READ_TIMEOUT, target(BackendTimeout, Duration)),
        (PROXY_SEND_TIMEOUT, target(BackendTimeout, Duration)),
        (PROXY_CONNECT_TIMEOUT, target(BackendTimeout, Duration)),
        (PROXY_BODY_SIZE, target(ImplementationSpecificPolicy, Size)),
        (PROXY_HTTP_VERSION, target(ImplementationSpecificPolicy, Text)),
        (CONFIGURATION_SNIPPET, target(HeaderModifier, HeaderSnippet)),
        (SERVER_SNIPPET, target(ImplementationSpecificPolicy, Text)),
        (HSTS, target(HeaderModifier, Flag)),
        (HSTS_MAX_AGE, target(HeaderModifier, Duration)),
        (HSTS_INCLUDE_SUBDOMAINS, target(HeaderModifier, Flag)),
        (AUTH_TYPE, target(Authentication, Text)),
        (AUTH_SECRET, target(Authentication, Text)),
        (AUTH_REALM, target(Authentication, Text)),
        (AUTH_URL, target(Authentication, Text)),
        (AUTH_SIGNIN, target(Authentication, Text)),
        (AUTH_RESPONSE_HEADERS, target(Authentication, List)),
        (ENABLE_CORS, target(Cors, Flag)),
        (CORS_ALLOW_ORIGIN, target(Cors, List)),
        (CORS_ALLOW_METHODS, target(Cors, List)),
        (CORS_ALLOW_HEADERS, target(Cors, List)),
        (REWRITE_TARGET, target(PathRewrite, RewriteTarget)),
        (USE_REGEX, target(PathRewrite, Flag)),
        (CANARY, target(WeightedSplit, Flag)),
        (CANARY_WEIGHT, target(WeightedSplit, BackendWeights)),
        (CANARY_BY_HEADER, target(WeightedSplit, Text)),
        (CANARY_BY_HEADER_VALUE, target(WeightedSplit, Text)),
        (AFFINITY, target(SessionPersistence, Text)),
        (AFFINITY_MODE, target(SessionPersistence, Text)),
        (SESSION_COOKIE_NAME, target(SessionPersistence, Text)),
        (SESSION_COOKIE_MAX_AGE, target(SessionPersistence, Duration)),
        (LIMIT_RPS, target(RateLimit, Count)),
        (LIMIT_RPM, target(RateLimit, Count)),
        (LIMIT_CONNECTIONS, target(RateLimit, Count)),
        (WHITELIST_SOURCE_RANGE, target(AccessControl, List)),
        (CLASS_DIRECTIVE, target(ClassSelector, Text)),
    ])
});

/// Strip the legacy annotation prefix, if any, from a directive key.
pub fn normalize_key(key: &str) -> &str {
    if key == LEGACY_CLASS_ANNOTATION {
        return CLASS_DIRECTIVE;
    }
    key.strip_prefix(LEGACY_ANNOTATION_PREFIX).unwrap_or(key)
}

/// Look up a directive; accepts both short and legacy annotation keys.
pub fn lookup(key: &str) -> Option<TargetPrimitive> {
    DIRECTIVE_TABLE.get(normalize_key(key)).copied()
}

/// Family of a directive, `Unrecognized` when the table has no entry.
pub fn family_of(key: &str) -> PrimitiveFamily {
    lookup(key).map_or(PrimitiveFamily::Unrecognized, |t| t.family)
}

pub fn is_class_directive(key: &str) -> bool {
    normalize_key(key) == CLASS_DIRECTIVE
}
