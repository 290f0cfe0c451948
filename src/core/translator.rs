//! Directive-to-primitive translation.
//!
//! Every policy directive on a route yields exactly one [`TranslationEntry`].
//! Recognized directives are rendered with their family's parameter schema;
//! anything else is emitted as `Unrecognized` carrying the raw value, so no
//! information is dropped. Output order depends only on family priority and
//! key, never on map iteration order.
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::{
    builder::parse_size,
    directive::{self, ParamSchema, PrimitiveFamily},
    route::Route,
};

static HEADER_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^more_set_headers\s+"([^:"]+):\s*([^"]*)";$"#).expect("invalid header regex")
});
static BACK_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(\d+)").expect("invalid back-reference regex"));

/// One classified directive, as handed to reporting consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationEntry {
    pub directive_key: String,
    pub family: PrimitiveFamily,
    pub rendered_params: String,
}

pub struct Translator;

impl Translator {
    /// Translate every policy directive on `route`.
    pub fn translate(route: &Route) -> Vec<TranslationEntry> {
        let mut entries: Vec<TranslationEntry> = route
            .policies
            .iter()
            .map(|(key, value)| Self::translate_directive(route, key, value))
            .collect();

        entries.sort_by(|a, b| {
            a.family
                .priority()
                .cmp(&b.family.priority())
                .then_with(|| a.family.cmp(&b.family))
                .then_with(|| {
                    directive::normalize_key(&a.directive_key)
                        .cmp(directive::normalize_key(&b.directive_key))
                })
                .then_with(|| a.directive_key.cmp(&b.directive_key))
        });

        tracing::debug!(route = %route.name, entries = entries.len(), "translated route policies");
        entries
    }

    fn translate_directive(route: &Route, key: &str, value: &str) -> TranslationEntry {
        let Some(target) = directive::lookup(key) else {
            return TranslationEntry {
                directive_key: key.to_string(),
                family: PrimitiveFamily::Unrecognized,
                rendered_params: value.to_string(),
            };
        };

        let rendered_params = render(route, target.schema, value).unwrap_or_else(|| {
            tracing::warn!(
                route = %route.name,
                directive = key,
                value,
                schema = ?target.schema,
                "directive value does not match its schema; passing raw value through"
            );
            value.to_string()
        });

        TranslationEntry {
            directive_key: key.to_string(),
            family: target.family,
            rendered_params,
        }
    }
}

fn render(route: &Route, schema: ParamSchema, value: &str) -> Option<String> {
    let value = value.trim();
    match schema {
        ParamSchema::Flag => parse_flag(value).map(|b| b.to_string()),
        ParamSchema::Duration => parse_seconds(value).map(render_duration),
        ParamSchema::Count => value.parse::<u64>().ok().map(|n| n.to_string()),
        ParamSchema::List => {
            let items = split_list(value);
            if items.is_empty() {
                None
            } else {
                serde_json::to_string(&items).ok()
            }
        }
        ParamSchema::Text => Some(value.to_string()),
        ParamSchema::Size => parse_size(value).map(|bytes| format!("{bytes} bytes")),
        ParamSchema::HeaderSnippet => render_header_snippet(value),
        ParamSchema::RewriteTarget => Some(render_rewrite(route, value)),
        ParamSchema::BackendWeights => render_backend_weights(route, value),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Plain integers are seconds; humantime forms such as `2m` are accepted too.
fn parse_seconds(value: &str) -> Option<Duration> {
    value
        .parse::<u64>()
        .map(Duration::from_secs)
        .ok()
        .or_else(|| humantime::parse_duration(value).ok())
}

/// Whole seconds as `{n}s`; anything finer keeps its precision, e.g. `1s 500ms`.
fn render_duration(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        humantime::format_duration(duration).to_string()
    }
}

fn split_list(value: &str) -> Vec<&str> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// `more_set_headers "K: V";` lines become `set K: V` operations.
fn render_header_snippet(value: &str) -> Option<String> {
    let mut operations = Vec::new();
    for line in value.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let captures = HEADER_LINE.captures(line)?;
        operations.push(format!("set {}: {}", captures[1].trim(), captures[2].trim()));
    }
    if operations.is_empty() {
        None
    } else {
        Some(operations.join("; "))
    }
}

fn render_rewrite(route: &Route, value: &str) -> String {
    let groups: Vec<&str> = BACK_REFERENCE
        .captures_iter(value)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect();

    if groups.is_empty() {
        format!("replaceFullPath={value}")
    } else {
        format!(
            "pattern={} replacement={value} groups={}",
            route.path(),
            groups.join(",")
        )
    }
}

/// `weight=<directive value>; svc:port=w, ...`, with `*` for the remainder backend.
fn render_backend_weights(route: &Route, value: &str) -> Option<String> {
    let weight = value.parse::<u32>().ok().filter(|w| *w <= 100)?;
    let backends = route.backends();
    if backends.is_empty() {
        return None;
    }
    let tuples = backends
        .iter()
        .map(|b| {
            let weight = b.weight.map_or_else(|| "*".to_string(), |w| w.to_string());
            format!("{}:{}={weight}", b.service_name, b.port)
        })
        .collect::<Vec<_>>()
        .join(", ");
    Some(format!("weight={weight}; {tuples}"))
}

/// Kinds of non-failing findings about a translated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryKind {
    DeprecatedClass,
    UnrecognizedDirective,
    RawSnippet,
}

/// A finding that never affects validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Advisory {
    pub kind: AdvisoryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directive_key: Option<String>,
    pub message: String,
}

/// Advisory pass over a route and its translation.
pub fn advise(
    route: &Route,
    entries: &[TranslationEntry],
    deprecated_classes: &[String],
) -> Vec<Advisory> {
    let is_deprecated = |class: &str| deprecated_classes.iter().any(|d| d == class.trim());
    let mut advisories = Vec::new();

    if let Some(class) = route.class_ref.as_deref().filter(|c| is_deprecated(c)) {
        advisories.push(Advisory {
            kind: AdvisoryKind::DeprecatedClass,
            directive_key: None,
            message: format!("class '{class}' is deprecated and scheduled for retirement"),
        });
    }

    for entry in entries {
        match entry.family {
            PrimitiveFamily::ClassSelector if is_deprecated(&entry.rendered_params) => {
                advisories.push(Advisory {
                    kind: AdvisoryKind::DeprecatedClass,
                    directive_key: Some(entry.directive_key.clone()),
                    message: format!(
                        "class directive selects deprecated class '{}'",
                        entry.rendered_params
                    ),
                });
            }
            PrimitiveFamily::Unrecognized => advisories.push(Advisory {
                kind: AdvisoryKind::UnrecognizedDirective,
                directive_key: Some(entry.directive_key.clone()),
                message: "no structured equivalent; value carried through verbatim".to_string(),
            }),
            _ => {}
        }

        let key = directive::normalize_key(&entry.directive_key);
        if key == directive::CONFIGURATION_SNIPPET || key == directive::SERVER_SNIPPET {
            advisories.push(Advisory {
                kind: AdvisoryKind::RawSnippet,
                directive_key: Some(entry.directive_key.clone()),
                message: "raw configuration snippets are a known security risk".to_string(),
            });
        }
    }

    advisories
}

/// Translation and advisories for one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteReport {
    pub namespace: String,
    pub name: String,
    pub entries: Vec<TranslationEntry>,
    pub advisories: Vec<Advisory>,
}

/// Translation of a set of routes, stamped with the directive table version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationReport {
    pub directive_table_version: String,
    pub routes: Vec<RouteReport>,
}

impl TranslationReport {
    pub fn new(routes: &[Route], deprecated_classes: &[String]) -> Self {
        let routes = routes
            .iter()
            .map(|route| {
                let entries = Translator::translate(route);
                let advisories = advise(route, &entries, deprecated_classes);
                RouteReport {
                    namespace: route.namespace.clone(),
                    name: route.name.clone(),
                    entries,
                    advisories,
                }
            })
            .collect();

        Self {
            directive_table_version: directive::DIRECTIVE_TABLE_VERSION.to_string(),
            routes,
        }
    }
}
