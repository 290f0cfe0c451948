//! Structural checks on a [`Route`].
//!
//! Checks run in a fixed order and the first failure wins. The validator never
//! mutates its input and never consults external state, so it is safe to run
//! as a pre-submission gate.
use regex::Regex;

use crate::core::{
    directive,
    route::{PathMatchMode, Route, WeightedBackend},
};

/// Path reported for the default backend in [`ValidationError::InvalidBackend`].
pub const DEFAULT_BACKEND_PATH: &str = "*";

const MAX_PORT: u32 = 65_535;
const MAX_WEIGHT: u32 = 100;

/// Validation result type alias
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Reasons a route fails structural validation.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("route name cannot be empty")]
    EmptyName,

    #[error("route must specify a class via classRef or the ingress.class directive")]
    MissingClass,

    #[error("route cannot have both host/path rules and a default backend")]
    ConflictingBackendMode,

    #[error("route must have host/path rules or a default backend")]
    NoBackendMode,

    #[error("route path {path} must specify a valid backend service")]
    InvalidBackend { path: String },

    #[error("pattern path {path} must be a regular expression with a capture group")]
    MalformedPattern { path: String },
}

/// Route validator
pub struct RouteValidator;

impl RouteValidator {
    /// Validate a route, stopping at the first failed check.
    pub fn validate(route: &Route) -> ValidationResult<()> {
        if route.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        Self::validate_class(route)?;
        Self::validate_backend_mode(route)?;
        Self::validate_backends(route)?;
        Self::validate_patterns(route)?;

        tracing::debug!(
            route = %route.name,
            namespace = %route.namespace,
            "route passed validation"
        );
        Ok(())
    }

    fn validate_class(route: &Route) -> ValidationResult<()> {
        let has_class_ref = route
            .class_ref
            .as_deref()
            .is_some_and(|class| !class.trim().is_empty());
        let has_class_directive = route
            .policies
            .iter()
            .any(|(key, value)| directive::is_class_directive(key) && !value.trim().is_empty());

        if has_class_ref || has_class_directive {
            Ok(())
        } else {
            Err(ValidationError::MissingClass)
        }
    }

    fn validate_backend_mode(route: &Route) -> ValidationResult<()> {
        match (route.rules.is_empty(), route.default_backend.is_some()) {
            (false, true) => Err(ValidationError::ConflictingBackendMode),
            (true, false) => Err(ValidationError::NoBackendMode),
            _ => Ok(()),
        }
    }

    fn validate_backends(route: &Route) -> ValidationResult<()> {
        for rule in &route.rules {
            let remainder_count = rule.backends.iter().filter(|b| b.weight.is_none()).count();
            let valid = !rule.backends.is_empty()
                && remainder_count <= 1
                && rule.backends.iter().all(Self::is_valid_backend);
            if !valid {
                return Err(ValidationError::InvalidBackend {
                    path: rule.path.clone(),
                });
            }
        }

        if let Some(backend) = &route.default_backend {
            if !Self::is_valid_backend(backend) {
                return Err(ValidationError::InvalidBackend {
                    path: DEFAULT_BACKEND_PATH.to_string(),
                });
            }
        }

        Ok(())
    }

    fn is_valid_backend(backend: &WeightedBackend) -> bool {
        !backend.service_name.trim().is_empty()
            && (1..=MAX_PORT).contains(&backend.port)
            && backend.weight.is_none_or(|w| w <= MAX_WEIGHT)
    }

    fn validate_patterns(route: &Route) -> ValidationResult<()> {
        for rule in &route.rules {
            if rule.path_match_mode == PathMatchMode::PatternMatch
                && !Self::has_capture_group(&rule.path)
            {
                return Err(ValidationError::MalformedPattern {
                    path: rule.path.clone(),
                });
            }
        }
        Ok(())
    }

    /// A pattern must compile and declare at least one capture group.
    fn has_capture_group(pattern: &str) -> bool {
        Regex::new(pattern).is_ok_and(|re| re.captures_len() > 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::route::RouteRule;

    fn valid_route() -> Route {
        let mut route = Route::new("storefront", "shop");
        route.class_ref = Some("nginx".to_string());
        route.rules.push(RouteRule::new(
            "shop.example.com",
            "/",
            WeightedBackend::full("web", 8080),
        ));
        route
    }

    #[test]
    fn accepts_basic_route() {
        assert_eq!(RouteValidator::validate(&valid_route()), Ok(()));
    }

    #[test]
    fn rejects_empty_name_before_anything_else() {
        let mut route = valid_route();
        route.name = String::new();
        route.class_ref = None;
        route.rules.clear();
        assert_eq!(
            RouteValidator::validate(&route),
            Err(ValidationError::EmptyName)
        );
    }

    #[test]
    fn class_directive_substitutes_for_class_ref() {
        let mut route = valid_route();
        route.class_ref = None;
        assert_eq!(
            RouteValidator::validate(&route),
            Err(ValidationError::MissingClass)
        );

        route
            .policies
            .insert("kubernetes.io/ingress.class".to_string(), "nginx".to_string());
        assert_eq!(RouteValidator::validate(&route), Ok(()));
    }

    #[test]
    fn backend_modes_are_mutually_exclusive() {
        let mut both = valid_route();
        both.default_backend = Some(WeightedBackend::full("fallback", 80));
        assert_eq!(
            RouteValidator::validate(&both),
            Err(ValidationError::ConflictingBackendMode)
        );

        let mut neither = valid_route();
        neither.rules.clear();
        assert_eq!(
            RouteValidator::validate(&neither),
            Err(ValidationError::NoBackendMode)
        );
    }

    #[test]
    fn rejects_backend_without_service_or_port() {
        let mut route = valid_route();
        route.rules[0].path = "/api".to_string();
        route.rules[0].backends[0].service_name = String::new();
        assert_eq!(
            RouteValidator::validate(&route),
            Err(ValidationError::InvalidBackend {
                path: "/api".to_string()
            })
        );

        let mut route = valid_route();
        route.rules[0].backends[0].port = 70_000;
        assert!(matches!(
            RouteValidator::validate(&route),
            Err(ValidationError::InvalidBackend { .. })
        ));
    }

    #[test]
    fn rejects_more_than_one_remainder_backend() {
        let mut route = valid_route();
        route.rules[0].backends = vec![
            WeightedBackend::new("a", 80, None),
            WeightedBackend::new("b", 80, None),
        ];
        assert!(matches!(
            RouteValidator::validate(&route),
            Err(ValidationError::InvalidBackend { .. })
        ));

        route.rules[0].backends[1].weight = Some(30);
        assert_eq!(RouteValidator::validate(&route), Ok(()));
    }

    #[test]
    fn weight_sums_are_not_checked() {
        let mut route = valid_route();
        route.rules[0].backends = vec![
            WeightedBackend::new("a", 80, Some(70)),
            WeightedBackend::new("b", 80, Some(70)),
        ];
        assert_eq!(RouteValidator::validate(&route), Ok(()));
    }

    #[test]
    fn invalid_default_backend_reports_wildcard_path() {
        let mut route = valid_route();
        route.rules.clear();
        route.default_backend = Some(WeightedBackend::full("fallback", 0));
        assert_eq!(
            RouteValidator::validate(&route),
            Err(ValidationError::InvalidBackend {
                path: DEFAULT_BACKEND_PATH.to_string()
            })
        );
    }

    #[test]
    fn pattern_paths_need_a_capture_group() {
        let mut route = valid_route();
        route.rules[0].path_match_mode = PathMatchMode::PatternMatch;
        route.rules[0].path = "/api/.*".to_string();
        assert_eq!(
            RouteValidator::validate(&route),
            Err(ValidationError::MalformedPattern {
                path: "/api/.*".to_string()
            })
        );

        route.rules[0].path = "/api(/|$)(.*)".to_string();
        assert_eq!(RouteValidator::validate(&route), Ok(()));

        route.rules[0].path = "/api((".to_string();
        assert!(matches!(
            RouteValidator::validate(&route),
            Err(ValidationError::MalformedPattern { .. })
        ));
    }

    #[test]
    fn validation_does_not_mutate() {
        let route = valid_route();
        let before = route.clone();
        let _ = RouteValidator::validate(&route);
        assert_eq!(route, before);
    }
}
