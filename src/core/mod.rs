pub mod builder;
pub mod directive;
pub mod merger;
pub mod provisioner;
pub mod route;
pub mod translator;
pub mod validator;

pub use builder::{AuthKind, ConfigError, ConfigResult, RouteBuilder};
pub use merger::{MergeError, RouteMerger};
pub use provisioner::{ProvisionError, Provisioner};
pub use route::{PathMatchMode, Route, RouteRule, TlsBinding, WeightedBackend};
pub use translator::{Advisory, AdvisoryKind, TranslationEntry, TranslationReport, Translator};
pub use validator::{RouteValidator, ValidationError, ValidationResult};
