//! Routeforge - a declarative route-configuration compiler.
//!
//! Routeforge builds HTTP routing objects from short, declarative records, checks them,
//! merges several of them into one, and translates their legacy annotation-style policy
//! directives into a prioritized list of structured routing primitives.
//!
//! # Features
//! - Immutable route construction from capability presets (TLS, rewrites, canary splits,
//!   auth, affinity, rate limits, CORS, headers, HSTS, allow-lists, websockets, timeouts)
//! - Structural validation with a fixed, first-failure-wins check order
//! - Positional merging with last-writer-wins policy directives
//! - Directive translation against a closed, versioned directive table plus an advisory pass
//! - Offline provisioning through store and class-registry ports
//!
//! # Quick Example
//! ```no_run
//! use routeforge::{RouteValidator, Translator, config::loader::load_document};
//!
//! # fn main() -> eyre::Result<()> {
//! let document = load_document("routes.yaml")?;
//! for route in document.compile()? {
//!     RouteValidator::validate(&route)?;
//!     for entry in Translator::translate(&route) {
//!         println!("{} -> {:?}: {}", entry.directive_key, entry.family, entry.rendered_params);
//!     }
//! }
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations) while keeping
//! the compiler itself inside `core`. Core operations are synchronous and pure; only the
//! provisioning pipeline touches a port.
//!
//! # Error Handling
//! Core operations return domain error enums (`ConfigError`, `ValidationError`,
//! `MergeError`, `ProvisionError`). The loader and binary use `eyre::Result` with
//! `WrapErr` context.
//!
//! # Concurrency & Data Structures
//! The in-memory adapters use `scc::HashMap` so a single store can be shared across tasks.
pub mod config;
pub mod ports;
pub mod tracing_setup;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{InMemoryClassRegistry, InMemoryRouteStore},
    core::{
        Provisioner, Route, RouteBuilder, RouteMerger, RouteValidator, Translator,
        translator::advise,
    },
    ports::{class_registry::ClassRegistry, route_store::RouteStore},
};
