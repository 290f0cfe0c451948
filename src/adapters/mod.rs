pub mod memory_store;

/// Re-export commonly used types from adapters
pub use memory_store::{InMemoryClassRegistry, InMemoryRouteStore};
