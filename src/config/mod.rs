pub mod loader;
pub mod models;

pub use loader::{load_document, parse_document};
pub use models::*;
