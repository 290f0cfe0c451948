pub mod class_registry;
pub mod route_store;
