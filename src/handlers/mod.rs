//! HTTP handlers for resource CRUD and settings toggles.

pub mod resource;
pub mod toggle;
