//! Settings API: REST CRUD over a catalog of business-settings resources backed by PostgreSQL.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{builtin_catalog, load_catalog_from_path, resolve, CatalogConfig, ResolvedModel, ResolvedResource, Settings};
pub use error::{AppError, ConfigError};
pub use migration::apply_migrations;
pub use routes::{app, common_routes, resource_routes};
pub use service::{CrudService, RequestValidator};
pub use state::AppState;
pub use store::{connect_pool, ensure_database_exists};
