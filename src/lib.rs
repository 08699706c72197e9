pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod nfe;
pub mod service;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::AppConfig;
pub use db::{create_pool, run_migrations, CatalogStore, CatalogTx};
pub use error::{ImportError, StoreError};
pub use nfe::extract;
pub use service::OrderImporter;
