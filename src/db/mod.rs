pub mod catalog;
pub mod pool;
pub mod queries;
pub mod store;

pub use catalog::PgCatalogTx;
pub use pool::{create_pool, run_migrations};
pub use queries::*;
pub use store::{CatalogStore, CatalogTx};
