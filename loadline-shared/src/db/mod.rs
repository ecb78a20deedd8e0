/// Database layer
///
/// Connection pool management and schema migrations.

pub mod migrations;
pub mod pool;

pub use pool::{create_lazy_pool, create_pool, DatabaseConfig};
