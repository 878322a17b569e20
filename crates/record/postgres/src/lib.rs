mod config;
mod migrations;
mod store;

pub use config::PostgresConfig;
pub use store::PostgresMediaStore;
