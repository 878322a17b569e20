mod config;
mod error;
mod service;

pub use config::{MediaConfig, StorageProvider, build_backend, build_record_store, build_service};
pub use error::{ConfigError, MediaError};
pub use service::MediaService;
