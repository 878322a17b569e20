mod config;
mod policy;
mod storage;

pub use config::S3Config;
pub use storage::S3Storage;
