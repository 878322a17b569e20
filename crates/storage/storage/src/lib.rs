pub mod backend;
pub mod error;
pub mod key;
pub mod static_assets;

pub use backend::{FetchResponse, StorageBackend};
pub use error::StorageError;
pub use key::{attachment_object_name, thumbnail_object_name};
pub use static_assets::{StaticAsset, collect_static_files, guess_content_type};
